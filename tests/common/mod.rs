#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use trend_bot::config::{BotConfig, Credentials};
use trend_bot::connectors::ExchangeClient;
use trend_bot::{BotError, CandleSeries, OrderResponse, Position, Result, SharedState, Side};

/// In-process exchange. A tick is counted "in flight" from `fetch_candles` until
/// `fetch_position` returns, which covers every Hold tick end to end.
#[derive(Default)]
pub struct FakeExchange {
    pub closes: Mutex<Vec<Decimal>>,
    pub position: Mutex<Position>,
    pub candle_delay: Duration,
    pub fail_candles: AtomicBool,
    pub orders: Mutex<Vec<(Side, Decimal)>>,
    pub leverage_calls: AtomicUsize,
    pub ticks_started: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeExchange {
    pub fn with_closes(price: i64, count: usize) -> Self {
        Self {
            closes: Mutex::new(vec![Decimal::from(price); count]),
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.candle_delay = delay;
        self
    }

    pub fn holding(self, quantity: Decimal, entry_price: Decimal) -> Self {
        *self.position.lock().unwrap() = Position {
            quantity,
            entry_price,
            unrealized_pnl: Decimal::ZERO,
        };
        self
    }

    pub fn ticks(&self) -> usize {
        self.ticks_started.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> Vec<(Side, Decimal)> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn fetch_candles(&self, _: &str, _: &str, _: u16) -> Result<CandleSeries> {
        self.ticks_started.fetch_add(1, Ordering::SeqCst);
        if self.fail_candles.load(Ordering::SeqCst) {
            return Err(BotError::Network("connection reset".into()));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.candle_delay.is_zero() {
            tokio::time::sleep(self.candle_delay).await;
        }

        let closes = self.closes.lock().unwrap().clone();
        if closes.len() < 200 {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(CandleSeries::new(closes))
    }

    async fn fetch_position(&self, creds: &Credentials, _: &str) -> Result<Position> {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !creds.is_complete() {
            return Err(BotError::Auth("API key and secret must both be set".into()));
        }
        Ok(self.position.lock().unwrap().clone())
    }

    async fn set_leverage(&self, _: &Credentials, _: &str, _: u8) -> Result<()> {
        self.leverage_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn submit_market_order(
        &self,
        _: &Credentials,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderResponse> {
        self.orders.lock().unwrap().push((side, quantity));
        Ok(OrderResponse {
            id: self.orders.lock().unwrap().len().to_string(),
            symbol: symbol.to_string(),
            status: "NEW".to_string(),
        })
    }
}

pub fn creds() -> Credentials {
    Credentials::new("test-key".into(), "test-secret".into())
}

pub fn state_with_creds() -> SharedState {
    SharedState::new(BotConfig::default(), creds())
}

pub fn logs_contain(state: &SharedState, needle: &str) -> bool {
    state.status().logs.iter().any(|line| line.contains(needle))
}
