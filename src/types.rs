// src/types.rs
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Closing prices, oldest first, newest last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    closes: Vec<Decimal>,
}

impl CandleSeries {
    pub fn new(closes: Vec<Decimal>) -> Self {
        Self { closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Most recent close, used as the current price.
    pub fn last_close(&self) -> Option<Decimal> {
        self.closes.last().copied()
    }

    pub fn closes_f64(&self) -> Vec<f64> {
        self.closes
            .iter()
            .map(|c| c.to_f64().unwrap_or(f64::NAN))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema_long: f64,
    pub rsi: f64,
    pub bollinger_upper: f64,
    pub macd: MacdPoint,
    /// MACD point of the previous candle, for crossover detection.
    pub prev_macd: MacdPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Flat,
    Long,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn side(&self) -> PositionSide {
        if self.quantity > Decimal::ZERO {
            PositionSide::Long
        } else {
            PositionSide::Flat
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side() == PositionSide::Flat
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    BandBreakout,
    StopLoss,
}

/// Output of a strategy for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Hold,
    Enter { price: Decimal },
    Exit { quantity: Decimal, reason: ExitReason },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub symbol: String,
    pub status: String,
}
