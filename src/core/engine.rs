// src/core/engine.rs
use crate::commentary::CommentarySender;
use crate::connectors::traits::ExchangeClient;
use crate::core::executor::{ExecutionReport, OrderExecutor};
use crate::core::position::PositionTracker;
use crate::core::state::SharedState;
use crate::error::{BotError, Result};
use crate::indicators::{IndicatorEngine, EMA_LONG_PERIOD};
use crate::strategies::traits::{MarketView, Strategy};
use crate::types::{Decision, ExitReason};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub decision: Decision,
    pub report: ExecutionReport,
}

/// One pass of fetch → indicators → reconcile → decide → execute.
pub struct TradingEngine {
    exchange: Arc<dyn ExchangeClient>,
    indicators: IndicatorEngine,
    tracker: PositionTracker,
    strategy: Box<dyn Strategy>,
    executor: OrderExecutor,
    state: SharedState,
}

impl TradingEngine {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        strategy: Box<dyn Strategy>,
        state: SharedState,
        commentary: Option<CommentarySender>,
    ) -> Self {
        Self {
            executor: OrderExecutor::new(exchange.clone(), commentary),
            tracker: PositionTracker::new(state.clone()),
            indicators: IndicatorEngine::new(),
            exchange,
            strategy,
            state,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Any error is returned to the caller; nothing is retried here.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let (config, creds) = self.state.tick_inputs();

        let candles = self
            .exchange
            .fetch_candles(&config.symbol, &config.interval, config.candle_limit)
            .await?;
        let price = candles.last_close().ok_or(BotError::InsufficientData {
            required: EMA_LONG_PERIOD,
            available: 0,
        })?;

        let indicators = match self.indicators.compute(&candles) {
            Ok(snapshot) => {
                self.state.publish_market(price, Some(snapshot.clone()));
                snapshot
            }
            Err(e) => {
                self.state.publish_market(price, None);
                return Err(e);
            }
        };
        debug!("price={} indicators={:?}", price, indicators);

        let reported = self
            .exchange
            .fetch_position(&creds, &config.symbol)
            .await
            .inspect_err(|e| self.state.log_error(format!("Failed to fetch position: {}", e)))?;
        let position = self.tracker.reconcile(reported);

        let decision = self.strategy.decide(&MarketView {
            price,
            indicators: &indicators,
            position: &position,
            config: &config,
        })?;

        match &decision {
            Decision::Hold => {}
            Decision::Enter { price } => {
                self.state
                    .log(format!("Entry conditions met! Opening LONG at {}", price));
            }
            Decision::Exit { reason, .. } => {
                let trigger = match reason {
                    ExitReason::TakeProfit => "Take profit",
                    ExitReason::BandBreakout => "Upper band breakout",
                    ExitReason::StopLoss => "Stop loss",
                };
                self.state
                    .log(format!("{} triggered! Price: {}", trigger, price));
            }
        }

        let report = self
            .executor
            .execute(decision.clone(), &creds, &config, &indicators)
            .await?;

        match &report {
            ExecutionReport::Idle => {}
            ExecutionReport::Skipped(why) => self.state.log_warn(format!("Entry skipped: {}", why)),
            ExecutionReport::Opened { quantity, .. } => self.state.log(format!(
                "Opened LONG: {} {}",
                quantity, config.symbol
            )),
            ExecutionReport::Closed { quantity, .. } => self.state.log(format!(
                "Position closed: {} {}",
                quantity, config.symbol
            )),
        }

        debug!(strategy = self.strategy.name(), "tick done: {:?}", decision);
        Ok(TickOutcome { decision, report })
    }
}
