// src/core/bot.rs
use crate::commentary::CommentarySender;
use crate::config::ConfigUpdate;
use crate::connectors::traits::ExchangeClient;
use crate::core::engine::TradingEngine;
use crate::core::scheduler::SchedulerLoop;
use crate::core::state::{BotStatus, SharedState};
use crate::error::{BotError, Result};
use crate::strategies::traits::Strategy;
use crate::strategies::trend_macd::TrendMacdStrategy;
use std::sync::Arc;
use std::time::Duration;

/// Control surface seen by status/config front-ends.
pub struct Bot {
    state: SharedState,
    scheduler: SchedulerLoop,
}

impl Bot {
    pub fn new(
        state: SharedState,
        exchange: Arc<dyn ExchangeClient>,
        commentary: Option<CommentarySender>,
    ) -> Self {
        Self::with_strategy(state, exchange, Box::new(TrendMacdStrategy::new()), commentary)
    }

    pub fn with_strategy(
        state: SharedState,
        exchange: Arc<dyn ExchangeClient>,
        strategy: Box<dyn Strategy>,
        commentary: Option<CommentarySender>,
    ) -> Self {
        let poll_interval = state.tick_inputs().0.poll_interval();
        Self::with_poll_interval(state, exchange, strategy, commentary, poll_interval)
    }

    pub fn with_poll_interval(
        state: SharedState,
        exchange: Arc<dyn ExchangeClient>,
        strategy: Box<dyn Strategy>,
        commentary: Option<CommentarySender>,
        poll_interval: Duration,
    ) -> Self {
        let engine = TradingEngine::new(exchange, strategy, state.clone(), commentary);
        Self {
            scheduler: SchedulerLoop::new(Arc::new(engine), poll_interval),
            state,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn status(&self) -> BotStatus {
        self.state.status()
    }

    /// Partial update; lands between ticks since each tick works on a copy.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        self.state.apply_update(update)
    }

    /// Fails without credentials; otherwise ensures the loop runs. Returns
    /// whether this call started it.
    pub async fn start(&self) -> Result<bool> {
        if !self.state.has_credentials() {
            return Err(BotError::Configuration(
                "API key and secret must be set before starting".into(),
            ));
        }
        Ok(self.scheduler.start().await)
    }

    /// Ensures the loop is not running. Returns whether this call stopped it.
    pub async fn stop(&self) -> bool {
        self.scheduler.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.is_active().await
    }

    /// One guarded tick outside the schedule.
    pub async fn tick_now(&self) -> bool {
        self.scheduler.tick_now().await
    }
}
