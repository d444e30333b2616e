// src/strategies/traits.rs
use crate::config::BotConfig;
use crate::error::Result;
use crate::types::{Decision, IndicatorSnapshot, Position};
use rust_decimal::Decimal;

/// Everything a strategy may look at for one tick. All fields come from the
/// same candle fetch and the same position reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub price: Decimal,
    pub indicators: &'a IndicatorSnapshot,
    pub position: &'a Position,
    pub config: &'a BotConfig,
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Re-evaluated from scratch every tick; no memory between calls. Errors
    /// only when the thresholds cannot be represented.
    fn decide(&self, market: &MarketView<'_>) -> Result<Decision>;
}
