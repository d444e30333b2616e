// src/strategies/trend_macd.rs
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::strategies::traits::{MarketView, Strategy};
use crate::types::{Decision, ExitReason, PositionSide};
use crate::utils::precision::normalize_quantity;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

const RSI_LOWER: f64 = 40.0;
const RSI_UPPER: f64 = 70.0;

/// Long-only trend follower: EMA uptrend filter, MACD bullish crossover and a
/// mid-range RSI to enter; fixed TP/SL percents or an upper-band breakout to exit.
#[derive(Debug, Default, Clone)]
pub struct TrendMacdStrategy;

impl TrendMacdStrategy {
    pub fn new() -> Self {
        Self
    }

    fn entry_signal(&self, market: &MarketView<'_>) -> Decision {
        let ind = market.indicators;
        let price = market.price.to_f64().unwrap_or(f64::NAN);

        let is_uptrend = price > ind.ema_long;
        let is_macd_cross_up =
            ind.prev_macd.macd <= ind.prev_macd.signal && ind.macd.macd > ind.macd.signal;
        let is_rsi_valid = ind.rsi > RSI_LOWER && ind.rsi < RSI_UPPER;

        debug!(
            "entry check: uptrend={} macd_cross={} rsi_ok={}",
            is_uptrend, is_macd_cross_up, is_rsi_valid
        );

        if is_uptrend && is_macd_cross_up && is_rsi_valid {
            Decision::Enter {
                price: market.price,
            }
        } else {
            Decision::Hold
        }
    }

    fn exit_signal(&self, market: &MarketView<'_>) -> Result<Decision> {
        let position = market.position;
        let config = market.config;

        let tp_price = threshold(position.entry_price, Decimal::ONE, config.take_profit_percent)
            .ok_or_else(|| overflow("take profit", position.entry_price))?;
        let sl_price = threshold(position.entry_price, Decimal::NEGATIVE_ONE, config.stop_loss_percent)
            .ok_or_else(|| overflow("stop loss", position.entry_price))?;
        let band = Decimal::from_f64(market.indicators.bollinger_upper);

        let reason = if market.price >= tp_price {
            Some(ExitReason::TakeProfit)
        } else if band.is_some_and(|upper| market.price >= upper) {
            Some(ExitReason::BandBreakout)
        } else if market.price <= sl_price {
            Some(ExitReason::StopLoss)
        } else {
            None
        };

        Ok(match reason {
            Some(reason) => Decision::Exit {
                quantity: position.quantity,
                reason,
            },
            None => Decision::Hold,
        })
    }
}

/// `entry × (1 ± percent/100)`; `None` on overflow.
fn threshold(entry: Decimal, sign: Decimal, percent: Decimal) -> Option<Decimal> {
    let offset = percent.checked_div(Decimal::ONE_HUNDRED)?.checked_mul(sign)?;
    entry.checked_mul(Decimal::ONE.checked_add(offset)?)
}

fn overflow(what: &str, entry: Decimal) -> BotError {
    BotError::Configuration(format!(
        "{} threshold overflows for entry price {}",
        what, entry
    ))
}

impl Strategy for TrendMacdStrategy {
    fn name(&self) -> &str {
        "trend-macd"
    }

    fn decide(&self, market: &MarketView<'_>) -> Result<Decision> {
        match market.position.side() {
            PositionSide::Flat => Ok(self.entry_signal(market)),
            PositionSide::Long => self.exit_signal(market),
        }
    }
}

/// `(capital × margin_fraction × leverage) / price`, truncated to the lot step.
pub fn order_quantity(config: &BotConfig, price: Decimal) -> Result<Decimal> {
    if price <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let raw = config
        .allocated_capital
        .checked_mul(config.margin_fraction)
        .and_then(|margin| margin.checked_mul(Decimal::from(config.leverage)))
        .and_then(|notional| notional.checked_div(price))
        .ok_or_else(|| {
            BotError::Configuration(format!(
                "order size overflows for capital {} at price {}",
                config.allocated_capital, price
            ))
        })?;
    Ok(normalize_quantity(raw, config.lot_step))
}
