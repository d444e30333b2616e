// src/indicators/mod.rs
//! Indicator snapshot over one candle fetch.

pub mod math;

use crate::error::{BotError, Result};
use crate::types::{CandleSeries, IndicatorSnapshot, MacdPoint};
use ta::indicators::{BollingerBands, MovingAverageConvergenceDivergence};
use ta::Next;

pub const EMA_LONG_PERIOD: usize = 200;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const RSI_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_STD_DEV: f64 = 2.0;

/// Stateless: every call starts from the closes it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fails with `InsufficientData` below `EMA_LONG_PERIOD` closes instead of
    /// returning placeholder values.
    pub fn compute(&self, series: &CandleSeries) -> Result<IndicatorSnapshot> {
        if series.len() < EMA_LONG_PERIOD {
            return Err(BotError::InsufficientData {
                required: EMA_LONG_PERIOD,
                available: series.len(),
            });
        }

        let closes = series.closes_f64();
        if closes.iter().any(|c| !c.is_finite()) {
            return Err(BotError::Network("close price out of f64 range".into()));
        }

        let ema_long = math::ema(&closes, EMA_LONG_PERIOD).ok_or(BotError::InsufficientData {
            required: EMA_LONG_PERIOD,
            available: closes.len(),
        })?;
        let rsi = math::rsi(&closes, RSI_PERIOD).ok_or(BotError::InsufficientData {
            required: RSI_PERIOD + 1,
            available: closes.len(),
        })?;
        let (prev_macd, macd) = macd_tail(&closes)?;
        let bollinger_upper = bollinger_upper(&closes)?;

        Ok(IndicatorSnapshot {
            ema_long,
            rsi,
            bollinger_upper,
            macd,
            prev_macd,
        })
    }
}

/// Last two MACD points (previous, current), both averages exponential.
fn macd_tail(closes: &[f64]) -> Result<(MacdPoint, MacdPoint)> {
    let mut macd = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
        .map_err(|e| BotError::Configuration(format!("MACD parameters: {:?}", e)))?;

    let mut prev = None;
    let mut current = None;
    for close in closes {
        let out = macd.next(*close);
        prev = current;
        current = Some(MacdPoint {
            macd: out.macd,
            signal: out.signal,
        });
    }

    match (prev, current) {
        (Some(prev), Some(current)) => Ok((prev, current)),
        _ => Err(BotError::InsufficientData {
            required: 2,
            available: closes.len(),
        }),
    }
}

fn bollinger_upper(closes: &[f64]) -> Result<f64> {
    let mut bands = BollingerBands::new(BB_PERIOD, BB_STD_DEV)
        .map_err(|e| BotError::Configuration(format!("Bollinger parameters: {:?}", e)))?;

    let mut upper = None;
    for close in closes {
        upper = Some(bands.next(*close).upper);
    }
    upper.ok_or(BotError::InsufficientData {
        required: BB_PERIOD,
        available: closes.len(),
    })
}
