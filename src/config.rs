// src/config.rs

use crate::error::{BotError, Result};
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Strategy and sizing parameters. The tick works on a clone, so a config update
/// only ever lands between two ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub symbol: String,
    pub interval: String,
    pub candle_limit: u16,
    pub poll_interval_secs: u64,
    pub allocated_capital: Decimal,
    pub take_profit_percent: Decimal,
    pub stop_loss_percent: Decimal,
    pub leverage: u8,
    /// Share of the allocated capital posted as margin on entry.
    pub margin_fraction: Decimal,
    pub lot_step: Decimal,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "BNBUSDT".to_string(),
            interval: "15m".to_string(),
            candle_limit: 250,
            poll_interval_secs: 15,
            allocated_capital: Decimal::from(35),
            take_profit_percent: Decimal::from(2),
            stop_loss_percent: Decimal::ONE,
            leverage: 5,
            margin_fraction: Decimal::new(20, 2),
            lot_step: Decimal::new(1, 2),
        }
    }
}

impl BotConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BotError::Configuration("symbol must not be empty".into()));
        }
        if usize::from(self.candle_limit) < crate::indicators::EMA_LONG_PERIOD {
            return Err(BotError::Configuration(format!(
                "candle_limit must be at least {}",
                crate::indicators::EMA_LONG_PERIOD
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(BotError::Configuration(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.leverage == 0 {
            return Err(BotError::Configuration("leverage must be at least 1".into()));
        }
        if self.margin_fraction <= Decimal::ZERO || self.margin_fraction > Decimal::ONE {
            return Err(BotError::Configuration(
                "margin_fraction must be in (0, 1]".into(),
            ));
        }
        if self.lot_step <= Decimal::ZERO {
            return Err(BotError::Configuration("lot_step must be positive".into()));
        }
        ensure_in_range("allocated_capital", self.allocated_capital, max_capital())?;
        ensure_in_range("take_profit_percent", self.take_profit_percent, MAX_PERCENT)?;
        ensure_in_range("stop_loss_percent", self.stop_loss_percent, MAX_PERCENT)?;
        Ok(())
    }
}

const MAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

fn max_capital() -> Decimal {
    Decimal::from(1_000_000_000u64)
}

/// Accepts `0 < value <= max`.
fn ensure_in_range(field: &str, value: Decimal, max: Decimal) -> Result<()> {
    if value <= Decimal::ZERO || value > max {
        return Err(BotError::Configuration(format!(
            "{} must be in (0, {}], got {}",
            field, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub recv_window_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            recv_window_ms: 5000,
            request_timeout_secs: 10,
        }
    }
}

impl ExchangeConfig {
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| BotError::Configuration(format!("invalid base_url: {}", e)))?;
        if self.request_timeout_secs == 0 {
            return Err(BotError::Configuration(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentaryConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub queue_capacity: usize,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: "gemini-2.5-flash".to_string(),
            queue_capacity: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    pub bot: BotConfig,
    pub exchange: ExchangeConfig,
    pub commentary: CommentaryConfig,
}

impl AppConfig {
    /// Defaults, then `Settings.toml` if present, then `APP_*` env overrides
    /// (`APP_BOT__ALLOCATED_CAPITAL=50`).
    pub fn new() -> Result<Self> {
        let bot = BotConfig::default();
        let exchange = ExchangeConfig::default();
        let commentary = CommentaryConfig::default();

        let builder = Config::builder()
            .set_default("api_key", "")?
            .set_default("secret_key", "")?
            .set_default("bot.symbol", bot.symbol)?
            .set_default("bot.interval", bot.interval)?
            .set_default("bot.candle_limit", i64::from(bot.candle_limit))?
            .set_default("bot.poll_interval_secs", bot.poll_interval_secs)?
            .set_default("bot.allocated_capital", bot.allocated_capital.to_string())?
            .set_default("bot.take_profit_percent", bot.take_profit_percent.to_string())?
            .set_default("bot.stop_loss_percent", bot.stop_loss_percent.to_string())?
            .set_default("bot.leverage", i64::from(bot.leverage))?
            .set_default("bot.margin_fraction", bot.margin_fraction.to_string())?
            .set_default("bot.lot_step", bot.lot_step.to_string())?
            .set_default("exchange.base_url", exchange.base_url)?
            .set_default("exchange.recv_window_ms", exchange.recv_window_ms)?
            .set_default("exchange.request_timeout_secs", exchange.request_timeout_secs)?
            .set_default("commentary.model", commentary.model)?
            .set_default("commentary.queue_capacity", commentary.queue_capacity as u64)?
            .add_source(File::with_name("Settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        if config.api_key.is_empty() {
            config.api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
        }
        if config.secret_key.is_empty() {
            config.secret_key = std::env::var("BINANCE_SECRET_KEY").unwrap_or_default();
        }
        if config.commentary.gemini_api_key.is_none() {
            config.commentary.gemini_api_key =
                std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        }

        config.bot.validate()?;
        config.exchange.validate()?;
        Ok(config)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.secret_key.clone())
    }
}

/// API key pair. The secret never shows up in `Debug` output or status snapshots.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Only for signing. Never log the return value.
    pub fn expose_secret(&self) -> &str {
        &self.secret_key
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn has_secret(&self) -> bool {
        !self.secret_key.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.has_api_key() && self.has_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Partial update coming from an operator. Absent or empty fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub allocated_capital: Option<Decimal>,
    pub tp_percent: Option<Decimal>,
    pub sl_percent: Option<Decimal>,
}

impl ConfigUpdate {
    /// Applies the update atomically: either every present field lands or none does.
    pub fn apply(self, config: &mut BotConfig, credentials: &mut Credentials) -> Result<()> {
        if let Some(capital) = self.allocated_capital {
            ensure_in_range("allocated_capital", capital, max_capital())?;
        }
        if let Some(tp) = self.tp_percent {
            ensure_in_range("tp_percent", tp, MAX_PERCENT)?;
        }
        if let Some(sl) = self.sl_percent {
            ensure_in_range("sl_percent", sl, MAX_PERCENT)?;
        }

        if let Some(key) = self.api_key.filter(|k| !k.is_empty()) {
            credentials.api_key = key;
        }
        if let Some(secret) = self.api_secret.filter(|s| !s.is_empty()) {
            credentials.secret_key = secret;
        }
        if let Some(capital) = self.allocated_capital {
            config.allocated_capital = capital;
        }
        if let Some(tp) = self.tp_percent {
            config.take_profit_percent = tp;
        }
        if let Some(sl) = self.sl_percent {
            config.stop_loss_percent = sl;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BotConfig::default().validate().is_ok());
        assert!(ExchangeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_short_candle_limit_rejected() {
        let config = BotConfig {
            candle_limit: 150,
            ..BotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BotError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("my_api_key".into(), "super_secret_key".into());
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("my_api_key"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_partial_update_keeps_absent_fields() {
        let mut config = BotConfig::default();
        let mut creds = Credentials::new("key".into(), "secret".into());

        let update = ConfigUpdate {
            tp_percent: Some(Decimal::from(3)),
            api_secret: Some(String::new()),
            ..ConfigUpdate::default()
        };
        update.apply(&mut config, &mut creds).unwrap();

        assert_eq!(config.take_profit_percent, Decimal::from(3));
        assert_eq!(config.stop_loss_percent, Decimal::ONE);
        assert_eq!(config.allocated_capital, Decimal::from(35));
        assert_eq!(creds.expose_secret(), "secret");
    }

    #[test]
    fn test_invalid_update_applies_nothing() {
        let mut config = BotConfig::default();
        let mut creds = Credentials::default();

        let update = ConfigUpdate {
            api_key: Some("new_key".into()),
            allocated_capital: Some(Decimal::from(100)),
            sl_percent: Some(Decimal::ZERO),
            ..ConfigUpdate::default()
        };
        assert!(update.apply(&mut config, &mut creds).is_err());
        assert_eq!(config, BotConfig::default());
        assert!(!creds.has_api_key());
    }

    #[test]
    fn test_out_of_range_update_rejected() {
        let mut config = BotConfig::default();
        let mut creds = Credentials::default();

        for update in [
            ConfigUpdate {
                tp_percent: Some(Decimal::from(101)),
                ..ConfigUpdate::default()
            },
            ConfigUpdate {
                sl_percent: Some(Decimal::new(1001, 1)),
                ..ConfigUpdate::default()
            },
            ConfigUpdate {
                allocated_capital: Some(Decimal::MAX),
                ..ConfigUpdate::default()
            },
        ] {
            assert!(matches!(
                update.apply(&mut config, &mut creds),
                Err(BotError::Configuration(_))
            ));
        }
        assert_eq!(config, BotConfig::default());

        let at_limit = ConfigUpdate {
            tp_percent: Some(Decimal::ONE_HUNDRED),
            ..ConfigUpdate::default()
        };
        at_limit.apply(&mut config, &mut creds).unwrap();
        assert_eq!(config.take_profit_percent, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_update_deserializes_from_camel_case() {
        let update: ConfigUpdate =
            serde_json::from_str(r#"{"apiKey":"k","allocatedCapital":"50"}"#).unwrap();
        assert_eq!(update.api_key.as_deref(), Some("k"));
        assert_eq!(update.allocated_capital, Some(Decimal::from(50)));
        assert!(update.tp_percent.is_none());
    }
}
