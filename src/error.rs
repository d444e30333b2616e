// src/error.rs
use thiserror::Error;

/// Every failure a tick, an order or a config update can produce.
#[derive(Debug, Error)]
pub enum BotError {
    /// Missing or invalid configuration / credentials.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Credentials absent, or rejected by the exchange.
    #[error("auth error: {0}")]
    Auth(String),

    /// Transport failure, non-2xx answer or unreadable payload.
    #[error("network error: {0}")]
    Network(String),

    #[error("insufficient data: need {required} closes, got {available}")]
    InsufficientData { required: usize, available: usize },

    /// Exchange-side rejection of an order or leverage change.
    #[error("order rejected: {0}")]
    OrderRejected(String),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Network(err.to_string())
    }
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
