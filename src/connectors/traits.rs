// src/connectors/traits.rs
use crate::config::Credentials;
use crate::error::Result;
use crate::types::{CandleSeries, OrderResponse, Position, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Exchange access used by the engine. Holds no strategy logic.
///
/// Private calls take the credentials of the current tick and must fail with
/// `BotError::Auth` before any network I/O when the key or secret is missing.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: u16)
        -> Result<CandleSeries>;

    /// Raw exchange view of the position; sign and flat-threshold are interpreted
    /// by the position tracker.
    async fn fetch_position(&self, creds: &Credentials, symbol: &str) -> Result<Position>;

    async fn set_leverage(&self, creds: &Credentials, symbol: &str, leverage: u8) -> Result<()>;

    /// Not idempotent: every call places a new order.
    async fn submit_market_order(
        &self,
        creds: &Credentials,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> Result<OrderResponse>;
}
