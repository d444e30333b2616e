// src/core/executor.rs
use crate::commentary::{CommentaryRequest, CommentarySender};
use crate::config::{BotConfig, Credentials};
use crate::connectors::traits::ExchangeClient;
use crate::error::Result;
use crate::strategies::trend_macd::order_quantity;
use crate::types::{Decision, ExitReason, IndicatorSnapshot, Side};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionReport {
    /// `Hold`: nothing sent.
    Idle,
    /// Entry wanted but not sent, e.g. size below one lot.
    Skipped(String),
    Opened {
        quantity: Decimal,
        price: Decimal,
        order_id: String,
    },
    Closed {
        quantity: Decimal,
        reason: ExitReason,
        order_id: String,
    },
}

/// Turns a decision into exchange calls. Each decision places at most one order.
pub struct OrderExecutor {
    exchange: Arc<dyn ExchangeClient>,
    commentary: Option<CommentarySender>,
}

impl OrderExecutor {
    pub fn new(exchange: Arc<dyn ExchangeClient>, commentary: Option<CommentarySender>) -> Self {
        Self {
            exchange,
            commentary,
        }
    }

    /// Errors leave the exchange as it was (no order on a failed leverage call);
    /// the next tick re-evaluates from the reported position.
    pub async fn execute(
        &self,
        decision: Decision,
        creds: &Credentials,
        config: &BotConfig,
        indicators: &IndicatorSnapshot,
    ) -> Result<ExecutionReport> {
        match decision {
            Decision::Hold => Ok(ExecutionReport::Idle),
            Decision::Enter { price } => self.open_long(price, creds, config, indicators).await,
            Decision::Exit { quantity, reason } => {
                self.close_position(quantity, reason, creds, config).await
            }
        }
    }

    async fn open_long(
        &self,
        price: Decimal,
        creds: &Credentials,
        config: &BotConfig,
        indicators: &IndicatorSnapshot,
    ) -> Result<ExecutionReport> {
        let quantity = order_quantity(config, price)?;
        if quantity.is_zero() {
            warn!(
                "⚠️ Quantity is zero after normalization (capital {}, price {}). Not entering position.",
                config.allocated_capital, price
            );
            return Ok(ExecutionReport::Skipped(format!(
                "order size below lot step {} at price {}",
                config.lot_step, price
            )));
        }

        self.exchange
            .set_leverage(creds, &config.symbol, config.leverage)
            .await?;
        let order = self
            .exchange
            .submit_market_order(creds, &config.symbol, Side::Buy, quantity)
            .await?;

        info!("✅ Long opened: {:?}", order);

        if let Some(commentary) = &self.commentary {
            commentary.request(CommentaryRequest {
                symbol: config.symbol.clone(),
                price,
                indicators: indicators.clone(),
            });
        }

        Ok(ExecutionReport::Opened {
            quantity,
            price,
            order_id: order.id,
        })
    }

    async fn close_position(
        &self,
        quantity: Decimal,
        reason: ExitReason,
        creds: &Credentials,
        config: &BotConfig,
    ) -> Result<ExecutionReport> {
        let order = self
            .exchange
            .submit_market_order(creds, &config.symbol, Side::Sell, quantity)
            .await?;

        info!("✅ Position closed ({:?}): {:?}", reason, order);

        Ok(ExecutionReport::Closed {
            quantity,
            reason,
            order_id: order.id,
        })
    }
}
