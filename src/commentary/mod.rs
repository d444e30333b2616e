// src/commentary/mod.rs
//! Best-effort market commentary after an entry. Requests go through a bounded
//! queue to a worker task; nothing here can block or fail a trading tick.

pub mod gemini;

use crate::core::state::SharedState;
use crate::error::Result;
use crate::types::IndicatorSnapshot;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use gemini::GeminiCommentator;

#[derive(Debug, Clone)]
pub struct CommentaryRequest {
    pub symbol: String,
    pub price: Decimal,
    pub indicators: IndicatorSnapshot,
}

#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    async fn comment(&self, request: &CommentaryRequest) -> Result<String>;
}

/// Producer side held by the order executor.
#[derive(Debug, Clone)]
pub struct CommentarySender {
    tx: mpsc::Sender<CommentaryRequest>,
}

impl CommentarySender {
    /// Never waits. A full queue drops the request.
    pub fn request(&self, request: CommentaryRequest) {
        match self.tx.try_send(request) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Commentary queue full, dropping request");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Commentary worker is gone, dropping request");
            }
        }
    }
}

/// Spawns the worker. It stops once every sender is dropped.
pub fn spawn_worker(
    provider: Arc<dyn CommentaryProvider>,
    state: SharedState,
    capacity: usize,
) -> (CommentarySender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<CommentaryRequest>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            debug!("Generating commentary for {} @ {}", request.symbol, request.price);
            match provider.comment(&request).await {
                Ok(text) => {
                    state.log(format!("Commentary: {}", text));
                    state.set_commentary(text);
                }
                // Only the operational log hears about this.
                Err(e) => warn!("Commentary generation failed: {}", e),
            }
        }
        debug!("Commentary worker finished");
    });

    (CommentarySender { tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BotConfig, Credentials};
    use crate::error::BotError;
    use crate::types::MacdPoint;

    struct Echo;

    #[async_trait]
    impl CommentaryProvider for Echo {
        async fn comment(&self, request: &CommentaryRequest) -> Result<String> {
            Ok(format!("{} looks fine at {}", request.symbol, request.price))
        }
    }

    struct Broken;

    #[async_trait]
    impl CommentaryProvider for Broken {
        async fn comment(&self, _request: &CommentaryRequest) -> Result<String> {
            Err(BotError::Network("model unavailable".into()))
        }
    }

    fn request() -> CommentaryRequest {
        let point = MacdPoint {
            macd: 0.2,
            signal: 0.1,
        };
        CommentaryRequest {
            symbol: "BNBUSDT".into(),
            price: Decimal::from(600),
            indicators: IndicatorSnapshot {
                ema_long: 580.0,
                rsi: 55.0,
                bollinger_upper: 620.0,
                macd: point,
                prev_macd: point,
            },
        }
    }

    #[tokio::test]
    async fn test_worker_stores_commentary() {
        let state = SharedState::new(BotConfig::default(), Credentials::default());
        let (sender, handle) = spawn_worker(Arc::new(Echo), state.clone(), 4);

        sender.request(request());
        drop(sender);
        handle.await.unwrap();

        let status = state.status();
        assert_eq!(
            status.commentary.as_deref(),
            Some("BNBUSDT looks fine at 600")
        );
        assert!(status.logs[0].contains("Commentary:"));
    }

    #[tokio::test]
    async fn test_worker_swallows_failures() {
        let state = SharedState::new(BotConfig::default(), Credentials::default());
        let (sender, handle) = spawn_worker(Arc::new(Broken), state.clone(), 4);

        sender.request(request());
        sender.request(request());
        drop(sender);
        handle.await.unwrap();

        let status = state.status();
        assert!(status.commentary.is_none());
        assert!(status.logs.is_empty());
    }
}
