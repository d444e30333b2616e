// src/main.rs
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use trend_bot::commentary::{self, GeminiCommentator};
use trend_bot::config::AppConfig;
use trend_bot::connectors::BinanceFuturesClient;
use trend_bot::utils::logging;
use trend_bot::{Bot, SharedState};

const STATUS_EVERY: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _log_guard = logging::init("logs");

    // 1. Load Configuration
    let config = AppConfig::new()?;

    info!("========================================");
    info!("       TREND BOT - v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!("Target:   {} ({})", config.bot.symbol, config.bot.interval);
    info!("Capital:  {} @ {}x", config.bot.allocated_capital, config.bot.leverage);
    info!(
        "TP / SL:  {}% / {}%",
        config.bot.take_profit_percent, config.bot.stop_loss_percent
    );
    info!("========================================");

    // 2. Initialize Components
    let state = SharedState::new(config.bot.clone(), config.credentials());
    let exchange = Arc::new(BinanceFuturesClient::new(&config.exchange)?);

    let commentary = match &config.commentary.gemini_api_key {
        Some(key) => {
            let provider = GeminiCommentator::new(key.clone(), config.commentary.model.clone())?;
            let (sender, _worker) = commentary::spawn_worker(
                Arc::new(provider),
                state.clone(),
                config.commentary.queue_capacity,
            );
            Some(sender)
        }
        None => {
            info!("No Gemini key configured, entry commentary disabled");
            None
        }
    };

    let bot = Bot::new(state, exchange, commentary);

    // 3. Run until Ctrl+C
    if let Err(e) = bot.start().await {
        warn!("Bot not started: {}", e);
    }

    let mut status_timer = tokio::time::interval(STATUS_EVERY);
    status_timer.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            _ = status_timer.tick() => {
                let status = bot.status();
                info!(
                    "status: running={} price={:?} position={:?}",
                    status.running, status.current_price, status.position
                );
            }
        }
    }

    bot.stop().await;
    println!("{}", serde_json::to_string_pretty(&bot.status())?);
    Ok(())
}
