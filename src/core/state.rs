// src/core/state.rs
use crate::config::{BotConfig, ConfigUpdate, Credentials};
use crate::error::Result;
use crate::types::{IndicatorSnapshot, Position};
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{error, info, warn};

pub const LOG_CAPACITY: usize = 50;

/// Newest-first ring of timestamped lines; the oldest line drops on overflow.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, msg: &str) {
        let time = Local::now().format("%H:%M:%S");
        self.lines.push_front(format!("[{}] {}", time, msg));
        self.lines.truncate(self.capacity);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

#[derive(Debug)]
pub struct BotState {
    pub config: BotConfig,
    pub credentials: Credentials,
    pub running: bool,
    pub current_price: Option<Decimal>,
    pub indicators: Option<IndicatorSnapshot>,
    pub position: Position,
    pub logs: LogBuffer,
    pub commentary: Option<String>,
}

impl BotState {
    pub fn new(config: BotConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
            running: false,
            current_price: None,
            indicators: None,
            position: Position::flat(),
            logs: LogBuffer::default(),
            commentary: None,
        }
    }
}

/// Read-only view handed to observers. Credentials only show as `"SET"` or `""`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub running: bool,
    pub api_key: &'static str,
    pub api_secret: &'static str,
    pub config: BotConfig,
    pub current_price: Option<Decimal>,
    pub indicators: Option<IndicatorSnapshot>,
    pub position: Option<Position>,
    pub logs: Vec<String>,
    pub commentary: Option<String>,
}

fn mask(is_set: bool) -> &'static str {
    if is_set {
        "SET"
    } else {
        ""
    }
}

/// Handle on the bot state. Locks are only held for field copies, never across
/// an `.await`.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<BotState>>,
}

impl SharedState {
    pub fn new(config: BotConfig, credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BotState::new(config, credentials))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BotState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BotState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Config and credentials frozen for the duration of one tick.
    pub fn tick_inputs(&self) -> (BotConfig, Credentials) {
        let state = self.read();
        (state.config.clone(), state.credentials.clone())
    }

    pub fn status(&self) -> BotStatus {
        let state = self.read();
        BotStatus {
            running: state.running,
            api_key: mask(state.credentials.has_api_key()),
            api_secret: mask(state.credentials.has_secret()),
            config: state.config.clone(),
            current_price: state.current_price,
            indicators: state.indicators.clone(),
            position: (!state.position.is_flat()).then(|| state.position.clone()),
            logs: state.logs.lines(),
            commentary: state.commentary.clone(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.read().credentials.is_complete()
    }

    pub fn is_running(&self) -> bool {
        self.read().running
    }

    pub fn set_running(&self, running: bool) {
        self.write().running = running;
    }

    pub fn apply_update(&self, update: ConfigUpdate) -> Result<()> {
        let mut state = self.write();
        let BotState {
            config,
            credentials,
            ..
        } = &mut *state;
        update.apply(config, credentials)
    }

    pub fn publish_market(&self, price: Decimal, indicators: Option<IndicatorSnapshot>) {
        let mut state = self.write();
        state.current_price = Some(price);
        state.indicators = indicators;
    }

    pub fn publish_position(&self, position: Position) {
        self.write().position = position;
    }

    pub fn position(&self) -> Position {
        self.read().position.clone()
    }

    pub fn set_commentary(&self, text: String) {
        self.write().commentary = Some(text);
    }

    pub fn log(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        info!("{}", msg);
        self.write().logs.push(msg);
    }

    pub fn log_warn(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        warn!("{}", msg);
        self.write().logs.push(msg);
    }

    pub fn log_error(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        error!("{}", msg);
        self.write().logs.push(msg);
    }
}
