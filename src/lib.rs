// Core modules
pub mod commentary;
pub mod config;
pub mod connectors;
pub mod core;
pub mod error;
pub mod indicators;
pub mod strategies;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{Bot, BotStatus, SharedState};
pub use error::{BotError, Result};
pub use types::*;
