pub mod bot;
pub mod engine;
pub mod executor;
pub mod position;
pub mod scheduler;
pub mod state;

pub use bot::Bot;
pub use engine::{TickOutcome, TradingEngine};
pub use executor::{ExecutionReport, OrderExecutor};
pub use position::PositionTracker;
pub use scheduler::SchedulerLoop;
pub use state::{BotState, BotStatus, LogBuffer, SharedState};
