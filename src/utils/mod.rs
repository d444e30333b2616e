pub mod logging;
pub mod precision;
