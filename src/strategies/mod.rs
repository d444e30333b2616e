pub mod traits;
pub mod trend_macd;

pub use traits::{MarketView, Strategy};
pub use trend_macd::TrendMacdStrategy;
