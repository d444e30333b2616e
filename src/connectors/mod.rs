pub mod binance;
pub mod messages;
pub mod signer;
pub mod traits;

pub use binance::BinanceFuturesClient;
pub use signer::RequestSigner;
pub use traits::ExchangeClient;
