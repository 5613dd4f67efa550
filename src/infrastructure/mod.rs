pub mod binance;
pub mod core;
pub mod mock;
pub mod news;
pub mod persistence;

pub use binance::BinanceMarketData;
pub use news::NewsApiSentiment;
pub use persistence::{CsvMarketData, FileModelStore};
