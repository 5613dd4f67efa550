pub mod csv_bars;
pub mod file_model_store;

pub use csv_bars::CsvMarketData;
pub use file_model_store::FileModelStore;
