pub mod cross_validation;
pub mod ensemble;
pub mod forecast_pct;
pub mod forecast_price;
pub mod gradient_boosting;
pub mod model_cache;
pub mod pipeline;
pub mod scaler;
pub mod strategies;

pub use forecast_pct::PercentChangeForecaster;
pub use forecast_price::AbsolutePriceForecaster;
pub use model_cache::ModelCache;
