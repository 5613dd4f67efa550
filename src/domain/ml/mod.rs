pub mod feature_registry;
pub mod forecast;

pub use forecast::{Forecast, ForecastSource, ForecastVariant};
