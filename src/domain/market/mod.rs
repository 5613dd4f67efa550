pub mod bar;
pub mod symbol;
pub mod timeframe;

pub use bar::{Bar, BarView, validate_bars};
pub use timeframe::Timeframe;
