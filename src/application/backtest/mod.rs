pub mod walk_forward;

pub use walk_forward::{BacktestRequest, WalkForwardBacktester, evaluate};
