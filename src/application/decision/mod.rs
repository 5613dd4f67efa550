// Advisory trade decisions and basket sizing
pub mod allocator;
pub mod analysis;
pub mod risk_levels;
pub mod rules;

pub use allocator::{AssetSignals, allocate};
pub use analysis::{AnalysisRequest, TradingAnalyzer};
pub use risk_levels::{RiskLevels, RiskParameters};
pub use rules::{SignalContext, decide, select_label};
