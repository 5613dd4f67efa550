pub mod feature;
pub mod frame;

pub use feature::Feature;
pub use frame::FeatureFrame;
