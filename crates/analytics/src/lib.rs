//! Rolling per-strategy performance statistics.

pub mod engine;
pub mod tracker;
pub mod types;

pub use tracker::PerformanceTracker;
pub use types::{PerformanceRecord, PerformanceSettings};
