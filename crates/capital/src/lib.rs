// In crates/capital/src/lib.rs

pub mod error;
pub mod pool;
pub mod types;

pub use error::{Error, Result};
pub use pool::{CapitalPool, CellKey};
pub use types::{CapitalPoolSnapshot, CellAllocation, RebalanceReport, RotationReport};
