// In crates/core-types/src/lib.rs

pub mod clock;
pub mod error;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use strategy::{StrategyConfig, StrategyKind};
pub use types::{
    BlockReason, LockReason, Money, ScalingMode, Side, StrategyId, Symbol, TradeDecision,
    TradeRequest, VenueId, VolatilityReading,
};
