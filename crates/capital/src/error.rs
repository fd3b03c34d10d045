// In crates/capital/src/error.rs

use core_types::{Money, StrategyId, VenueId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A loss larger than the cell. The cell has already been clamped to zero.
    #[error("Insufficient allocation for {strategy}@{venue}: shortfall {shortfall}")]
    InsufficientAllocation {
        strategy: StrategyId,
        venue: VenueId,
        shortfall: Money,
    },

    #[error("No allocation for {strategy}@{venue}")]
    UnknownCell { strategy: StrategyId, venue: VenueId },

    #[error("Invalid capital input: {0}")]
    InvalidInput(String),

    #[error("Capital invariant breached: {0}")]
    InvariantBreach(String),

    #[error(transparent)]
    Contract(#[from] core_types::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
