// In crates/core-types/src/error.rs

use crate::{StrategyId, VenueId};
use thiserror::Error;

/// Contract violations: the caller handed the engine something it can never
/// act on. Distinct from a rejected trade, which is a normal decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(StrategyId),

    #[error("Unknown venue: {0}")]
    UnknownVenue(VenueId),

    #[error("Malformed trade request: {0}")]
    InvalidRequest(String),

    #[error("Capital input must not be negative: {0}")]
    NegativeCapital(String),
}

pub type Result<T> = std::result::Result<T, Error>;
