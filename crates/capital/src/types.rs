// In crates/capital/src/types.rs

use core_types::{Money, StrategyId, VenueId};
use serde::{Deserialize, Serialize};

/// One (strategy, venue) cell of the allocation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellAllocation {
    pub strategy: StrategyId,
    pub venue: VenueId,
    pub allocation: Money,
    pub open_exposure: Money,
}

/// Serializable copy of the pool, in cell key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalPoolSnapshot {
    pub total_capital: Money,
    pub reserve: Money,
    pub cells: Vec<CellAllocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalanceReport {
    /// Cells that received a boost from the reserve.
    pub boosted: Vec<(StrategyId, VenueId)>,
    /// Cells below the floor the reserve could no longer cover.
    pub unfunded: Vec<(StrategyId, VenueId)>,
    pub moved: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationReport {
    /// Net change per cell; sums to zero.
    pub transfers: Vec<(StrategyId, VenueId, Money)>,
    pub moved: Money,
}
