// In crates/execution/src/types.rs

use core_types::{Money, Side, StrategyId, Symbol, VenueId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaperSettings {
    /// The taker fee charged on notional (e.g., 0.0004 for 0.04%).
    pub taker_fee: f64,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self { taker_fee: 0.0004 }
    }
}

/// A sized, approved trade ready to be routed to a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub strategy: StrategyId,
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: Side,
    /// Position size in account currency.
    pub size: Money,
    pub leverage: f64,
}

/// What the venue reported back for a submitted intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: Side,
    pub filled_size: Money,
    pub fee: Money,
}
