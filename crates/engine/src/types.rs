// In crates/engine/src/types.rs

use capital::CapitalPoolSnapshot;
use chrono::{DateTime, Utc};
use core_types::{Money, StrategyId, TradeDecision, TradeRequest, VenueId, VolatilityReading};
use execution::OrderResult;
use risk::RiskGovernorState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The realized result of a previously approved trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub strategy: StrategyId,
    pub venue: VenueId,
    /// Open exposure to release; the approved `position_size`.
    pub size: Money,
    pub pnl: Money,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Cell balance after settlement.
    pub balance: Money,
    /// Set when the loss exceeded the cell and it was clamped to zero.
    pub shortfall: Option<Money>,
}

impl Settlement {
    pub(crate) fn clamped(shortfall: Money) -> Self {
        Self {
            balance: Decimal::ZERO,
            shortfall: Some(shortfall),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub taken_at: DateTime<Utc>,
    pub pool: CapitalPoolSnapshot,
    pub governor: RiskGovernorState,
    pub latest_volatility: Option<VolatilityReading>,
    /// Evaluation is refused until the pool is reconciled.
    pub halted: bool,
    pub audit_entries: usize,
}

/// One request as processed by an evaluation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedRequest {
    pub request: TradeRequest,
    pub decision: TradeDecision,
    pub order: Option<OrderResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub strategy: StrategyId,
    pub evaluated: Vec<EvaluatedRequest>,
    /// Requests that failed with an error instead of a decision.
    pub errors: usize,
    /// The task stopped early on a fatal error.
    pub aborted: bool,
}

impl TaskReport {
    pub fn new(strategy: StrategyId) -> Self {
        Self {
            strategy,
            evaluated: Vec::new(),
            errors: 0,
            aborted: false,
        }
    }

    pub fn approved(&self) -> usize {
        self.evaluated.iter().filter(|e| e.decision.approved).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub tasks: Vec<TaskReport>,
    /// Requests for strategies with no evaluation task.
    pub unrouted: usize,
}
