// In crates/audit/src/types.rs

use capital::CapitalPoolSnapshot;
use chrono::{DateTime, Utc};
use core_types::{StrategyId, TradeDecision, TradeRequest, VenueId};
use risk::RiskGovernorState;
use serde::{Deserialize, Serialize};

/// One evaluation, exactly as the engine saw it. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub request: TradeRequest,
    pub decision: TradeDecision,
    pub pool: CapitalPoolSnapshot,
    pub governor: RiskGovernorState,
}

/// Criteria for `AuditLedger::query`. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub strategy: Option<StrategyId>,
    pub venue: Option<VenueId>,
    pub approved: Option<bool>,
    /// Inclusive lower bound on the entry timestamp.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the entry timestamp.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.strategy
            .as_ref()
            .is_none_or(|s| *s == entry.request.strategy)
            && self.venue.as_ref().is_none_or(|v| *v == entry.request.venue)
            && self.approved.is_none_or(|a| a == entry.decision.approved)
            && self.since.is_none_or(|t| entry.timestamp >= t)
            && self.until.is_none_or(|t| entry.timestamp < t)
    }
}

/// Settings for the optional JSON-lines journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub journal_path: Option<String>,
}
