// In crates/risk/src/lib.rs

//! Per-trade risk decisions: confidence scoring, adaptive scaling, the
//! calendar and volatility gates, the circuit breaker and position sizing.

pub mod adaptive;
pub mod confidence;
pub mod error;
pub mod gates;
pub mod governor;
pub mod sizer;
pub mod types;

// Re-export public types
pub use adaptive::{AdaptiveResult, AdaptiveScaler};
pub use confidence::{ConfidenceResult, ConfidenceScorer};
pub use error::{Error, Result};
pub use gates::{GateResult, TimeWindowGate, VolatilityGate};
pub use governor::{GovernorStatus, RiskGovernor, RiskGovernorState};
pub use sizer::PositionSizer;
pub use types::{
    AdaptiveSettings, CalendarSettings, ConfidenceSettings, ConfidenceTier, GovernorSettings,
    RiskCaps, ScoreRange, VolatilitySettings,
};
