// In crates/core-types/src/types.rs

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All capital amounts are fixed-point decimals.
pub type Money = Decimal;

/// A tradable instrument, e.g. "BTCUSDT".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

/// Identifies a trading strategy, e.g. "scalper-1".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyId(pub String);

/// Identifies an execution venue (exchange), e.g. "binance".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VenueId(pub String);

macro_rules! string_id {
    ($($ty:ident),*) => {$(
        impl $ty {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    )*};
}

string_id!(Symbol, StrategyId, VenueId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

/// A volatility observation supplied by the market-data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// How the adaptive scaler treated a strategy's base risk and leverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    Defensive,
    Stable,
    Aggressive,
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingMode::Defensive => write!(f, "defensive"),
            ScalingMode::Stable => write!(f, "stable"),
            ScalingMode::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Why the risk governor locked trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockReason {
    DailyLossLimit { loss_pct: f64 },
    DrawdownLimit { drawdown_pct: f64 },
    VolatilityKill { reading: f64 },
    Manual { note: String },
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::DailyLossLimit { loss_pct } => {
                write!(f, "daily loss limit breached ({loss_pct:.2}%)")
            }
            LockReason::DrawdownLimit { drawdown_pct } => {
                write!(f, "drawdown limit breached ({drawdown_pct:.2}%)")
            }
            LockReason::VolatilityKill { reading } => {
                write!(f, "volatility kill switch ({reading:.2})")
            }
            LockReason::Manual { note } => write!(f, "emergency lock: {note}"),
        }
    }
}

/// The typed reason attached to every rejected `TradeDecision`.
///
/// Rejections are expected business outcomes; they are never raised as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    TradingWindowClosed,
    /// An automatic lock whose cooldown has not yet expired.
    CooldownActive {
        lock: LockReason,
        until: DateTime<Utc>,
    },
    /// A manual lock that stays until an operator reset.
    EmergencyLock { lock: LockReason },
    VolatilityUnavailable,
    MarketStagnant { reading: f64 },
    VolatilitySpike { reading: f64 },
    ConfidenceBelowThreshold { score: f64, threshold: f64 },
    DrawdownCapExceeded { implied_pct: f64, max_pct: f64 },
    ExposureCapExceeded { requested: Money, available: Money },
    CapitalFloorReached { available: Money, floor: Money },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::TradingWindowClosed => write!(f, "trading window closed"),
            BlockReason::CooldownActive { lock, until } => {
                write!(f, "cooldown active until {until} ({lock})")
            }
            BlockReason::EmergencyLock { lock } => write!(f, "trading locked: {lock}"),
            BlockReason::VolatilityUnavailable => write!(f, "no fresh volatility reading"),
            BlockReason::MarketStagnant { reading } => {
                write!(f, "market stagnant (volatility {reading:.3})")
            }
            BlockReason::VolatilitySpike { reading } => {
                write!(f, "volatility spike ({reading:.3})")
            }
            BlockReason::ConfidenceBelowThreshold { score, threshold } => write!(
                f,
                "confidence below threshold ({score:.1} < {threshold:.1})"
            ),
            BlockReason::DrawdownCapExceeded { implied_pct, max_pct } => write!(
                f,
                "drawdown cap exceeded ({implied_pct:.2}% > {max_pct:.2}%)"
            ),
            BlockReason::ExposureCapExceeded {
                requested,
                available,
            } => write!(
                f,
                "exposure cap exceeded (requested {requested}, available {available})"
            ),
            BlockReason::CapitalFloorReached { available, floor } => write!(
                f,
                "capital floor reached (available {available}, floor {floor})"
            ),
        }
    }
}

/// A candidate trade submitted for governance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub strategy: StrategyId,
    pub venue: VenueId,
    pub symbol: Symbol,
    pub side: Side,
    /// Requested risk per trade, in percent of available capital.
    pub base_risk_pct: f64,
    pub base_leverage: f64,
    pub requested_at: DateTime<Utc>,
    /// Signal quality in `[0, 1]`; positions the base confidence inside the
    /// strategy kind's range. `None` means the midpoint.
    #[serde(default)]
    pub signal_strength: Option<f64>,
    /// Realized PnL when the outcome is already known (e.g. replay).
    /// Otherwise the approved size is held as open exposure until settled.
    #[serde(default)]
    pub realized_pnl: Option<Money>,
}

impl TradeRequest {
    /// Rejects malformed requests. These are caller bugs, not market conditions.
    pub fn validate(&self) -> Result<()> {
        if !self.base_risk_pct.is_finite() || self.base_risk_pct <= 0.0 {
            return Err(Error::InvalidRequest(format!(
                "base_risk_pct must be positive, got {}",
                self.base_risk_pct
            )));
        }
        if !self.base_leverage.is_finite() || self.base_leverage <= 0.0 {
            return Err(Error::InvalidRequest(format!(
                "base_leverage must be positive, got {}",
                self.base_leverage
            )));
        }
        if let Some(strength) = self.signal_strength {
            if !(0.0..=1.0).contains(&strength) {
                return Err(Error::InvalidRequest(format!(
                    "signal_strength must be within [0, 1], got {strength}"
                )));
            }
        }
        Ok(())
    }
}

/// The final answer for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub approved: bool,
    pub position_size: Money,
    pub effective_risk_pct: f64,
    pub effective_leverage: f64,
    pub confidence_score: f64,
    pub volatility_modifier: f64,
    pub scaling_mode: Option<ScalingMode>,
    /// The size was reduced so the post-trade balance stays on the capital floor.
    pub floor_triggered: bool,
    pub block_reason: Option<BlockReason>,
}

impl TradeDecision {
    pub fn rejected(reason: BlockReason) -> Self {
        Self {
            approved: false,
            position_size: Decimal::ZERO,
            effective_risk_pct: 0.0,
            effective_leverage: 0.0,
            confidence_score: 0.0,
            volatility_modifier: 0.0,
            scaling_mode: None,
            floor_triggered: false,
            block_reason: Some(reason),
        }
    }

    /// Attaches the confidence score known at the point of rejection.
    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence_score = score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> TradeRequest {
        TradeRequest {
            strategy: StrategyId::new("scalper"),
            venue: VenueId::new("binance"),
            symbol: Symbol::new("BTCUSDT"),
            side: Side::Long,
            base_risk_pct: 2.0,
            base_leverage: 3.0,
            requested_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            signal_strength: None,
            realized_pnl: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn malformed_requests_are_contract_violations() {
        let mut r = request();
        r.base_risk_pct = -1.0;
        assert!(matches!(r.validate(), Err(Error::InvalidRequest(_))));

        let mut r = request();
        r.base_leverage = 0.0;
        assert!(r.validate().is_err());

        let mut r = request();
        r.base_risk_pct = f64::NAN;
        assert!(r.validate().is_err());

        let mut r = request();
        r.signal_strength = Some(1.5);
        assert!(r.validate().is_err());
    }

    #[test]
    fn cooldown_reason_reads_as_cooldown_active() {
        let reason = BlockReason::CooldownActive {
            lock: LockReason::DailyLossLimit { loss_pct: 6.0 },
            until: Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap(),
        };
        assert!(reason.to_string().starts_with("cooldown active"));
    }

    #[test]
    fn block_reason_serializes_with_kind_tag() {
        let json = serde_json::to_string(&BlockReason::TradingWindowClosed).unwrap();
        assert_eq!(json, r#"{"kind":"trading_window_closed"}"#);
    }
}
