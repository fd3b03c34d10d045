// In crates/risk/src/sizer.rs

use crate::adaptive::AdaptiveResult;
use crate::confidence::ConfidenceResult;
use crate::types::RiskCaps;
use crate::{Error, Result};
use core_types::{BlockReason, Money, TradeDecision, TradeRequest};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;

/// Money amounts are kept to this many decimal places.
const SIZE_SCALE: u32 = 8;

/// Combines every upstream modifier into a bounded position size.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    caps: RiskCaps,
}

impl PositionSizer {
    pub fn new(caps: RiskCaps) -> Result<Self> {
        caps.validate()?;
        Ok(Self { caps })
    }

    pub fn caps(&self) -> &RiskCaps {
        &self.caps
    }

    pub fn size(
        &self,
        request: &TradeRequest,
        confidence: &ConfidenceResult,
        adaptive: &AdaptiveResult,
        volatility_modifier: f64,
        capital_available: Money,
    ) -> Result<TradeDecision> {
        request.validate()?;
        if capital_available < Decimal::ZERO {
            return Err(core_types::Error::NegativeCapital(capital_available.to_string()).into());
        }
        if !(volatility_modifier >= 0.0 && volatility_modifier.is_finite()) {
            return Err(Error::InvalidParameters(format!(
                "volatility modifier must be a non-negative number, got {volatility_modifier}"
            )));
        }

        if let Some(reason) = confidence.block_reason() {
            return Ok(TradeDecision::rejected(reason).with_confidence(confidence.score));
        }

        let caps = &self.caps;
        let effective_risk_pct = (request.base_risk_pct.min(caps.max_risk_pct)
            * confidence.modifier
            * volatility_modifier
            * adaptive.risk_multiplier)
            .min(caps.max_risk_pct);
        let effective_leverage = adaptive.leverage.min(caps.max_leverage);

        let reject = |reason: BlockReason| {
            let mut decision = TradeDecision::rejected(reason).with_confidence(confidence.score);
            decision.effective_risk_pct = effective_risk_pct;
            decision.effective_leverage = effective_leverage;
            decision.volatility_modifier = volatility_modifier;
            decision.scaling_mode = Some(adaptive.mode);
            decision
        };

        if capital_available <= caps.capital_floor {
            return Ok(reject(BlockReason::CapitalFloorReached {
                available: capital_available,
                floor: caps.capital_floor,
            }));
        }

        let fraction = Decimal::from_f64(effective_risk_pct * effective_leverage / 100.0)
            .ok_or_else(|| {
                Error::InvalidParameters(format!(
                    "position fraction is not representable: risk {effective_risk_pct}, leverage {effective_leverage}"
                ))
            })?;
        let mut position_size = (capital_available * fraction).round_dp(SIZE_SCALE);

        let implied_pct = (position_size / capital_available * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(f64::INFINITY);
        if implied_pct > caps.max_drawdown_pct {
            debug!(
                strategy = %request.strategy,
                implied_pct,
                max_pct = caps.max_drawdown_pct,
                "Position would breach the drawdown cap"
            );
            return Ok(reject(BlockReason::DrawdownCapExceeded {
                implied_pct,
                max_pct: caps.max_drawdown_pct,
            }));
        }

        let mut floor_triggered = false;
        if capital_available - position_size < caps.capital_floor {
            position_size = capital_available - caps.capital_floor;
            floor_triggered = true;
            debug!(
                strategy = %request.strategy,
                size = %position_size,
                "Position clamped to the capital floor"
            );
        }

        Ok(TradeDecision {
            approved: true,
            position_size,
            effective_risk_pct,
            effective_leverage,
            confidence_score: confidence.score,
            volatility_modifier,
            scaling_mode: Some(adaptive.mode),
            floor_triggered,
            block_reason: None,
        })
    }

    /// Rejects a size that would push a cell's open exposure past its share of
    /// the allocation.
    pub fn check_exposure(
        &self,
        size: Money,
        allocation: Money,
        open_exposure: Money,
    ) -> Option<BlockReason> {
        let share = Decimal::from_f64(self.caps.max_exposure_pct / 100.0).unwrap_or(Decimal::ONE);
        let limit = allocation * share;
        if open_exposure + size > limit {
            Some(BlockReason::ExposureCapExceeded {
                requested: size,
                available: (limit - open_exposure).max(Decimal::ZERO),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_types::{ScalingMode, Side, StrategyId, Symbol, VenueId};
    use rust_decimal_macros::dec;

    fn request(risk: f64, leverage: f64) -> TradeRequest {
        TradeRequest {
            strategy: StrategyId::new("scalper"),
            venue: VenueId::new("binance"),
            symbol: Symbol::new("BTCUSDT"),
            side: Side::Long,
            base_risk_pct: risk,
            base_leverage: leverage,
            requested_at: Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap(),
            signal_strength: None,
            realized_pnl: None,
        }
    }

    fn confidence(modifier: f64) -> ConfidenceResult {
        ConfidenceResult {
            score: 70.0,
            approved: true,
            modifier,
            threshold: 45.0,
        }
    }

    fn stable(risk: f64, leverage: f64) -> AdaptiveResult {
        AdaptiveResult {
            risk_pct: risk,
            leverage,
            risk_multiplier: 1.0,
            mode: ScalingMode::Stable,
        }
    }

    fn sizer() -> PositionSizer {
        PositionSizer::new(RiskCaps {
            max_risk_pct: 3.0,
            max_leverage: 5.0,
            max_drawdown_pct: 15.0,
            capital_floor: dec!(50),
            max_exposure_pct: 100.0,
        })
        .unwrap()
    }

    #[test]
    fn sizes_from_risk_and_leverage() {
        let d = sizer()
            .size(&request(2.0, 3.0), &confidence(1.0), &stable(2.0, 3.0), 1.0, dec!(200))
            .unwrap();
        assert!(d.approved);
        assert_eq!(d.position_size, dec!(12));
        assert_eq!(d.effective_risk_pct, 2.0);
        assert_eq!(d.effective_leverage, 3.0);
        assert!(!d.floor_triggered);
    }

    #[test]
    fn caps_are_applied_last() {
        let adaptive = AdaptiveResult {
            risk_pct: 3.0,
            leverage: 5.0,
            risk_multiplier: 1.25,
            mode: ScalingMode::Aggressive,
        };
        let d = sizer()
            .size(&request(9.0, 9.0), &confidence(1.1), &adaptive, 1.0, dec!(200))
            .unwrap();
        assert_eq!(d.effective_risk_pct, 3.0);
        assert_eq!(d.effective_leverage, 5.0);
        assert_eq!(d.position_size, dec!(30));
    }

    #[test]
    fn drawdown_cap_rejects() {
        let sizer = PositionSizer::new(RiskCaps {
            max_drawdown_pct: 5.0,
            ..RiskCaps::default()
        })
        .unwrap();
        let d = sizer
            .size(&request(2.0, 4.0), &confidence(1.0), &stable(2.0, 4.0), 1.0, dec!(200))
            .unwrap();
        assert!(!d.approved);
        assert!(matches!(
            d.block_reason,
            Some(BlockReason::DrawdownCapExceeded { .. })
        ));
        assert_eq!(d.position_size, Decimal::ZERO);
    }

    #[test]
    fn floor_clamps_instead_of_blocking() {
        let d = sizer()
            .size(&request(3.0, 5.0), &confidence(1.0), &stable(3.0, 5.0), 1.0, dec!(55))
            .unwrap();
        assert!(d.approved);
        assert!(d.floor_triggered);
        assert_eq!(d.position_size, dec!(5));
    }

    #[test]
    fn no_capital_above_floor_rejects() {
        let d = sizer()
            .size(&request(2.0, 3.0), &confidence(1.0), &stable(2.0, 3.0), 1.0, dec!(50))
            .unwrap();
        assert!(matches!(
            d.block_reason,
            Some(BlockReason::CapitalFloorReached { .. })
        ));
    }

    #[test]
    fn contract_violations_are_errors() {
        let s = sizer();
        assert!(s
            .size(&request(2.0, 3.0), &confidence(1.0), &stable(2.0, 3.0), 1.0, dec!(-1))
            .is_err());
        assert!(s
            .size(&request(-2.0, 3.0), &confidence(1.0), &stable(2.0, 3.0), 1.0, dec!(100))
            .is_err());
        assert!(s
            .size(&request(2.0, 3.0), &confidence(1.0), &stable(2.0, 3.0), f64::NAN, dec!(100))
            .is_err());
    }

    #[test]
    fn exposure_check() {
        let s = sizer();
        assert!(s.check_exposure(dec!(50), dec!(200), dec!(150)).is_none());
        assert!(matches!(
            s.check_exposure(dec!(51), dec!(200), dec!(150)),
            Some(BlockReason::ExposureCapExceeded { available, .. }) if available == dec!(50)
        ));
    }
}
