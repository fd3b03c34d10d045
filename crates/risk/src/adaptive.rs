// In crates/risk/src/adaptive.rs

use crate::Result;
use crate::types::AdaptiveSettings;
use analytics::PerformanceRecord;
use core_types::ScalingMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveResult {
    /// Scaled risk per trade, in percent, already capped.
    pub risk_pct: f64,
    /// Scaled leverage, already capped.
    pub leverage: f64,
    /// Ratio of the scaled (uncapped) risk to the base risk.
    pub risk_multiplier: f64,
    pub mode: ScalingMode,
}

/// Scales risk and leverage with a strategy's recent win rate.
#[derive(Debug, Clone)]
pub struct AdaptiveScaler {
    settings: AdaptiveSettings,
}

impl AdaptiveScaler {
    pub fn new(settings: AdaptiveSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn mode_for(&self, perf: &PerformanceRecord) -> ScalingMode {
        if perf.total_trades() < self.settings.min_samples {
            return ScalingMode::Stable;
        }
        let win_rate = perf.win_rate();
        if win_rate < self.settings.defensive_below {
            ScalingMode::Defensive
        } else if win_rate >= self.settings.aggressive_from {
            ScalingMode::Aggressive
        } else {
            ScalingMode::Stable
        }
    }

    /// Output never exceeds `max_risk` / `max_leverage`, whatever the mode.
    pub fn scale(
        &self,
        base_risk: f64,
        base_leverage: f64,
        perf: &PerformanceRecord,
        max_risk: f64,
        max_leverage: f64,
    ) -> AdaptiveResult {
        let s = &self.settings;
        let mode = self.mode_for(perf);

        let (risk, leverage) = match mode {
            ScalingMode::Defensive => (
                (base_risk * s.defensive_risk_multiplier).max(s.risk_floor),
                (base_leverage * s.defensive_leverage_multiplier).max(s.leverage_floor),
            ),
            ScalingMode::Stable => (base_risk, base_leverage),
            ScalingMode::Aggressive => (
                base_risk * s.aggressive_risk_multiplier,
                base_leverage * s.aggressive_leverage_multiplier,
            ),
        };

        let risk_multiplier = if base_risk > 0.0 { risk / base_risk } else { 1.0 };

        AdaptiveResult {
            risk_pct: risk.min(max_risk),
            leverage: leverage.min(max_leverage),
            risk_multiplier,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(wins: u64, losses: u64) -> PerformanceRecord {
        PerformanceRecord {
            wins,
            losses,
            ..Default::default()
        }
    }

    fn scaler() -> AdaptiveScaler {
        AdaptiveScaler::new(AdaptiveSettings::default()).unwrap()
    }

    #[test]
    fn neutral_until_enough_history() {
        let r = scaler().scale(2.0, 3.0, &record(4, 0), 10.0, 10.0);
        assert_eq!(r.mode, ScalingMode::Stable);
        assert_eq!(r.risk_pct, 2.0);
        assert_eq!(r.leverage, 3.0);
        assert_eq!(r.risk_multiplier, 1.0);
    }

    #[test]
    fn three_wins_two_losses_is_aggressive_and_capped() {
        // win_rate == 0.6 with exactly 5 samples meets both thresholds.
        let r = scaler().scale(2.0, 5.0, &record(3, 2), 2.2, 5.5);
        assert_eq!(r.mode, ScalingMode::Aggressive);
        assert_eq!(r.risk_pct, 2.2);
        assert_eq!(r.leverage, 5.5);
        assert!((r.risk_multiplier - 1.25).abs() < 1e-12);
    }

    #[test]
    fn aggressive_below_caps_scales_fully() {
        let r = scaler().scale(2.0, 2.0, &record(8, 2), 10.0, 10.0);
        assert!((r.risk_pct - 2.5).abs() < 1e-12);
        assert!((r.leverage - 2.4).abs() < 1e-12);
    }

    #[test]
    fn defensive_respects_floors() {
        let r = scaler().scale(0.1, 1.2, &record(1, 4), 10.0, 10.0);
        assert_eq!(r.mode, ScalingMode::Defensive);
        assert_eq!(r.risk_pct, 0.1);
        assert_eq!(r.leverage, 1.0);

        let r = scaler().scale(2.0, 4.0, &record(1, 4), 10.0, 10.0);
        assert!((r.risk_pct - 1.2).abs() < 1e-12);
        assert!((r.leverage - 2.8).abs() < 1e-12);
    }

    #[test]
    fn stable_band_is_unchanged_but_still_capped() {
        let r = scaler().scale(4.0, 8.0, &record(5, 5), 3.0, 5.0);
        assert_eq!(r.mode, ScalingMode::Stable);
        assert_eq!(r.risk_pct, 3.0);
        assert_eq!(r.leverage, 5.0);
    }
}
