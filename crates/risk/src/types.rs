// In crates/risk/src/types.rs

use crate::{Error, Result};
use chrono::Weekday;
use core_types::{Money, StrategyKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Human-controlled ceilings that no upstream modifier may exceed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RiskCaps {
    /// Maximum risk per trade, in percent.
    pub max_risk_pct: f64,
    pub max_leverage: f64,
    /// Maximum drawdown a single trade may imply on its allocation, in percent.
    pub max_drawdown_pct: f64,
    /// Minimum balance an allocation may be left with after a trade.
    pub capital_floor: Money,
    /// Open exposure of an allocation, in percent of that allocation.
    #[serde(default = "default_max_exposure_pct")]
    pub max_exposure_pct: f64,
}

impl Default for RiskCaps {
    fn default() -> Self {
        Self {
            max_risk_pct: 3.0,
            max_leverage: 5.0,
            max_drawdown_pct: 15.0,
            capital_floor: Decimal::ZERO,
            max_exposure_pct: default_max_exposure_pct(),
        }
    }
}

fn default_max_exposure_pct() -> f64 {
    100.0
}

impl RiskCaps {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_risk_pct > 0.0 && self.max_risk_pct <= 100.0) {
            return Err(Error::InvalidParameters(format!(
                "max_risk_pct must be within (0, 100], got {}",
                self.max_risk_pct
            )));
        }
        if !(self.max_leverage >= 1.0 && self.max_leverage.is_finite()) {
            return Err(Error::InvalidParameters(format!(
                "max_leverage must be at least 1, got {}",
                self.max_leverage
            )));
        }
        if !(self.max_drawdown_pct > 0.0 && self.max_drawdown_pct <= 100.0) {
            return Err(Error::InvalidParameters(format!(
                "max_drawdown_pct must be within (0, 100], got {}",
                self.max_drawdown_pct
            )));
        }
        if self.capital_floor < Decimal::ZERO {
            return Err(Error::InvalidParameters(
                "capital_floor must not be negative".to_string(),
            ));
        }
        if !(self.max_exposure_pct > 0.0 && self.max_exposure_pct.is_finite()) {
            return Err(Error::InvalidParameters(format!(
                "max_exposure_pct must be positive, got {}",
                self.max_exposure_pct
            )));
        }
        Ok(())
    }
}

/// Inclusive confidence range a strategy kind starts from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

/// Approved scores at or above `min_score` scale risk by `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ConfidenceTier {
    pub min_score: f64,
    pub modifier: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfidenceSettings {
    pub scalping_range: ScoreRange,
    pub session_range: ScoreRange,
    /// Outcomes needed before recent performance adjusts the score.
    pub min_samples: u64,
    pub strong_win_rate: f64,
    pub strong_bonus: f64,
    pub weak_win_rate: f64,
    pub weak_penalty: f64,
    pub reject_below: f64,
    pub tiers: Vec<ConfidenceTier>,
    /// Upper bound on any tier modifier.
    pub max_modifier: f64,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            scalping_range: ScoreRange { min: 55.0, max: 75.0 },
            session_range: ScoreRange { min: 60.0, max: 80.0 },
            min_samples: 5,
            strong_win_rate: 0.6,
            strong_bonus: 5.0,
            weak_win_rate: 0.4,
            weak_penalty: 7.0,
            reject_below: 45.0,
            tiers: vec![
                ConfidenceTier { min_score: 45.0, modifier: 0.85 },
                ConfidenceTier { min_score: 65.0, modifier: 1.0 },
                ConfidenceTier { min_score: 85.0, modifier: 1.1 },
            ],
            max_modifier: 1.1,
        }
    }
}

impl ConfidenceSettings {
    pub fn range_for(&self, kind: StrategyKind) -> ScoreRange {
        match kind {
            StrategyKind::Scalping => self.scalping_range,
            StrategyKind::Session => self.session_range,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("scalping_range", self.scalping_range),
            ("session_range", self.session_range),
        ] {
            if !(0.0 <= range.min && range.min <= range.max && range.max <= 100.0) {
                return Err(Error::InvalidParameters(format!(
                    "{name} must satisfy 0 <= min <= max <= 100"
                )));
            }
        }
        if self.weak_win_rate > self.strong_win_rate {
            return Err(Error::InvalidParameters(
                "weak_win_rate must not exceed strong_win_rate".to_string(),
            ));
        }
        if self.tiers.is_empty() {
            return Err(Error::InvalidParameters(
                "at least one confidence tier is required".to_string(),
            ));
        }
        if !(self.max_modifier > 0.0 && self.max_modifier.is_finite()) {
            return Err(Error::InvalidParameters(
                "max_modifier must be positive".to_string(),
            ));
        }
        for tier in &self.tiers {
            if !(tier.modifier > 0.0 && tier.modifier <= self.max_modifier) {
                return Err(Error::InvalidParameters(format!(
                    "tier modifier {} must be within (0, {}]",
                    tier.modifier, self.max_modifier
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    pub min_samples: u64,
    /// Win rates below this scale defensively.
    pub defensive_below: f64,
    /// Win rates at or above this scale aggressively.
    pub aggressive_from: f64,
    pub defensive_risk_multiplier: f64,
    pub defensive_leverage_multiplier: f64,
    pub risk_floor: f64,
    pub leverage_floor: f64,
    pub aggressive_risk_multiplier: f64,
    pub aggressive_leverage_multiplier: f64,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            min_samples: 5,
            defensive_below: 0.4,
            aggressive_from: 0.6,
            defensive_risk_multiplier: 0.6,
            defensive_leverage_multiplier: 0.7,
            risk_floor: 0.1,
            leverage_floor: 1.0,
            aggressive_risk_multiplier: 1.25,
            aggressive_leverage_multiplier: 1.2,
        }
    }
}

impl AdaptiveSettings {
    pub fn validate(&self) -> Result<()> {
        if self.defensive_below > self.aggressive_from {
            return Err(Error::InvalidParameters(
                "defensive_below must not exceed aggressive_from".to_string(),
            ));
        }
        let multipliers = [
            self.defensive_risk_multiplier,
            self.defensive_leverage_multiplier,
            self.aggressive_risk_multiplier,
            self.aggressive_leverage_multiplier,
        ];
        if multipliers.iter().any(|m| !(*m > 0.0 && m.is_finite())) {
            return Err(Error::InvalidParameters(
                "adaptive multipliers must be positive".to_string(),
            ));
        }
        if self.risk_floor < 0.0 || self.leverage_floor < 0.0 {
            return Err(Error::InvalidParameters(
                "adaptive floors must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weekly trading calendar, in UTC. Trading is closed from
/// `close_weekday close_hour:00` until `open_weekday open_hour:00`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub close_weekday: Weekday,
    pub close_hour: u32,
    pub open_weekday: Weekday,
    pub open_hour: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            close_weekday: Weekday::Fri,
            close_hour: 20,
            open_weekday: Weekday::Sun,
            open_hour: 20,
        }
    }
}

impl CalendarSettings {
    pub fn validate(&self) -> Result<()> {
        if self.close_hour > 23 || self.open_hour > 23 {
            return Err(Error::InvalidParameters(
                "calendar hours must be within 0..=23".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VolatilitySettings {
    /// Readings below this mean the market is too quiet to trade.
    pub stagnant_below: f64,
    /// Readings above this are tradable at reduced risk.
    pub elevated_above: f64,
    /// Readings above this are rejected outright.
    pub spike_above: f64,
    pub elevated_modifier: f64,
    /// Readings older than this, relative to the request, are ignored.
    pub max_reading_age_secs: i64,
}

impl Default for VolatilitySettings {
    fn default() -> Self {
        Self {
            stagnant_below: 0.2,
            elevated_above: 2.0,
            spike_above: 3.5,
            elevated_modifier: 0.75,
            max_reading_age_secs: 300,
        }
    }
}

impl VolatilitySettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.stagnant_below <= self.elevated_above && self.elevated_above <= self.spike_above)
        {
            return Err(Error::InvalidParameters(
                "volatility thresholds must satisfy stagnant_below <= elevated_above <= spike_above"
                    .to_string(),
            ));
        }
        if !(self.elevated_modifier > 0.0 && self.elevated_modifier <= 1.0) {
            return Err(Error::InvalidParameters(
                "elevated_modifier must be within (0, 1]".to_string(),
            ));
        }
        if self.max_reading_age_secs < 0 {
            return Err(Error::InvalidParameters(
                "max_reading_age_secs must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GovernorSettings {
    /// Daily loss, in percent of peak capital, that locks trading.
    pub max_daily_loss_pct: f64,
    /// Drawdown from peak capital, in percent, that locks trading.
    pub max_drawdown_pct: f64,
    /// A volatility reading above this locks trading.
    pub volatility_kill_threshold: f64,
    pub loss_cooldown_mins: i64,
    pub volatility_cooldown_mins: i64,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: 5.0,
            max_drawdown_pct: 20.0,
            volatility_kill_threshold: 5.0,
            loss_cooldown_mins: 30,
            volatility_cooldown_mins: 15,
        }
    }
}

impl GovernorSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_daily_loss_pct > 0.0 && self.max_drawdown_pct > 0.0) {
            return Err(Error::InvalidParameters(
                "governor loss limits must be positive".to_string(),
            ));
        }
        if self.loss_cooldown_mins < 0 || self.volatility_cooldown_mins < 0 {
            return Err(Error::InvalidParameters(
                "cooldowns must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
