// In crates/app-config/src/types.rs

use crate::{Error, Result};
use analytics::PerformanceSettings;
use audit::AuditSettings;
use core_types::{Money, StrategyConfig, VenueId};
use execution::PaperSettings;
use risk::{
    AdaptiveSettings, CalendarSettings, ConfidenceSettings, GovernorSettings, RiskCaps,
    VolatilitySettings,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    pub capital: CapitalSettings,
    #[serde(default)]
    pub caps: RiskCaps,
    #[serde(default)]
    pub governor: GovernorSettings,
    #[serde(default)]
    pub confidence: ConfidenceSettings,
    #[serde(default)]
    pub adaptive: AdaptiveSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub volatility: VolatilitySettings,
    #[serde(default)]
    pub performance: PerformanceSettings,
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub paper: PaperSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

/// Session capital and the strategy/venue grid it is split across.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CapitalSettings {
    pub initial_capital: Money,
    /// Share of capital held back from trading, in `[0, 1)`.
    #[serde(default = "default_reserve_ratio")]
    pub reserve_ratio: Decimal,
    /// Cells below this balance are topped up on rebalance.
    #[serde(default)]
    pub rebalance_floor: Money,
    #[serde(default)]
    pub rebalance_boost: Money,
    /// Share of each cell moved on rotation, in `[0, 1]`.
    #[serde(default = "default_rotation_fraction")]
    pub rotation_fraction: Decimal,
    pub venues: Vec<VenueId>,
    pub strategies: Vec<StrategyConfig>,
}

fn default_reserve_ratio() -> Decimal {
    Decimal::new(2, 1)
}

fn default_rotation_fraction() -> Decimal {
    Decimal::new(1, 1)
}

impl Settings {
    /// Cross-field checks the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        self.caps.validate()?;
        self.governor.validate()?;
        self.confidence.validate()?;
        self.adaptive.validate()?;
        self.calendar.validate()?;
        self.volatility.validate()?;
        self.capital.validate()?;

        if self.performance.window == 0 {
            return Err(Error::Invalid("performance.window must be positive".into()));
        }
        if self.paper.taker_fee < 0.0 {
            return Err(Error::Invalid("paper.taker_fee must not be negative".into()));
        }
        Ok(())
    }
}

impl CapitalSettings {
    fn validate(&self) -> Result<()> {
        if self.initial_capital < Decimal::ZERO {
            return Err(Error::Invalid("capital.initial_capital must not be negative".into()));
        }
        if self.reserve_ratio < Decimal::ZERO || self.reserve_ratio >= Decimal::ONE {
            return Err(Error::Invalid(format!(
                "capital.reserve_ratio must be within [0, 1), got {}",
                self.reserve_ratio
            )));
        }
        if self.rotation_fraction < Decimal::ZERO || self.rotation_fraction > Decimal::ONE {
            return Err(Error::Invalid(format!(
                "capital.rotation_fraction must be within [0, 1], got {}",
                self.rotation_fraction
            )));
        }
        if self.rebalance_floor < Decimal::ZERO || self.rebalance_boost < Decimal::ZERO {
            return Err(Error::Invalid(
                "capital.rebalance_floor and rebalance_boost must not be negative".into(),
            ));
        }
        if self.venues.is_empty() || self.strategies.is_empty() {
            return Err(Error::Invalid(
                "at least one venue and one strategy must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.strategies.iter().find(|s| !seen.insert(&s.id)) {
            return Err(Error::Invalid(format!("duplicate strategy id {}", dup.id)));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.venues.iter().find(|v| !seen.insert(*v)) {
            return Err(Error::Invalid(format!("duplicate venue {dup}")));
        }
        Ok(())
    }
}
