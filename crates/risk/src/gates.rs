// In crates/risk/src/gates.rs

use crate::Result;
use crate::types::{CalendarSettings, VolatilitySettings};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use core_types::{BlockReason, VolatilityReading};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Weekly trading calendar gate.
#[derive(Debug, Clone)]
pub struct TimeWindowGate {
    settings: CalendarSettings,
}

impl TimeWindowGate {
    pub fn new(settings: CalendarSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let at = minute_of_week(now.weekday(), now.hour(), now.minute());
        let close = minute_of_week(self.settings.close_weekday, self.settings.close_hour, 0);
        let open = minute_of_week(self.settings.open_weekday, self.settings.open_hour, 0);

        let closed = if close == open {
            false
        } else if close < open {
            (close..open).contains(&at)
        } else {
            // The closed stretch wraps past Monday 00:00.
            at >= close || at < open
        };
        !closed
    }
}

fn minute_of_week(day: Weekday, hour: u32, minute: u32) -> u32 {
    day.num_days_from_monday() * MINUTES_PER_DAY + hour * 60 + minute
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub approved: bool,
    pub risk_modifier: f64,
    pub block_reason: Option<BlockReason>,
}

impl GateResult {
    fn approve(risk_modifier: f64) -> Self {
        Self {
            approved: true,
            risk_modifier,
            block_reason: None,
        }
    }

    fn reject(reason: BlockReason) -> Self {
        Self {
            approved: false,
            risk_modifier: 0.0,
            block_reason: Some(reason),
        }
    }
}

/// Classifies an externally supplied volatility reading.
#[derive(Debug, Clone)]
pub struct VolatilityGate {
    settings: VolatilitySettings,
}

impl VolatilityGate {
    pub fn new(settings: VolatilitySettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn evaluate(&self, reading: f64) -> GateResult {
        let s = &self.settings;
        if !reading.is_finite() || reading < s.stagnant_below {
            GateResult::reject(BlockReason::MarketStagnant { reading })
        } else if reading > s.spike_above {
            GateResult::reject(BlockReason::VolatilitySpike { reading })
        } else if reading > s.elevated_above {
            GateResult::approve(s.elevated_modifier)
        } else {
            GateResult::approve(1.0)
        }
    }

    /// A reading is usable if it is not older than the configured age at `now`.
    pub fn is_fresh(&self, reading: &VolatilityReading, now: DateTime<Utc>) -> bool {
        now - reading.timestamp <= Duration::seconds(self.settings.max_reading_age_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        // 2024-03-04 is a Monday.
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn weekend_window_is_closed() {
        let gate = TimeWindowGate::new(CalendarSettings::default()).unwrap();
        assert!(gate.is_open(at(6, 12, 0))); // Wed
        assert!(gate.is_open(at(8, 19, 59))); // Fri before close
        assert!(!gate.is_open(at(8, 20, 0))); // Fri at close
        assert!(!gate.is_open(at(9, 12, 0))); // Sat
        assert!(!gate.is_open(at(10, 19, 59))); // Sun before open
        assert!(gate.is_open(at(10, 20, 0))); // Sun at open
        assert!(gate.is_open(at(11, 0, 0))); // Mon
    }

    #[test]
    fn wrapping_calendar() {
        let gate = TimeWindowGate::new(CalendarSettings {
            close_weekday: Weekday::Sun,
            close_hour: 22,
            open_weekday: Weekday::Mon,
            open_hour: 1,
        })
        .unwrap();
        assert!(!gate.is_open(at(10, 23, 0))); // Sun late
        assert!(!gate.is_open(at(11, 0, 30))); // Mon early
        assert!(gate.is_open(at(11, 1, 0)));
    }

    #[test]
    fn volatility_bands() {
        let gate = VolatilityGate::new(VolatilitySettings::default()).unwrap();

        let quiet = gate.evaluate(0.1);
        assert!(!quiet.approved);
        assert!(matches!(quiet.block_reason, Some(BlockReason::MarketStagnant { .. })));

        let normal = gate.evaluate(1.0);
        assert!(normal.approved);
        assert_eq!(normal.risk_modifier, 1.0);

        let elevated = gate.evaluate(2.5);
        assert!(elevated.approved);
        assert!(elevated.risk_modifier < 1.0);

        let spike = gate.evaluate(4.0);
        assert!(!spike.approved);
        assert!(matches!(spike.block_reason, Some(BlockReason::VolatilitySpike { .. })));
    }

    #[test]
    fn nan_reading_is_not_tradable() {
        let gate = VolatilityGate::new(VolatilitySettings::default()).unwrap();
        assert!(!gate.evaluate(f64::NAN).approved);
    }

    #[test]
    fn stale_reading_detection() {
        let gate = VolatilityGate::new(VolatilitySettings::default()).unwrap();
        let reading = VolatilityReading {
            value: 1.0,
            timestamp: at(6, 12, 0),
        };
        assert!(gate.is_fresh(&reading, at(6, 12, 5)));
        assert!(!gate.is_fresh(&reading, at(6, 12, 6)));
    }
}
