// In crates/risk/src/governor.rs

use crate::Result;
use crate::types::GovernorSettings;
use chrono::{DateTime, Duration, Utc};
use core_types::{BlockReason, LockReason, Money};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Circuit breaker state. Serialized into every audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGovernorState {
    pub locked: bool,
    pub lock_reason: Option<LockReason>,
    /// `None` while locked means only `reset` can unlock.
    pub cooldown_until: Option<DateTime<Utc>>,
    pub locked_at: Option<DateTime<Utc>>,
    pub peak_capital: Money,
    pub daily_pnl: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GovernorStatus {
    Open,
    Blocked(BlockReason),
}

impl GovernorStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, GovernorStatus::Open)
    }
}

pub struct RiskGovernor {
    settings: GovernorSettings,
    state: RiskGovernorState,
}

impl RiskGovernor {
    pub fn new(settings: GovernorSettings, initial_capital: Money) -> Result<Self> {
        settings.validate()?;
        if initial_capital < Decimal::ZERO {
            return Err(core_types::Error::NegativeCapital(initial_capital.to_string()).into());
        }
        Ok(Self {
            settings,
            state: RiskGovernorState {
                locked: false,
                lock_reason: None,
                cooldown_until: None,
                locked_at: None,
                peak_capital: initial_capital,
                daily_pnl: Decimal::ZERO,
            },
        })
    }

    pub fn state(&self) -> &RiskGovernorState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    /// Runs the per-request checks: cooldown expiry, the peak watermark and
    /// the volatility kill switch. While locked, the original lock reason is
    /// reported unchanged until the lock clears.
    pub fn observe(
        &mut self,
        now: DateTime<Utc>,
        total_capital: Money,
        volatility: Option<f64>,
    ) -> GovernorStatus {
        self.expire_cooldown(now);
        self.update_peak(total_capital);

        if !self.state.locked {
            if let Some(reading) = volatility {
                if reading > self.settings.volatility_kill_threshold {
                    let until = now + Duration::minutes(self.settings.volatility_cooldown_mins);
                    self.lock(now, LockReason::VolatilityKill { reading }, Some(until));
                }
            }
        }

        self.status()
    }

    /// Applies realized PnL, then checks the daily loss and drawdown limits.
    ///
    /// A breach while a shorter cooldown lock is active replaces that lock,
    /// and the cooldown never ends earlier than it already would. A manual
    /// lock is left alone.
    pub fn record_pnl(&mut self, now: DateTime<Utc>, pnl: Money, total_capital: Money) {
        self.state.daily_pnl += pnl;
        self.update_peak(total_capital);

        let manual = self.state.locked && self.state.cooldown_until.is_none();
        if manual || self.state.peak_capital <= Decimal::ZERO {
            return;
        }

        let peak = self.state.peak_capital;
        let daily_loss_pct = percent_of(-self.state.daily_pnl, peak);
        let drawdown_pct = percent_of(peak - total_capital, peak);

        let reason = if daily_loss_pct > self.settings.max_daily_loss_pct {
            LockReason::DailyLossLimit { loss_pct: daily_loss_pct }
        } else if drawdown_pct > self.settings.max_drawdown_pct {
            LockReason::DrawdownLimit { drawdown_pct }
        } else {
            return;
        };

        let until = now + Duration::minutes(self.settings.loss_cooldown_mins);
        if !self.state.locked {
            self.lock(now, reason, Some(until));
            return;
        }

        let until = self.state.cooldown_until.map_or(until, |current| current.max(until));
        if self.holds_loss_lock() {
            // Keep the reason reported so far; only the cooldown can grow.
            self.state.cooldown_until = Some(until);
        } else {
            self.lock(now, reason, Some(until));
        }
    }

    /// Locks with no cooldown. Only `reset` lifts it.
    pub fn emergency_lock(&mut self, now: DateTime<Utc>, note: impl Into<String>) {
        self.lock(now, LockReason::Manual { note: note.into() }, None);
    }

    /// Clears any lock and restarts the peak watermark from current capital.
    pub fn reset(&mut self, total_capital: Money) {
        info!(peak = %total_capital, "Risk governor reset");
        self.state.locked = false;
        self.state.lock_reason = None;
        self.state.cooldown_until = None;
        self.state.locked_at = None;
        self.state.peak_capital = total_capital;
    }

    pub fn start_trading_day(&mut self) {
        info!(previous_daily_pnl = %self.state.daily_pnl, "Starting new trading day");
        self.state.daily_pnl = Decimal::ZERO;
    }

    pub fn status(&self) -> GovernorStatus {
        if !self.state.locked {
            return GovernorStatus::Open;
        }
        let lock = match &self.state.lock_reason {
            Some(reason) => reason.clone(),
            None => LockReason::Manual {
                note: String::new(),
            },
        };
        match self.state.cooldown_until {
            Some(until) => GovernorStatus::Blocked(BlockReason::CooldownActive { lock, until }),
            None => GovernorStatus::Blocked(BlockReason::EmergencyLock { lock }),
        }
    }

    fn expire_cooldown(&mut self, now: DateTime<Utc>) {
        if let Some(until) = self.state.cooldown_until {
            if self.state.locked && now >= until {
                info!(reason = ?self.state.lock_reason, "Cooldown expired, trading unlocked");
                self.state.locked = false;
                self.state.lock_reason = None;
                self.state.cooldown_until = None;
                self.state.locked_at = None;
            }
        }
    }

    fn holds_loss_lock(&self) -> bool {
        matches!(
            self.state.lock_reason,
            Some(LockReason::DailyLossLimit { .. } | LockReason::DrawdownLimit { .. })
        )
    }

    /// Restarts the peak watermark without touching any lock, e.g. after the
    /// capital pool was replaced by a reconciled one.
    pub fn rebase_peak(&mut self, total_capital: Money) {
        info!(previous = %self.state.peak_capital, peak = %total_capital, "Peak watermark rebased");
        self.state.peak_capital = total_capital;
    }

    fn update_peak(&mut self, total_capital: Money) {
        if total_capital > self.state.peak_capital {
            self.state.peak_capital = total_capital;
        }
    }

    fn lock(&mut self, now: DateTime<Utc>, reason: LockReason, until: Option<DateTime<Utc>>) {
        warn!(?reason, until = ?until, "Risk governor locked trading");
        self.state.locked = true;
        self.state.lock_reason = Some(reason);
        self.state.cooldown_until = until;
        self.state.locked_at = Some(now);
    }
}

fn percent_of(part: Money, whole: Money) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    (part / whole * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0)
}
