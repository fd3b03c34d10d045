// In crates/analytics/src/types.rs

use crate::engine;
use core_types::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerformanceSettings {
    /// Number of most recent outcomes kept per strategy.
    #[serde(default = "default_window")]
    pub window: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

fn default_window() -> usize {
    200
}

/// Rolling outcome statistics for a single strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub wins: u64,
    pub losses: u64,
    /// Most recent realized PnL values, oldest first.
    pub pnl_history: VecDeque<Money>,
    /// Positive while winning, negative while losing.
    pub streak: i64,
}

impl PerformanceRecord {
    pub fn total_trades(&self) -> u64 {
        self.wins + self.losses
    }

    /// Fraction of outcomes that were wins, in `[0, 1]`. Zero with no history.
    pub fn win_rate(&self) -> f64 {
        let total = self.total_trades();
        if total == 0 {
            return 0.0;
        }
        self.wins as f64 / total as f64
    }

    pub fn expectancy(&self) -> Money {
        let window: Vec<Money> = self.pnl_history.iter().copied().collect();
        engine::expectancy(&window)
    }

    pub fn max_drawdown(&self) -> Money {
        engine::max_drawdown(self.pnl_history.iter().copied())
    }

    pub fn sharpe_proxy(&self) -> f64 {
        let window: Vec<Money> = self.pnl_history.iter().copied().collect();
        engine::sharpe_proxy(&window)
    }

    /// Sum of PnL over the retained window.
    pub fn window_pnl(&self) -> Money {
        self.pnl_history.iter().copied().sum::<Decimal>()
    }
}
