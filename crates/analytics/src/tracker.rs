// In crates/analytics/src/tracker.rs

use crate::types::{PerformanceRecord, PerformanceSettings};
use core_types::{Money, StrategyId};
use std::collections::HashMap;

/// Per-strategy bookkeeping of realized outcomes.
#[derive(Debug, Clone)]
pub struct PerformanceTracker {
    window: usize,
    records: HashMap<StrategyId, PerformanceRecord>,
}

impl PerformanceTracker {
    pub fn new(settings: &PerformanceSettings) -> Self {
        Self {
            window: settings.window.max(1),
            records: HashMap::new(),
        }
    }

    /// Records one realized outcome for `strategy`.
    pub fn record_outcome(&mut self, strategy: &StrategyId, pnl: Money, is_win: bool) {
        let record = self.records.entry(strategy.clone()).or_default();

        record.pnl_history.push_back(pnl);
        while record.pnl_history.len() > self.window {
            record.pnl_history.pop_front();
        }

        if is_win {
            record.wins += 1;
            record.streak = if record.streak > 0 { record.streak + 1 } else { 1 };
        } else {
            record.losses += 1;
            record.streak = if record.streak < 0 { record.streak - 1 } else { -1 };
        }

        tracing::debug!(
            strategy = %strategy,
            %pnl,
            wins = record.wins,
            losses = record.losses,
            streak = record.streak,
            "Recorded strategy outcome."
        );
    }

    /// Snapshot of a strategy's record. Unknown strategies read as empty.
    pub fn stats(&self, strategy: &StrategyId) -> PerformanceRecord {
        self.records.get(strategy).cloned().unwrap_or_default()
    }

    /// Window PnL of every strategy with recorded outcomes.
    pub fn pnl_by_strategy(&self) -> HashMap<StrategyId, Money> {
        self.records
            .iter()
            .map(|(id, record)| (id.clone(), record.window_pnl()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tracker(window: usize) -> PerformanceTracker {
        PerformanceTracker::new(&PerformanceSettings { window })
    }

    #[test]
    fn unknown_strategy_is_zero_record() {
        let t = tracker(10);
        let record = t.stats(&StrategyId::new("ghost"));
        assert_eq!(record, PerformanceRecord::default());
        assert_eq!(record.win_rate(), 0.0);
    }

    #[test]
    fn counts_and_win_rate() {
        let mut t = tracker(10);
        let id = StrategyId::new("s1");
        t.record_outcome(&id, dec!(5), true);
        t.record_outcome(&id, dec!(3), true);
        t.record_outcome(&id, dec!(-2), false);

        let record = t.stats(&id);
        assert_eq!(record.wins, 2);
        assert_eq!(record.losses, 1);
        assert!((record.win_rate() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(record.window_pnl(), dec!(6));
    }

    #[test]
    fn streak_resets_magnitude_on_sign_flip() {
        let mut t = tracker(10);
        let id = StrategyId::new("s1");
        t.record_outcome(&id, dec!(1), true);
        t.record_outcome(&id, dec!(1), true);
        t.record_outcome(&id, dec!(1), true);
        assert_eq!(t.stats(&id).streak, 3);

        t.record_outcome(&id, dec!(-1), false);
        assert_eq!(t.stats(&id).streak, -1);
        t.record_outcome(&id, dec!(-1), false);
        assert_eq!(t.stats(&id).streak, -2);

        t.record_outcome(&id, dec!(1), true);
        assert_eq!(t.stats(&id).streak, 1);
    }

    #[test]
    fn history_window_drops_oldest() {
        let mut t = tracker(3);
        let id = StrategyId::new("s1");
        for pnl in [dec!(1), dec!(2), dec!(3), dec!(4)] {
            t.record_outcome(&id, pnl, true);
        }
        let record = t.stats(&id);
        assert_eq!(record.pnl_history.len(), 3);
        assert_eq!(record.pnl_history.front(), Some(&dec!(2)));
        // Counters are lifetime, not windowed.
        assert_eq!(record.wins, 4);
    }

    #[test]
    fn stats_is_a_copy() {
        let mut t = tracker(10);
        let id = StrategyId::new("s1");
        t.record_outcome(&id, dec!(1), true);
        let before = t.stats(&id);
        t.record_outcome(&id, dec!(-1), false);
        assert_eq!(before.total_trades(), 1);
        assert_eq!(t.stats(&id).total_trades(), 2);
    }
}
