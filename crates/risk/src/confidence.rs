// In crates/risk/src/confidence.rs

use crate::Result;
use crate::types::ConfidenceSettings;
use analytics::PerformanceRecord;
use core_types::{BlockReason, StrategyKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Score in `[0, 100]`.
    pub score: f64,
    pub approved: bool,
    /// Risk multiplier for approved scores; zero when rejected.
    pub modifier: f64,
    pub threshold: f64,
}

impl ConfidenceResult {
    /// The rejection for a score under the threshold, if any.
    pub fn block_reason(&self) -> Option<BlockReason> {
        (!self.approved).then_some(BlockReason::ConfidenceBelowThreshold {
            score: self.score,
            threshold: self.threshold,
        })
    }
}

/// Turns a strategy's kind and track record into a tiered confidence score.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    settings: ConfidenceSettings,
}

impl ConfidenceScorer {
    pub fn new(mut settings: ConfidenceSettings) -> Result<Self> {
        settings.validate()?;
        settings
            .tiers
            .sort_by(|a, b| a.min_score.total_cmp(&b.min_score));
        Ok(Self { settings })
    }

    pub fn threshold(&self) -> f64 {
        self.settings.reject_below
    }

    /// Scores a strategy. `signal_strength` in `[0, 1]` picks the base score
    /// inside the kind's range; `None` uses the midpoint.
    pub fn score(
        &self,
        kind: StrategyKind,
        perf: &PerformanceRecord,
        signal_strength: Option<f64>,
    ) -> ConfidenceResult {
        let range = self.settings.range_for(kind);
        let strength = signal_strength.unwrap_or(0.5).clamp(0.0, 1.0);
        let mut score = range.min + strength * (range.max - range.min);

        if perf.total_trades() >= self.settings.min_samples {
            let win_rate = perf.win_rate();
            if win_rate > self.settings.strong_win_rate {
                score += self.settings.strong_bonus;
            } else if win_rate < self.settings.weak_win_rate {
                score -= self.settings.weak_penalty;
            }
        }
        let score = score.clamp(0.0, 100.0);

        if score < self.settings.reject_below {
            return ConfidenceResult {
                score,
                approved: false,
                modifier: 0.0,
                threshold: self.settings.reject_below,
            };
        }

        // Tiers are sorted ascending; the highest tier reached wins. A score
        // under the first tier still passed the threshold, so it gets the
        // lowest modifier.
        let modifier = self
            .settings
            .tiers
            .iter()
            .rev()
            .find(|tier| score >= tier.min_score)
            .or_else(|| self.settings.tiers.first())
            .map(|tier| tier.modifier)
            .unwrap_or(1.0)
            .min(self.settings.max_modifier);

        ConfidenceResult {
            score,
            approved: true,
            modifier,
            threshold: self.settings.reject_below,
        }
    }
}
