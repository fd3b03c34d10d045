// In crates/analytics/src/engine.rs

use core_types::Money;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Largest peak-to-trough decline of the cumulative PnL curve, as an absolute amount.
///
/// The curve starts at zero, so a first trade that loses counts as drawdown.
pub fn max_drawdown(pnl: impl IntoIterator<Item = Money>) -> Money {
    let mut equity = Decimal::ZERO;
    let mut peak_equity = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;
    for value in pnl {
        equity += value;
        peak_equity = peak_equity.max(equity);
        max_drawdown = max_drawdown.max(peak_equity - equity);
    }
    max_drawdown
}

/// Mean PnL per trade. Zero for an empty window.
pub fn expectancy(pnl: &[Money]) -> Money {
    if pnl.is_empty() {
        return Decimal::ZERO;
    }
    pnl.iter().copied().sum::<Decimal>() / Decimal::from(pnl.len())
}

/// Simplified, non-annualized Sharpe: mean return over its standard deviation.
///
/// Returns 0.0 with fewer than two samples or a flat series.
pub fn sharpe_proxy(pnl: &[Money]) -> f64 {
    if pnl.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = pnl.iter().map(|p| p.to_f64().unwrap_or(0.0)).collect();
    let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let std_dev = {
        let variance = returns
            .iter()
            .map(|r| (*r - mean_return).powi(2))
            .sum::<f64>()
            / returns.len() as f64;
        variance.sqrt()
    };
    if std_dev > 0.0 {
        mean_return / std_dev
    } else {
        0.0
    }
}
