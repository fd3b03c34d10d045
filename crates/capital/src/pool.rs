// In crates/capital/src/pool.rs

use crate::types::{CapitalPoolSnapshot, CellAllocation, RebalanceReport, RotationReport};
use crate::{Error, Result};
use core_types::{Money, StrategyId, VenueId};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Money amounts are kept to this many decimal places.
const MONEY_SCALE: u32 = 8;

pub type CellKey = (StrategyId, VenueId);

/// Total capital split between a reserve and per-(strategy, venue) cells.
///
/// `total_capital == reserve + sum(allocations)` holds after every operation.
/// Amounts are decimals, so the identity is exact.
#[derive(Debug, Clone)]
pub struct CapitalPool {
    total_capital: Money,
    reserve: Money,
    allocations: BTreeMap<CellKey, Money>,
    open_exposure: BTreeMap<CellKey, Money>,
}

fn round_down(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

impl CapitalPool {
    /// Splits `total * (1 - reserve_ratio)` evenly over every strategy/venue
    /// pair. Whatever the split leaves over stays in the reserve.
    pub fn allocate(
        total: Money,
        strategies: &[StrategyId],
        venues: &[VenueId],
        reserve_ratio: Decimal,
    ) -> Result<Self> {
        if total < Decimal::ZERO {
            return Err(core_types::Error::NegativeCapital(total.to_string()).into());
        }
        if strategies.is_empty() || venues.is_empty() {
            return Err(Error::InvalidInput(
                "at least one strategy and one venue are required".to_string(),
            ));
        }
        if reserve_ratio < Decimal::ZERO || reserve_ratio >= Decimal::ONE {
            return Err(Error::InvalidInput(format!(
                "reserve ratio must be within [0, 1), got {reserve_ratio}"
            )));
        }

        let keys: BTreeSet<CellKey> = strategies
            .iter()
            .flat_map(|s| venues.iter().map(move |v| (s.clone(), v.clone())))
            .collect();
        let per_cell =
            round_down(total * (Decimal::ONE - reserve_ratio) / Decimal::from(keys.len()));

        let allocations: BTreeMap<CellKey, Money> =
            keys.into_iter().map(|key| (key, per_cell)).collect();
        let allocated: Money = allocations.values().copied().sum();

        info!(
            %total,
            reserve = %(total - allocated),
            cells = allocations.len(),
            %per_cell,
            "Capital allocated"
        );

        Ok(Self {
            total_capital: total,
            reserve: total - allocated,
            allocations,
            open_exposure: BTreeMap::new(),
        })
    }

    /// Rebuilds a pool from a snapshot as-is. Call `verify` before trusting it.
    pub fn from_snapshot(snapshot: &CapitalPoolSnapshot) -> Self {
        let mut allocations = BTreeMap::new();
        let mut open_exposure = BTreeMap::new();
        for cell in &snapshot.cells {
            let key = (cell.strategy.clone(), cell.venue.clone());
            allocations.insert(key.clone(), cell.allocation);
            if !cell.open_exposure.is_zero() {
                open_exposure.insert(key, cell.open_exposure);
            }
        }
        Self {
            total_capital: snapshot.total_capital,
            reserve: snapshot.reserve,
            allocations,
            open_exposure,
        }
    }

    pub fn total_capital(&self) -> Money {
        self.total_capital
    }

    pub fn reserve(&self) -> Money {
        self.reserve
    }

    pub fn contains(&self, strategy: &StrategyId, venue: &VenueId) -> bool {
        self.allocations
            .contains_key(&(strategy.clone(), venue.clone()))
    }

    pub fn allocation(&self, strategy: &StrategyId, venue: &VenueId) -> Result<Money> {
        let key = (strategy.clone(), venue.clone());
        self.allocations
            .get(&key)
            .copied()
            .ok_or_else(|| unknown(&key))
    }

    pub fn open_exposure(&self, strategy: &StrategyId, venue: &VenueId) -> Money {
        self.open_exposure
            .get(&(strategy.clone(), venue.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Allocation not already tied up in open positions.
    pub fn capital_available(&self, strategy: &StrategyId, venue: &VenueId) -> Result<Money> {
        let allocation = self.allocation(strategy, venue)?;
        Ok((allocation - self.open_exposure(strategy, venue)).max(Decimal::ZERO))
    }

    /// Tops up every cell below `floor` by `boost`, in key order, for as long
    /// as the reserve can pay for it.
    pub fn rebalance(&mut self, floor: Money, boost: Money) -> Result<RebalanceReport> {
        if boost < Decimal::ZERO || floor < Decimal::ZERO {
            return Err(Error::InvalidInput(
                "rebalance floor and boost must not be negative".to_string(),
            ));
        }

        let mut report = RebalanceReport::default();
        for (key, allocation) in self.allocations.iter_mut() {
            if *allocation >= floor {
                continue;
            }
            if self.reserve >= boost {
                self.reserve -= boost;
                *allocation += boost;
                report.moved += boost;
                report.boosted.push(key.clone());
            } else {
                report.unfunded.push(key.clone());
            }
        }

        if !report.unfunded.is_empty() {
            warn!(
                unfunded = report.unfunded.len(),
                reserve = %self.reserve,
                "Reserve exhausted during rebalance"
            );
        }
        info!(moved = %report.moved, boosted = report.boosted.len(), "Rebalanced capital");
        Ok(report)
    }

    /// Within each venue, takes `fraction` of every strategy's cell and hands
    /// the pot out in proportion to how far each strategy's PnL sits above the
    /// worst performer. Strategies missing from `pnl_by_strategy` count as
    /// zero PnL. A venue where every strategy performed the same is left alone.
    pub fn rotate(
        &mut self,
        pnl_by_strategy: &HashMap<StrategyId, Money>,
        fraction: Decimal,
    ) -> Result<RotationReport> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(Error::InvalidInput(format!(
                "rotation fraction must be within [0, 1], got {fraction}"
            )));
        }

        let pnl_of = |s: &StrategyId| pnl_by_strategy.get(s).copied().unwrap_or(Decimal::ZERO);
        let venues: BTreeSet<VenueId> = self.allocations.keys().map(|(_, v)| v.clone()).collect();
        let mut report = RotationReport::default();

        for venue in venues {
            let cells: Vec<CellKey> = self
                .allocations
                .keys()
                .filter(|(_, v)| *v == venue)
                .cloned()
                .collect();

            let Some(worst) = cells.iter().map(|(s, _)| pnl_of(s)).min() else {
                continue;
            };
            let weights: Vec<Money> = cells.iter().map(|(s, _)| pnl_of(s) - worst).collect();
            let total_weight: Money = weights.iter().copied().sum();
            if total_weight.is_zero() {
                debug!(%venue, "No performance spread, skipping rotation");
                continue;
            }

            let mut deltas = vec![Decimal::ZERO; cells.len()];
            let mut pot = Decimal::ZERO;
            for (i, key) in cells.iter().enumerate() {
                let balance = self.allocations.get(key).copied().unwrap_or(Decimal::ZERO);
                let take = round_down(balance * fraction);
                deltas[i] -= take;
                pot += take;
            }

            // The last weighted cell takes the rounding remainder.
            let last = weights.iter().rposition(|w| !w.is_zero());
            let mut handed_out = Decimal::ZERO;
            for (i, weight) in weights.iter().enumerate() {
                if weight.is_zero() {
                    continue;
                }
                let share = if Some(i) == last {
                    pot - handed_out
                } else {
                    round_down(pot * *weight / total_weight)
                };
                deltas[i] += share;
                handed_out += share;
            }

            for (key, delta) in cells.into_iter().zip(deltas) {
                if delta.is_zero() {
                    continue;
                }
                if let Some(allocation) = self.allocations.get_mut(&key) {
                    *allocation += delta;
                }
                report.transfers.push((key.0, key.1, delta));
            }
            report.moved += pot;
        }

        info!(moved = %report.moved, "Rotated capital toward stronger strategies");
        Ok(report)
    }

    /// Applies realized PnL to one cell and to total capital. A loss larger
    /// than the cell clamps it to zero and returns `InsufficientAllocation`;
    /// the reserve never covers it.
    pub fn settle(&mut self, strategy: &StrategyId, venue: &VenueId, delta: Money) -> Result<Money> {
        let key = (strategy.clone(), venue.clone());
        let allocation = self.allocations.get_mut(&key).ok_or_else(|| unknown(&key))?;

        if *allocation + delta < Decimal::ZERO {
            let shortfall = -(*allocation + delta);
            let applied = -*allocation;
            *allocation = Decimal::ZERO;
            self.total_capital += applied;
            warn!(
                strategy = %strategy,
                venue = %venue,
                %shortfall,
                "Loss exceeds allocation, cell clamped to zero"
            );
            return Err(Error::InsufficientAllocation {
                strategy: strategy.clone(),
                venue: venue.clone(),
                shortfall,
            });
        }

        *allocation += delta;
        self.total_capital += delta;
        debug!(strategy = %strategy, venue = %venue, %delta, balance = %*allocation, "Settled");
        Ok(*allocation)
    }

    pub fn commit_exposure(&mut self, strategy: &StrategyId, venue: &VenueId, size: Money) -> Result<()> {
        if size < Decimal::ZERO {
            return Err(core_types::Error::NegativeCapital(size.to_string()).into());
        }
        let key = (strategy.clone(), venue.clone());
        if !self.allocations.contains_key(&key) {
            return Err(unknown(&key));
        }
        *self.open_exposure.entry(key).or_insert(Decimal::ZERO) += size;
        Ok(())
    }

    /// Releases up to `size` of open exposure; never goes below zero.
    pub fn release_exposure(&mut self, strategy: &StrategyId, venue: &VenueId, size: Money) -> Result<()> {
        let key = (strategy.clone(), venue.clone());
        if !self.allocations.contains_key(&key) {
            return Err(unknown(&key));
        }
        if let Some(open) = self.open_exposure.get_mut(&key) {
            *open = (*open - size).max(Decimal::ZERO);
            if open.is_zero() {
                self.open_exposure.remove(&key);
            }
        }
        Ok(())
    }

    /// Checks the conservation and non-negativity invariants.
    pub fn verify(&self) -> Result<()> {
        if self.reserve < Decimal::ZERO {
            return Err(Error::InvariantBreach(format!(
                "reserve is negative: {}",
                self.reserve
            )));
        }
        if let Some(((s, v), amount)) = self.allocations.iter().find(|(_, a)| **a < Decimal::ZERO) {
            return Err(Error::InvariantBreach(format!(
                "allocation {s}@{v} is negative: {amount}"
            )));
        }
        let allocated: Money = self.allocations.values().copied().sum();
        if self.total_capital != self.reserve + allocated {
            return Err(Error::InvariantBreach(format!(
                "total {} != reserve {} + allocations {}",
                self.total_capital, self.reserve, allocated
            )));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> CapitalPoolSnapshot {
        CapitalPoolSnapshot {
            total_capital: self.total_capital,
            reserve: self.reserve,
            cells: self
                .allocations
                .iter()
                .map(|((strategy, venue), allocation)| CellAllocation {
                    strategy: strategy.clone(),
                    venue: venue.clone(),
                    allocation: *allocation,
                    open_exposure: self.open_exposure(strategy, venue),
                })
                .collect(),
        }
    }
}

fn unknown(key: &CellKey) -> Error {
    Error::UnknownCell {
        strategy: key.0.clone(),
        venue: key.1.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ids() -> (Vec<StrategyId>, Vec<VenueId>) {
        (
            vec![StrategyId::new("alpha"), StrategyId::new("beta")],
            vec![VenueId::new("binance"), VenueId::new("bybit")],
        )
    }

    fn pool() -> CapitalPool {
        let (s, v) = ids();
        CapitalPool::allocate(dec!(1000), &s, &v, dec!(0.2)).unwrap()
    }

    #[test]
    fn even_split_with_reserve() {
        let pool = pool();
        assert_eq!(pool.reserve(), dec!(200));
        for cell in pool.snapshot().cells {
            assert_eq!(cell.allocation, dec!(200));
        }
        pool.verify().unwrap();
    }

    #[test]
    fn uneven_split_leaves_remainder_in_reserve() {
        let strategies = vec![StrategyId::new("a"), StrategyId::new("b"), StrategyId::new("c")];
        let venues = vec![VenueId::new("x")];
        let pool = CapitalPool::allocate(dec!(100), &strategies, &venues, dec!(0)).unwrap();
        assert_eq!(pool.allocation(&strategies[0], &venues[0]).unwrap(), dec!(33.33333333));
        assert_eq!(pool.reserve(), dec!(0.00000001));
        pool.verify().unwrap();
    }

    #[test]
    fn allocate_rejects_bad_input() {
        let (s, v) = ids();
        assert!(CapitalPool::allocate(dec!(-1), &s, &v, dec!(0.2)).is_err());
        assert!(CapitalPool::allocate(dec!(1000), &[], &v, dec!(0.2)).is_err());
        assert!(CapitalPool::allocate(dec!(1000), &s, &v, dec!(1)).is_err());
    }

    #[test]
    fn settle_clamps_then_rebalance_refills() {
        let (s, v) = ids();
        let mut pool = pool();

        let err = pool.settle(&s[0], &v[0], dec!(-250)).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientAllocation {
                strategy: s[0].clone(),
                venue: v[0].clone(),
                shortfall: dec!(50),
            }
        );
        assert_eq!(pool.allocation(&s[0], &v[0]).unwrap(), dec!(0));
        assert_eq!(pool.total_capital(), dec!(800));
        assert_eq!(pool.reserve(), dec!(200));
        pool.verify().unwrap();

        let report = pool.rebalance(dec!(100), dec!(200)).unwrap();
        assert_eq!(report.boosted, vec![(s[0].clone(), v[0].clone())]);
        assert_eq!(pool.reserve(), dec!(0));
        assert_eq!(pool.allocation(&s[0], &v[0]).unwrap(), dec!(200));
        pool.verify().unwrap();
    }

    #[test]
    fn rebalance_is_best_effort() {
        let (s, v) = ids();
        let mut pool = pool();
        let _ = pool.settle(&s[0], &v[0], dec!(-200));
        let _ = pool.settle(&s[1], &v[1], dec!(-200));
        let report = pool.rebalance(dec!(100), dec!(150)).unwrap();
        assert_eq!(report.boosted.len(), 1);
        assert_eq!(report.unfunded, vec![(s[1].clone(), v[1].clone())]);
        assert_eq!(pool.reserve(), dec!(50));
        pool.verify().unwrap();
    }

    #[test]
    fn rotation_moves_capital_to_better_performers() {
        let (s, v) = ids();
        let mut pool = pool();
        let perf = HashMap::from([(s[0].clone(), dec!(30)), (s[1].clone(), dec!(-10))]);

        let report = pool.rotate(&perf, dec!(0.1)).unwrap();
        assert_eq!(report.moved, dec!(80));
        for venue in &v {
            assert_eq!(pool.allocation(&s[0], venue).unwrap(), dec!(220));
            assert_eq!(pool.allocation(&s[1], venue).unwrap(), dec!(180));
        }
        pool.verify().unwrap();
    }

    #[test]
    fn rotation_without_spread_is_a_no_op() {
        let (s, _) = ids();
        let mut pool = pool();
        let before = pool.snapshot();
        let perf = HashMap::from([(s[0].clone(), dec!(5)), (s[1].clone(), dec!(5))]);
        let report = pool.rotate(&perf, dec!(0.5)).unwrap();
        assert!(report.transfers.is_empty());
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn exposure_reduces_available_capital() {
        let (s, v) = ids();
        let mut pool = pool();
        pool.commit_exposure(&s[0], &v[0], dec!(60)).unwrap();
        assert_eq!(pool.capital_available(&s[0], &v[0]).unwrap(), dec!(140));
        pool.release_exposure(&s[0], &v[0], dec!(100)).unwrap();
        assert_eq!(pool.open_exposure(&s[0], &v[0]), dec!(0));
    }

    #[test]
    fn unknown_cells_are_errors() {
        let mut pool = pool();
        let ghost = StrategyId::new("ghost");
        let venue = VenueId::new("binance");
        assert!(matches!(
            pool.settle(&ghost, &venue, dec!(1)),
            Err(Error::UnknownCell { .. })
        ));
        assert!(pool.capital_available(&ghost, &venue).is_err());
    }

    #[test]
    fn verify_detects_a_corrupt_snapshot() {
        let mut snapshot = pool().snapshot();
        snapshot.reserve = dec!(150);
        let restored = CapitalPool::from_snapshot(&snapshot);
        assert!(matches!(restored.verify(), Err(Error::InvariantBreach(_))));
    }
}
