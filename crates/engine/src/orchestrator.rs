// In crates/engine/src/orchestrator.rs

use crate::types::{GovernanceSnapshot, Settlement, TradeOutcome};
use crate::{Error, Result};
use analytics::{PerformanceRecord, PerformanceTracker};
use app_config::{CapitalSettings, Settings};
use audit::{AuditEntry, AuditFilter, AuditLedger};
use capital::{CapitalPool, RebalanceReport, RotationReport};
use chrono::{DateTime, Utc};
use core_types::{
    BlockReason, Clock, Money, StrategyId, StrategyKind, TradeDecision, TradeRequest, VenueId,
    VolatilityReading,
};
use risk::{
    AdaptiveScaler, ConfidenceScorer, GovernorStatus, PositionSizer, RiskGovernor,
    TimeWindowGate, VolatilityGate,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Everything an evaluation may mutate. Guarded by one lock so each pipeline
/// run, including its audit entry, is atomic with respect to the others.
struct GovernanceState {
    pool: CapitalPool,
    governor: RiskGovernor,
    tracker: PerformanceTracker,
    latest_volatility: Option<VolatilityReading>,
    halted: bool,
}

/// Runs every trade request through the governance pipeline:
/// calendar, circuit breaker, volatility, confidence, adaptive scaling,
/// sizing, then capital bookkeeping and audit.
pub struct GovernanceOrchestrator {
    time_gate: TimeWindowGate,
    volatility_gate: VolatilityGate,
    scorer: ConfidenceScorer,
    scaler: AdaptiveScaler,
    sizer: PositionSizer,
    capital: CapitalSettings,
    strategy_kinds: HashMap<StrategyId, StrategyKind>,
    state: Mutex<GovernanceState>,
    audit: Arc<AuditLedger>,
    clock: Arc<dyn Clock>,
}

impl GovernanceOrchestrator {
    /// Builds the engine with a fresh even capital split.
    pub fn new(settings: &Settings, audit: Arc<AuditLedger>, clock: Arc<dyn Clock>) -> Result<Self> {
        let strategies: Vec<StrategyId> = settings
            .capital
            .strategies
            .iter()
            .map(|s| s.id.clone())
            .collect();
        let pool = CapitalPool::allocate(
            settings.capital.initial_capital,
            &strategies,
            &settings.capital.venues,
            settings.capital.reserve_ratio,
        )?;
        Self::with_pool(settings, pool, audit, clock)
    }

    /// Builds the engine around an existing pool, e.g. one restored from a
    /// snapshot. A pool that fails verification starts halted.
    pub fn with_pool(
        settings: &Settings,
        pool: CapitalPool,
        audit: Arc<AuditLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let governor = RiskGovernor::new(settings.governor.clone(), pool.total_capital())?;
        let tracker = PerformanceTracker::new(&settings.performance);

        let halted = match pool.verify() {
            Ok(()) => false,
            Err(e) => {
                error!(error = %e, "Capital pool failed verification; evaluation halted until reconciled");
                true
            }
        };

        let strategy_kinds = settings
            .capital
            .strategies
            .iter()
            .map(|s| (s.id.clone(), s.kind))
            .collect();

        info!(
            strategies = settings.capital.strategies.len(),
            venues = settings.capital.venues.len(),
            total = %pool.total_capital(),
            reserve = %pool.reserve(),
            "Governance orchestrator initialized"
        );

        Ok(Self {
            time_gate: TimeWindowGate::new(settings.calendar.clone())?,
            volatility_gate: VolatilityGate::new(settings.volatility.clone())?,
            scorer: ConfidenceScorer::new(settings.confidence.clone())?,
            scaler: AdaptiveScaler::new(settings.adaptive.clone())?,
            sizer: PositionSizer::new(settings.caps.clone())?,
            capital: settings.capital.clone(),
            strategy_kinds,
            state: Mutex::new(GovernanceState {
                pool,
                governor,
                tracker,
                latest_volatility: None,
                halted,
            }),
            audit,
            clock,
        })
    }

    pub fn strategies(&self) -> impl Iterator<Item = &StrategyId> {
        self.strategy_kinds.keys()
    }

    /// Decides one trade request.
    ///
    /// Rejections come back as `Ok` decisions with a `block_reason` and are
    /// audited. Errors are contract violations (never audited) or a fatal
    /// invariant breach (audited, then the engine halts).
    pub async fn evaluate(&self, request: TradeRequest) -> Result<TradeDecision> {
        let kind = self.strategy_kind(&request.strategy)?;
        request.validate()?;

        let mut state = self.state.lock().await;
        if !state.pool.contains(&request.strategy, &request.venue) {
            return Err(core_types::Error::UnknownVenue(request.venue.clone()).into());
        }
        if state.halted {
            return Err(Error::ReconciliationRequired);
        }

        let decision = self.decide(&mut state, &request, kind)?;
        if decision.approved {
            self.apply_approval(&mut state, &request, &decision)?;
        }

        let verified = state.pool.verify();
        if let Err(e) = &verified {
            state.halted = true;
            error!(error = %e, strategy = %request.strategy, "Capital invariant breached; halting evaluation");
        }

        match &decision.block_reason {
            None => info!(
                strategy = %request.strategy,
                venue = %request.venue,
                size = %decision.position_size,
                risk_pct = decision.effective_risk_pct,
                leverage = decision.effective_leverage,
                confidence = decision.confidence_score,
                floor_triggered = decision.floor_triggered,
                "Trade approved"
            ),
            Some(reason) => info!(
                strategy = %request.strategy,
                venue = %request.venue,
                reason = %reason,
                "Trade rejected"
            ),
        }

        let now = self.clock.now();
        let pool = state.pool.snapshot();
        let governor = state.governor.state().clone();
        self.audit
            .append(now, request, decision.clone(), pool, governor);

        verified?;
        Ok(decision)
    }

    /// The decision pipeline proper. Short-circuits on the first rejection.
    fn decide(
        &self,
        state: &mut GovernanceState,
        request: &TradeRequest,
        kind: StrategyKind,
    ) -> Result<TradeDecision> {
        let now = request.requested_at;

        if !self.time_gate.is_open(now) {
            return Ok(TradeDecision::rejected(BlockReason::TradingWindowClosed));
        }

        let reading = state
            .latest_volatility
            .filter(|r| self.volatility_gate.is_fresh(r, now));
        let total = state.pool.total_capital();
        if let GovernorStatus::Blocked(reason) =
            state.governor.observe(now, total, reading.map(|r| r.value))
        {
            return Ok(TradeDecision::rejected(reason));
        }

        let Some(reading) = reading else {
            return Ok(TradeDecision::rejected(BlockReason::VolatilityUnavailable));
        };
        let gate = self.volatility_gate.evaluate(reading.value);
        if let Some(reason) = gate.block_reason {
            return Ok(TradeDecision::rejected(reason));
        }

        let perf = state.tracker.stats(&request.strategy);
        let confidence = self.scorer.score(kind, &perf, request.signal_strength);
        if let Some(reason) = confidence.block_reason() {
            let mut decision = TradeDecision::rejected(reason).with_confidence(confidence.score);
            decision.volatility_modifier = gate.risk_modifier;
            return Ok(decision);
        }

        let caps = self.sizer.caps();
        let adaptive = self.scaler.scale(
            request.base_risk_pct,
            request.base_leverage,
            &perf,
            caps.max_risk_pct,
            caps.max_leverage,
        );
        debug!(
            strategy = %request.strategy,
            mode = %adaptive.mode,
            confidence = confidence.score,
            volatility_modifier = gate.risk_modifier,
            "Modifiers resolved"
        );

        let available = state
            .pool
            .capital_available(&request.strategy, &request.venue)?;
        let mut decision =
            self.sizer
                .size(request, &confidence, &adaptive, gate.risk_modifier, available)?;

        if decision.approved {
            let allocation = state.pool.allocation(&request.strategy, &request.venue)?;
            let open = state.pool.open_exposure(&request.strategy, &request.venue);
            if let Some(reason) = self
                .sizer
                .check_exposure(decision.position_size, allocation, open)
            {
                decision.approved = false;
                decision.position_size = Decimal::ZERO;
                decision.floor_triggered = false;
                decision.block_reason = Some(reason);
            }
        }

        Ok(decision)
    }

    /// Books an approved trade: a known outcome settles at once, otherwise
    /// the size is held as open exposure until `settle_outcome`.
    fn apply_approval(
        &self,
        state: &mut GovernanceState,
        request: &TradeRequest,
        decision: &TradeDecision,
    ) -> Result<()> {
        match request.realized_pnl {
            Some(pnl) => {
                self.apply_outcome(
                    state,
                    &request.strategy,
                    &request.venue,
                    pnl,
                    request.requested_at,
                )?;
            }
            None => {
                state.pool.commit_exposure(
                    &request.strategy,
                    &request.venue,
                    decision.position_size,
                )?;
            }
        }
        Ok(())
    }

    fn apply_outcome(
        &self,
        state: &mut GovernanceState,
        strategy: &StrategyId,
        venue: &VenueId,
        pnl: Money,
        at: DateTime<Utc>,
    ) -> Result<Settlement> {
        let settlement = match state.pool.settle(strategy, venue, pnl) {
            Ok(balance) => Settlement {
                balance,
                shortfall: None,
            },
            Err(capital::Error::InsufficientAllocation { shortfall, .. }) => {
                Settlement::clamped(shortfall)
            }
            Err(e) => return Err(e.into()),
        };

        state
            .tracker
            .record_outcome(strategy, pnl, pnl > Decimal::ZERO);
        let total = state.pool.total_capital();
        state.governor.record_pnl(at, pnl, total);
        Ok(settlement)
    }

    /// Stores the latest external volatility reading. Older readings than the
    /// one already held are ignored.
    pub async fn observe_volatility(&self, reading: VolatilityReading) -> Result<()> {
        if !(reading.value.is_finite() && reading.value >= 0.0) {
            return Err(core_types::Error::InvalidRequest(format!(
                "volatility reading must be a non-negative number, got {}",
                reading.value
            ))
            .into());
        }
        let mut state = self.state.lock().await;
        match state.latest_volatility {
            Some(current) if current.timestamp > reading.timestamp => {
                debug!(stale = %reading.timestamp, current = %current.timestamp, "Ignoring out-of-order volatility reading");
            }
            _ => state.latest_volatility = Some(reading),
        }
        Ok(())
    }

    /// Closes out a trade approved without a known outcome.
    pub async fn settle_outcome(&self, outcome: TradeOutcome) -> Result<Settlement> {
        self.strategy_kind(&outcome.strategy)?;
        let mut state = self.state.lock().await;
        if state.halted {
            return Err(Error::ReconciliationRequired);
        }

        state
            .pool
            .release_exposure(&outcome.strategy, &outcome.venue, outcome.size)?;
        let settlement = self.apply_outcome(
            &mut state,
            &outcome.strategy,
            &outcome.venue,
            outcome.pnl,
            outcome.closed_at,
        )?;
        if let Some(shortfall) = settlement.shortfall {
            warn!(strategy = %outcome.strategy, venue = %outcome.venue, %shortfall, "Outcome exceeded allocation");
        }
        self.verify_or_halt(&mut state)?;
        Ok(settlement)
    }

    pub async fn snapshot(&self) -> GovernanceSnapshot {
        let state = self.state.lock().await;
        GovernanceSnapshot {
            taken_at: self.clock.now(),
            pool: state.pool.snapshot(),
            governor: state.governor.state().clone(),
            latest_volatility: state.latest_volatility,
            halted: state.halted,
            audit_entries: self.audit.len(),
        }
    }

    /// Locks trading until `reset`, whatever the clock says.
    pub async fn emergency_lock(&self, note: impl Into<String>) {
        let now = self.clock.now();
        self.state.lock().await.governor.emergency_lock(now, note);
    }

    /// Clears any governor lock and restarts the peak watermark.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let total = state.pool.total_capital();
        state.governor.reset(total);
    }

    pub async fn start_trading_day(&self) {
        self.state.lock().await.governor.start_trading_day();
    }

    /// Tops up starved cells from the reserve with the configured floor/boost.
    pub async fn rebalance(&self) -> Result<RebalanceReport> {
        let mut state = self.state.lock().await;
        if state.halted {
            return Err(Error::ReconciliationRequired);
        }
        let report = state
            .pool
            .rebalance(self.capital.rebalance_floor, self.capital.rebalance_boost)?;
        self.verify_or_halt(&mut state)?;
        Ok(report)
    }

    /// Shifts capital toward strategies with better recent PnL.
    pub async fn rotate(&self) -> Result<RotationReport> {
        let mut state = self.state.lock().await;
        if state.halted {
            return Err(Error::ReconciliationRequired);
        }
        let pnl = state.tracker.pnl_by_strategy();
        let report = state.pool.rotate(&pnl, self.capital.rotation_fraction)?;
        self.verify_or_halt(&mut state)?;
        Ok(report)
    }

    pub fn audit_query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.audit.query(filter)
    }

    pub async fn performance(&self, strategy: &StrategyId) -> Result<PerformanceRecord> {
        self.strategy_kind(strategy)?;
        Ok(self.state.lock().await.tracker.stats(strategy))
    }

    /// Lifts the halt after a manual fix, provided the pool now verifies.
    pub async fn clear_reconciliation_flag(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.pool.verify()?;
        if state.halted {
            warn!("Reconciliation flag cleared by operator");
        }
        state.halted = false;
        Ok(())
    }

    /// Replaces the pool after a manual reconciliation. The new pool must
    /// verify; once installed it lifts the halt and the governor's peak
    /// watermark restarts from its total. Governor locks are kept.
    pub async fn restore_pool(&self, pool: CapitalPool) -> Result<()> {
        pool.verify()?;
        let mut state = self.state.lock().await;
        let total = pool.total_capital();
        info!(total = %total, was_halted = state.halted, "Capital pool restored");
        state.pool = pool;
        state.governor.rebase_peak(total);
        state.halted = false;
        Ok(())
    }

    /// Returns exposure committed for an approval that never reached the
    /// venue, e.g. because the order sink refused it.
    pub async fn release_exposure(
        &self,
        strategy: &StrategyId,
        venue: &VenueId,
        size: Money,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.pool.release_exposure(strategy, venue, size)?;
        debug!(%strategy, %venue, %size, "Open exposure released");
        Ok(())
    }

    fn verify_or_halt(&self, state: &mut GovernanceState) -> Result<()> {
        if let Err(e) = state.pool.verify() {
            state.halted = true;
            error!(error = %e, "Capital invariant breached; halting evaluation");
            return Err(e.into());
        }
        Ok(())
    }

    fn strategy_kind(&self, strategy: &StrategyId) -> Result<StrategyKind> {
        self.strategy_kinds
            .get(strategy)
            .copied()
            .ok_or_else(|| core_types::Error::UnknownStrategy(strategy.clone()).into())
    }
}
