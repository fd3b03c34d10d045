// In app/src/scenario.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use core_types::{ManualClock, TradeRequest, VolatilityReading};
use engine::{Engine, EngineReport, GovernanceOrchestrator, TradeOutcome};
use serde::Deserialize;
use std::path::Path;

/// One step of a replay file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Volatility(VolatilityReading),
    Request(TradeRequest),
    Outcome(TradeOutcome),
    Rebalance { at: DateTime<Utc> },
    Rotate { at: DateTime<Utc> },
    StartDay { at: DateTime<Utc> },
    EmergencyLock { at: DateTime<Utc>, note: String },
    Reset { at: DateTime<Utc> },
}

impl ScenarioEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            ScenarioEvent::Volatility(reading) => reading.timestamp,
            ScenarioEvent::Request(request) => request.requested_at,
            ScenarioEvent::Outcome(outcome) => outcome.closed_at,
            ScenarioEvent::Rebalance { at }
            | ScenarioEvent::Rotate { at }
            | ScenarioEvent::StartDay { at }
            | ScenarioEvent::EmergencyLock { at, .. }
            | ScenarioEvent::Reset { at } => *at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(ScenarioEvent::at)
    }
}

/// Plays a scenario against the engine.
///
/// Runs of consecutive requests are dispatched together: one request at a time
/// when sequential, as a single batch across strategy tasks when concurrent.
/// Every other event is applied in file order between those runs.
pub async fn replay(
    scenario: Scenario,
    engine: &Engine,
    clock: &ManualClock,
    concurrent: bool,
) -> Result<EngineReport> {
    let orchestrator = engine.orchestrator();
    let mut report = EngineReport::default();
    let mut batch: Vec<TradeRequest> = Vec::new();

    for event in scenario.events {
        if let ScenarioEvent::Request(request) = event {
            if concurrent {
                batch.push(request);
            } else {
                clock.set(request.requested_at);
                merge(&mut report, engine.run([request]).await?);
            }
            continue;
        }

        flush(engine, clock, &mut batch, &mut report).await?;
        clock.set(event.at());
        apply(orchestrator, event).await?;
    }
    flush(engine, clock, &mut batch, &mut report).await?;

    Ok(report)
}

async fn flush(
    engine: &Engine,
    clock: &ManualClock,
    batch: &mut Vec<TradeRequest>,
    report: &mut EngineReport,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    if let Some(latest) = batch.iter().map(|r| r.requested_at).max() {
        clock.set(latest);
    }
    let run = engine.run(std::mem::take(batch)).await?;
    merge(report, run);
    Ok(())
}

async fn apply(orchestrator: &GovernanceOrchestrator, event: ScenarioEvent) -> Result<()> {
    match event {
        ScenarioEvent::Volatility(reading) => orchestrator.observe_volatility(reading).await?,
        ScenarioEvent::Outcome(outcome) => {
            let settlement = orchestrator.settle_outcome(outcome.clone()).await?;
            println!(
                "outcome  {:<16} {:<10} pnl {:>12}  balance {:>12}{}",
                outcome.strategy,
                outcome.venue,
                outcome.pnl,
                settlement.balance,
                settlement
                    .shortfall
                    .map(|s| format!("  shortfall {s}"))
                    .unwrap_or_default()
            );
        }
        ScenarioEvent::Rebalance { .. } => {
            let rebalance = orchestrator.rebalance().await?;
            println!(
                "rebalance boosted {} unfunded {} moved {}",
                rebalance.boosted.len(),
                rebalance.unfunded.len(),
                rebalance.moved
            );
        }
        ScenarioEvent::Rotate { .. } => {
            let rotation = orchestrator.rotate().await?;
            println!(
                "rotate   transfers {} moved {}",
                rotation.transfers.len(),
                rotation.moved
            );
        }
        ScenarioEvent::StartDay { .. } => orchestrator.start_trading_day().await,
        ScenarioEvent::EmergencyLock { note, .. } => orchestrator.emergency_lock(note).await,
        ScenarioEvent::Reset { .. } => orchestrator.reset().await,
        ScenarioEvent::Request(_) => {
            anyhow::bail!("request events are dispatched through the engine")
        }
    }
    Ok(())
}

fn merge(into: &mut EngineReport, run: EngineReport) {
    for task in run.tasks {
        for evaluated in &task.evaluated {
            let decision = &evaluated.decision;
            match &decision.block_reason {
                None => println!(
                    "APPROVED {:<16} {:<10} size {:>12}  risk {:>5.2}%  lev {:>4.2}x  conf {:>5.1}{}",
                    evaluated.request.strategy,
                    evaluated.request.venue,
                    decision.position_size,
                    decision.effective_risk_pct,
                    decision.effective_leverage,
                    decision.confidence_score,
                    evaluated
                        .order
                        .as_ref()
                        .map(|o| format!("  order {}", o.order_id))
                        .unwrap_or_default()
                ),
                Some(reason) => println!(
                    "REJECTED {:<16} {:<10} {}",
                    evaluated.request.strategy, evaluated.request.venue, reason
                ),
            }
        }
        match into.tasks.iter_mut().find(|t| t.strategy == task.strategy) {
            Some(existing) => {
                existing.evaluated.extend(task.evaluated);
                existing.errors += task.errors;
                existing.aborted |= task.aborted;
            }
            None => into.tasks.push(task),
        }
    }
    into.unrouted += run.unrouted;
}
