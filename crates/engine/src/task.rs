// In crates/engine/src/task.rs

use crate::orchestrator::GovernanceOrchestrator;
use crate::types::{EvaluatedRequest, TaskReport};
use crate::Error;
use core_types::{StrategyId, TradeRequest};
use execution::{OrderIntent, OrderSink};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A self-contained task that evaluates every request of a single strategy.
pub struct EvaluationTask {
    strategy: StrategyId,
    orchestrator: Arc<GovernanceOrchestrator>,
    sink: Arc<dyn OrderSink>,
    requests: mpsc::Receiver<TradeRequest>,
}

impl EvaluationTask {
    pub fn new(
        strategy: StrategyId,
        orchestrator: Arc<GovernanceOrchestrator>,
        sink: Arc<dyn OrderSink>,
        requests: mpsc::Receiver<TradeRequest>,
    ) -> Self {
        Self {
            strategy,
            orchestrator,
            sink,
            requests,
        }
    }

    /// Drains the request channel until every sender is gone, or until a
    /// fatal capital error stops the engine.
    pub async fn run(mut self) -> TaskReport {
        tracing::info!(strategy = %self.strategy, sink = self.sink.name(), "Starting evaluation task.");
        let mut report = TaskReport::new(self.strategy.clone());

        while let Some(request) = self.requests.recv().await {
            let decision = match self.orchestrator.evaluate(request.clone()).await {
                Ok(decision) => decision,
                Err(e @ (Error::InvariantBreach(_) | Error::ReconciliationRequired)) => {
                    tracing::error!(strategy = %self.strategy, error = %e, "Evaluation halted.");
                    report.errors += 1;
                    report.aborted = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(strategy = %self.strategy, error = %e, "Request refused.");
                    report.errors += 1;
                    continue;
                }
            };

            // Requests with a known outcome were already settled in replay;
            // only live approvals go to the venue.
            let order = if decision.approved && request.realized_pnl.is_none() {
                let intent = OrderIntent {
                    strategy: request.strategy.clone(),
                    venue: request.venue.clone(),
                    symbol: request.symbol.clone(),
                    side: request.side,
                    size: decision.position_size,
                    leverage: decision.effective_leverage,
                };
                match self.sink.submit_order(&intent).await {
                    Ok(result) => Some(result),
                    Err(e) => {
                        tracing::warn!(strategy = %self.strategy, error = %e, "Order submission failed.");
                        if let Err(e) = self
                            .orchestrator
                            .release_exposure(&intent.strategy, &intent.venue, intent.size)
                            .await
                        {
                            tracing::error!(strategy = %self.strategy, error = %e, "Failed to release exposure.");
                        }
                        None
                    }
                }
            } else {
                None
            };

            report.evaluated.push(EvaluatedRequest {
                request,
                decision,
                order,
            });
        }

        tracing::info!(
            strategy = %self.strategy,
            evaluated = report.evaluated.len(),
            approved = report.approved(),
            errors = report.errors,
            "Evaluation task finished."
        );
        report
    }
}
