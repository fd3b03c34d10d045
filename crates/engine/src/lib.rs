// In crates/engine/src/lib.rs

pub mod error;
pub mod orchestrator;
pub mod task;
pub mod types;

use crate::task::EvaluationTask;
use core_types::{StrategyId, TradeRequest};
use execution::OrderSink;
use futures::future;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

pub use error::{Error, Result};
pub use orchestrator::GovernanceOrchestrator;
pub use types::{
    EngineReport, EvaluatedRequest, GovernanceSnapshot, Settlement, TaskReport, TradeOutcome,
};

pub const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Runs one evaluation task per strategy against a shared orchestrator.
pub struct Engine {
    orchestrator: Arc<GovernanceOrchestrator>,
    sink: Arc<dyn OrderSink>,
}

impl Engine {
    pub fn new(orchestrator: Arc<GovernanceOrchestrator>, sink: Arc<dyn OrderSink>) -> Self {
        Self { orchestrator, sink }
    }

    pub fn orchestrator(&self) -> &Arc<GovernanceOrchestrator> {
        &self.orchestrator
    }

    /// Routes `requests` to their strategy's task and waits for every task to
    /// drain. Requests for one strategy are evaluated in order; different
    /// strategies run concurrently.
    pub async fn run(
        &self,
        requests: impl IntoIterator<Item = TradeRequest>,
    ) -> anyhow::Result<EngineReport> {
        tracing::info!("Initializing governance engine...");

        let mut senders: HashMap<StrategyId, mpsc::Sender<TradeRequest>> = HashMap::new();
        let mut task_handles = vec![];

        for strategy in self.orchestrator.strategies() {
            let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
            let task = EvaluationTask::new(
                strategy.clone(),
                Arc::clone(&self.orchestrator),
                Arc::clone(&self.sink),
                rx,
            );
            senders.insert(strategy.clone(), tx);
            task_handles.push(tokio::spawn(task.run()));
        }

        if task_handles.is_empty() {
            anyhow::bail!("No evaluation tasks were started. Check the configured strategies.");
        }
        tracing::info!(count = task_handles.len(), "All evaluation tasks have been spawned.");

        let mut unrouted = 0;
        for request in requests {
            match senders.get(&request.strategy) {
                Some(tx) => {
                    if tx.send(request).await.is_err() {
                        // The task stopped on a fatal error; nothing else will be evaluated.
                        unrouted += 1;
                    }
                }
                None => {
                    tracing::warn!(strategy = %request.strategy, "No evaluation task for strategy.");
                    unrouted += 1;
                }
            }
        }
        // Closing the channels lets every task drain and exit.
        drop(senders);

        let results = future::join_all(task_handles).await;
        let mut tasks = Vec::with_capacity(results.len());
        for result in results {
            tasks.push(result?);
        }
        tasks.sort_by(|a, b| a.strategy.cmp(&b.strategy));

        Ok(EngineReport { tasks, unrouted })
    }
}
