// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::Settings;
use audit::AuditLedger;
use chrono::Utc;
use clap::{Parser, Subcommand};
use core_types::ManualClock;
use engine::{Engine, GovernanceOrchestrator};
use execution::PaperOrderSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod scenario;
use crate::scenario::Scenario;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(
    name = "governor",
    author,
    version,
    about,
    long_about = "Risk governance and capital allocation for automated trading strategies."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replays a JSON scenario of volatility readings, requests and outcomes.
    Replay {
        /// Path to the scenario file.
        scenario: PathBuf,

        /// Dispatch each run of requests across the strategy tasks at once.
        #[arg(long)]
        concurrent: bool,
    },

    /// Validates the layered configuration and prints the effective settings.
    Check,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = app_config::load_settings().context("Failed to load settings")?;

    let level: tracing::Level = settings
        .app
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new().with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(environment = %settings.app.environment, "Starting governor");

    match cli.command {
        Commands::Replay {
            scenario,
            concurrent,
        } => {
            handle_replay(settings, scenario, concurrent).await?;
        }
        Commands::Check => {
            handle_check(&settings)?;
        }
    }

    tracing::info!("Governor has finished successfully.");
    Ok(())
}

// --- "Replay" Subcommand Logic ---

async fn handle_replay(settings: Settings, path: PathBuf, concurrent: bool) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    tracing::info!(path = %path.display(), events = scenario.events.len(), concurrent, "Scenario loaded");

    let audit = match &settings.audit.journal_path {
        Some(journal) => Arc::new(AuditLedger::with_journal(journal)?),
        None => Arc::new(AuditLedger::in_memory()),
    };
    let clock = Arc::new(ManualClock::new(scenario.start().unwrap_or_else(Utc::now)));
    let orchestrator = Arc::new(GovernanceOrchestrator::new(
        &settings,
        audit,
        clock.clone(),
    )?);
    let sink = Arc::new(PaperOrderSink::new(&settings.paper)?);
    let engine = Engine::new(orchestrator.clone(), sink.clone());

    let report = scenario::replay(scenario, &engine, &clock, concurrent).await?;
    let snapshot = orchestrator.snapshot().await;

    println!("\n--- Replay Complete ---");
    for task in &report.tasks {
        println!(
            "{:<16} evaluated {:>4}  approved {:>4}  errors {:>3}{}",
            task.strategy,
            task.evaluated.len(),
            task.approved(),
            task.errors,
            if task.aborted { "  ABORTED" } else { "" }
        );
    }
    for strategy in orchestrator.strategies() {
        let record = orchestrator.performance(strategy).await?;
        if record.total_trades() == 0 {
            continue;
        }
        println!(
            "{:<16} win rate {:>5.1}%  expectancy {:>10}  max dd {:>10}  sharpe {:>5.2}",
            strategy,
            record.win_rate() * 100.0,
            record.expectancy().round_dp(4),
            record.max_drawdown(),
            record.sharpe_proxy()
        );
    }
    if report.unrouted > 0 {
        println!("unrouted requests: {}", report.unrouted);
    }
    println!("paper fills: {}", sink.fills().await.len());
    println!("\n--- Final Snapshot ---");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if snapshot.halted {
        anyhow::bail!("Capital pool failed verification; reconciliation is required.");
    }
    Ok(())
}

// --- "Check" Subcommand Logic ---

fn handle_check(settings: &Settings) -> Result<()> {
    let rendered = app_config::to_toml_string(settings)?;
    println!("{rendered}");
    tracing::info!(
        strategies = settings.capital.strategies.len(),
        venues = settings.capital.venues.len(),
        "Settings are valid."
    );
    Ok(())
}
