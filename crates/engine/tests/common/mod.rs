#![allow(dead_code)]

use app_config::Settings;
use audit::AuditLedger;
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{
    ManualClock, Money, Side, StrategyId, Symbol, TradeRequest, VenueId, VolatilityReading,
};
use engine::GovernanceOrchestrator;
use std::sync::Arc;

pub const SETTINGS: &str = r#"
    [app]
    environment = "test"
    log_level = "debug"

    [capital]
    initial_capital = "1000"
    reserve_ratio = "0.2"
    rebalance_floor = "100"
    rebalance_boost = "200"
    rotation_fraction = "0.1"
    venues = ["binance", "bybit"]

    [[capital.strategies]]
    id = "alpha"
    kind = "session"

    [[capital.strategies]]
    id = "beta"
    kind = "scalping"

    [caps]
    max_risk_pct = 2.2
    max_leverage = 5.5
    max_drawdown_pct = 15.0
    capital_floor = "0"
"#;

pub fn settings() -> Settings {
    app_config::load_settings_from_str(SETTINGS).unwrap()
}

/// Wednesday noon, inside the trading window.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
}

pub fn mins(n: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(n)
}

pub struct Harness {
    pub orchestrator: Arc<GovernanceOrchestrator>,
    pub audit: Arc<AuditLedger>,
    pub clock: Arc<ManualClock>,
}

pub fn harness_with(settings: &Settings) -> Harness {
    let audit = Arc::new(AuditLedger::in_memory());
    let clock = Arc::new(ManualClock::new(t0()));
    let orchestrator = Arc::new(
        GovernanceOrchestrator::new(settings, Arc::clone(&audit), clock.clone()).unwrap(),
    );
    Harness {
        orchestrator,
        audit,
        clock,
    }
}

pub fn harness() -> Harness {
    harness_with(&settings())
}

pub fn request(strategy: &str, venue: &str, at: DateTime<Utc>) -> TradeRequest {
    TradeRequest {
        strategy: StrategyId::new(strategy),
        venue: VenueId::new(venue),
        symbol: Symbol::new("BTCUSDT"),
        side: Side::Long,
        base_risk_pct: 2.0,
        base_leverage: 5.0,
        requested_at: at,
        signal_strength: None,
        realized_pnl: None,
    }
}

pub fn with_outcome(mut request: TradeRequest, pnl: Money) -> TradeRequest {
    request.realized_pnl = Some(pnl);
    request
}

pub fn reading(value: f64, at: DateTime<Utc>) -> VolatilityReading {
    VolatilityReading {
        value,
        timestamp: at,
    }
}
