use audit::{AuditFilter, AuditLedger, read_journal};
use capital::CapitalPool;
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{
    BlockReason, Side, StrategyId, Symbol, TradeDecision, TradeRequest, VenueId,
};
use risk::{GovernorSettings, RiskGovernor};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap()
}

fn request(strategy: &str, venue: &str) -> TradeRequest {
    TradeRequest {
        strategy: StrategyId::new(strategy),
        venue: VenueId::new(venue),
        symbol: Symbol::new("ETHUSDT"),
        side: Side::Long,
        base_risk_pct: 1.0,
        base_leverage: 2.0,
        requested_at: t0(),
        signal_strength: None,
        realized_pnl: None,
    }
}

fn approved() -> TradeDecision {
    TradeDecision {
        approved: true,
        position_size: dec!(4),
        effective_risk_pct: 1.0,
        effective_leverage: 2.0,
        confidence_score: 70.0,
        volatility_modifier: 1.0,
        scaling_mode: None,
        floor_triggered: false,
        block_reason: None,
    }
}

fn append(ledger: &AuditLedger, at: DateTime<Utc>, req: TradeRequest, decision: TradeDecision) {
    let pool = CapitalPool::allocate(
        dec!(1000),
        &[StrategyId::new("alpha"), StrategyId::new("beta")],
        &[VenueId::new("binance")],
        dec!(0.2),
    )
    .unwrap();
    let governor = RiskGovernor::new(GovernorSettings::default(), dec!(1000)).unwrap();
    ledger.append(at, req, decision, pool.snapshot(), governor.state().clone());
}

#[test]
fn ids_increase_and_queries_filter() {
    let ledger = AuditLedger::in_memory();
    append(&ledger, t0(), request("alpha", "binance"), approved());
    append(
        &ledger,
        t0() + Duration::minutes(1),
        request("beta", "binance"),
        TradeDecision::rejected(BlockReason::TradingWindowClosed),
    );
    append(&ledger, t0() + Duration::minutes(2), request("alpha", "binance"), approved());

    assert_eq!(ledger.len(), 3);

    let all = ledger.query(&AuditFilter::default());
    let ids: Vec<u64> = all.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let alpha = ledger.query(&AuditFilter {
        strategy: Some(StrategyId::new("alpha")),
        ..Default::default()
    });
    assert_eq!(alpha.len(), 2);

    let rejected = ledger.query(&AuditFilter {
        approved: Some(false),
        ..Default::default()
    });
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].request.strategy, StrategyId::new("beta"));

    let window = ledger.query(&AuditFilter {
        since: Some(t0() + Duration::minutes(1)),
        until: Some(t0() + Duration::minutes(2)),
        ..Default::default()
    });
    assert_eq!(window.len(), 1);

    let limited = ledger.query(&AuditFilter {
        limit: Some(1),
        ..Default::default()
    });
    assert_eq!(limited[0].id, 1);
}

#[test]
fn concurrent_appends_get_unique_ids() {
    let ledger = Arc::new(AuditLedger::in_memory());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    append(&ledger, t0(), request(&format!("s{i}"), "binance"), approved());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = ledger.query(&AuditFilter::default());
    assert_eq!(entries.len(), 200);
    assert!(entries.windows(2).all(|w| w[0].id + 1 == w[1].id));
}

#[test]
fn journal_round_trips_and_resumes_ids() {
    let path = std::env::temp_dir().join(format!(
        "audit-journal-{}-{}.jsonl",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));

    {
        let ledger = AuditLedger::with_journal(&path).unwrap();
        append(&ledger, t0(), request("alpha", "binance"), approved());
        append(
            &ledger,
            t0(),
            request("beta", "binance"),
            TradeDecision::rejected(BlockReason::VolatilityUnavailable),
        );
    }

    let on_disk = read_journal(&path).unwrap();
    assert_eq!(on_disk.len(), 2);
    assert_eq!(
        on_disk[1].decision.block_reason,
        Some(BlockReason::VolatilityUnavailable)
    );

    let reopened = AuditLedger::with_journal(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    append(&reopened, t0(), request("alpha", "binance"), approved());
    assert_eq!(reopened.query(&AuditFilter::default())[2].id, 3);

    std::fs::remove_file(&path).ok();
}

#[test]
fn journal_keeps_id_order_under_concurrent_appends() {
    let path = std::env::temp_dir().join(format!(
        "audit-journal-order-{}-{}.jsonl",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));

    {
        let ledger = Arc::new(AuditLedger::with_journal(&path).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        append(&ledger, t0(), request(&format!("s{i}"), "binance"), approved());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.len(), 200);
    }

    // Dropping the ledger drains the writer, so every line is on disk.
    let on_disk = read_journal(&path).unwrap();
    let ids: Vec<u64> = on_disk.iter().map(|e| e.id).collect();
    assert_eq!(ids, (1..=200).collect::<Vec<u64>>());

    std::fs::remove_file(&path).ok();
}
