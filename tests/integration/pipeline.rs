//! The two-phase daily pipeline against a throwaway database: store a
//! cohort, rank it, read the results back, and re-run for idempotence.

use pretty_assertions::assert_eq;

use crate::common::{test_data, TestDatabase};
use stock_analyzer::analysis::{build_daily_metrics, rank_cohort};
use stock_analyzer::models::{ScoreWeights, Signal, TickerData};

#[tokio::test]
async fn two_phase_pipeline_ranks_and_persists() {
    let db = TestDatabase::new().await;
    let calc_date = test_data::date(2025, 1, 15);
    let weights = ScoreWeights::default();

    // Phase 1: one strong ticker, one with nothing but a snapshot, one
    // degraded snapshot
    let strong = test_data::healthy_ticker("Strong Corp");

    let mut thin = TickerData {
        snapshot: test_data::snapshot("Thin Corp"),
        ..Default::default()
    };
    // Keep the ROE fallback below the strong ticker's statement ROIC
    thin.snapshot.return_on_equity = Some(0.08);

    let mut weak = test_data::healthy_ticker("Weak Corp");
    weak.snapshot.return_on_equity = Some(0.02);
    weak.snapshot.ebitda = Some(100_000_000.0);
    weak.snapshot.free_cash_flow = None;
    weak.snapshot.revenue_growth = Some(-0.10);
    weak.snapshot.gross_margins = Some(0.10);
    weak.snapshot.debt_to_equity = Some(300.0);
    weak.income = Default::default();
    weak.balance = Default::default();
    weak.cashflow = Default::default();

    for (ticker, data) in [("STRN", &strong), ("THIN", &thin), ("WEAK", &weak)] {
        let metrics = build_daily_metrics(ticker, calc_date, data);
        db.manager
            .upsert_stock(
                ticker,
                &data.snapshot.company_name,
                data.snapshot.sector.as_deref(),
                data.snapshot.industry.as_deref(),
            )
            .await
            .unwrap();
        db.manager.upsert_daily_metrics(&metrics).await.unwrap();
    }

    // Phase 2: rank and write back
    let cohort = db.manager.daily_cohort(calc_date).await.unwrap();
    assert_eq!(cohort.len(), 3);
    let scores = rank_cohort(&cohort, &weights);
    db.manager.apply_rankings(calc_date, &scores).await.unwrap();

    // Read back the leaderboard
    let top = db.manager.top_by_composite(calc_date, 10).await.unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].ticker, "STRN");
    assert_eq!(top[0].company_name, "Strong Corp");
    assert_eq!(top[0].magic_formula_rank, Some(1));
    assert!(top[0].composite_score > top[2].composite_score);

    let (buy, hold, sell) = db.manager.signal_tally(calc_date).await.unwrap();
    assert_eq!(buy + hold + sell, 3);

    // Re-running both phases must reproduce identical results
    for (ticker, data) in [("STRN", &strong), ("THIN", &thin), ("WEAK", &weak)] {
        let metrics = build_daily_metrics(ticker, calc_date, data);
        db.manager.upsert_daily_metrics(&metrics).await.unwrap();
    }
    let cohort2 = db.manager.daily_cohort(calc_date).await.unwrap();
    let scores2 = rank_cohort(&cohort2, &weights);
    db.manager.apply_rankings(calc_date, &scores2).await.unwrap();

    let top2 = db.manager.top_by_composite(calc_date, 10).await.unwrap();
    assert_eq!(top2.len(), 3);
    for (a, b) in top.iter().zip(&top2) {
        assert_eq!(a.ticker, b.ticker);
        assert_eq!(a.composite_score, b.composite_score);
        assert_eq!(a.magic_formula_rank, b.magic_formula_rank);
    }

    // Still exactly one metrics row per ticker for the date
    let cohort3 = db.manager.daily_cohort(calc_date).await.unwrap();
    assert_eq!(cohort3.len(), 3);
}

#[tokio::test]
async fn empty_cohort_round_trips_cleanly() {
    let db = TestDatabase::new().await;
    let calc_date = test_data::date(2025, 1, 15);

    let cohort = db.manager.daily_cohort(calc_date).await.unwrap();
    assert!(cohort.is_empty());

    let scores = rank_cohort(&cohort, &ScoreWeights::default());
    assert!(scores.is_empty());
    db.manager.apply_rankings(calc_date, &scores).await.unwrap();

    let top = db.manager.top_by_composite(calc_date, 10).await.unwrap();
    assert!(top.is_empty());
}

#[tokio::test]
async fn signals_match_composite_boundaries() {
    // Single-member cohort always scores 100 and signals BUY
    let db = TestDatabase::new().await;
    let calc_date = test_data::date(2025, 1, 15);

    let data = test_data::healthy_ticker("Solo Corp");
    let metrics = build_daily_metrics("SOLO", calc_date, &data);
    db.manager.upsert_daily_metrics(&metrics).await.unwrap();

    let cohort = db.manager.daily_cohort(calc_date).await.unwrap();
    let scores = rank_cohort(&cohort, &ScoreWeights::default());
    db.manager.apply_rankings(calc_date, &scores).await.unwrap();

    let top = db.manager.top_by_composite(calc_date, 1).await.unwrap();
    assert_eq!(top[0].composite_score, 100.0);
    assert_eq!(top[0].signal, Some(Signal::Buy));
}
