//! Daily metrics derivation over the shared healthy-company fixture.

use pretty_assertions::assert_eq;

use crate::common::test_data;
use stock_analyzer::analysis::{build_daily_metrics, rank_cohort, CohortMetrics};
use stock_analyzer::models::{ScoreWeights, Signal};

#[test]
fn healthy_company_scores_a_full_piotroski() {
    let data = test_data::healthy_ticker("Fixture Corp");
    let metrics = build_daily_metrics("FIX", test_data::date(2025, 1, 15), &data);

    // Improving on every dimension: all nine tests pass
    assert_eq!(metrics.piotroski_score, 9);

    // ROIC from statements: 1.5e9 / (12.0e9 - 2.0e9 - 1.5e9)
    let roic = metrics.roic.unwrap();
    assert!((roic - 1.5 / 8.5).abs() < 1e-12);

    // Earnings yield: 1.1e9 / 11.0e9 = 0.10
    assert_eq!(metrics.earnings_yield, Some(0.10));
    // FCF yield: 8e8 / 1e10 = 0.08
    assert_eq!(metrics.fcf_yield, Some(0.08));

    // Ranking fields stay empty until the cross-sectional pass
    assert_eq!(metrics.magic_formula_rank, None);
    assert_eq!(metrics.composite_score, None);
    assert_eq!(metrics.signal, None);
}

#[test]
fn snapshot_only_ticker_still_produces_metrics() {
    let data = stock_analyzer::models::TickerData {
        snapshot: test_data::snapshot("Thin Corp"),
        ..Default::default()
    };
    let metrics = build_daily_metrics("THIN", test_data::date(2025, 1, 15), &data);

    // No statements: only the ROA and ROE based tests can contribute
    assert_eq!(metrics.piotroski_score, 1);
    // ROIC falls back to snapshot ROE
    assert_eq!(metrics.roic, Some(0.22));
    assert_eq!(metrics.price, Some(100.0));
}

#[test]
fn cohort_of_one_ranks_first_with_top_percentiles() {
    let data = test_data::healthy_ticker("Solo Corp");
    let m = build_daily_metrics("SOLO", test_data::date(2025, 1, 15), &data);

    let cohort = vec![CohortMetrics {
        ticker: m.ticker.clone(),
        roic: m.roic,
        earnings_yield: m.earnings_yield,
        piotroski_score: m.piotroski_score,
        fcf_yield: m.fcf_yield,
        debt_to_equity: m.debt_to_equity,
        revenue_growth: m.revenue_growth,
        gross_margin: m.gross_margin,
    }];
    let ranked = rank_cohort(&cohort, &ScoreWeights::default());

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].magic_formula_rank, 1);
    // Every percentile is 100, so the composite is the weight sum x 100
    assert_eq!(ranked[0].composite_score, 100.0);
    assert_eq!(ranked[0].signal, Signal::Buy);
}
