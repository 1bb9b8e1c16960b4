//! Annual-row and summary persistence round trips.

use pretty_assertions::assert_eq;

use crate::common::{test_data, TestDatabase};
use stock_analyzer::analysis::{build_annual_rows, build_summary};

#[tokio::test]
async fn annual_and_summary_upserts_are_idempotent() {
    let db = TestDatabase::new().await;
    let calc_date = test_data::date(2025, 3, 1);

    let data = test_data::healthy_ticker("Fixture Corp");
    let rows = build_annual_rows(&data);
    let summary = build_summary(&data, &rows, calc_date);

    for row in &rows {
        db.manager.upsert_annual("FIX", row).await.unwrap();
    }
    db.manager.upsert_summary("FIX", calc_date, &summary).await.unwrap();

    // Run everything a second time; unique constraints must absorb it
    for row in &rows {
        db.manager.upsert_annual("FIX", row).await.unwrap();
    }
    db.manager.upsert_summary("FIX", calc_date, &summary).await.unwrap();

    let report = db.manager.summary_report_rows(calc_date).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].ticker, "FIX");
    assert_eq!(report[0].years_of_data, 2);
    assert_eq!(report[0].eps_cagr_full, summary.eps_cagr_full);
}

#[tokio::test]
async fn report_orders_by_eps_cagr_with_missing_last() {
    let db = TestDatabase::new().await;
    let calc_date = test_data::date(2025, 3, 1);

    let fast = stock_analyzer::models::SummaryMetrics {
        years_of_data: 5,
        eps_cagr_full: Some(0.30),
        ..Default::default()
    };
    let slow = stock_analyzer::models::SummaryMetrics {
        years_of_data: 5,
        eps_cagr_full: Some(0.05),
        ..Default::default()
    };
    let unknown = stock_analyzer::models::SummaryMetrics {
        years_of_data: 1,
        ..Default::default()
    };

    db.manager.upsert_summary("SLOW", calc_date, &slow).await.unwrap();
    db.manager.upsert_summary("NONE", calc_date, &unknown).await.unwrap();
    db.manager.upsert_summary("FAST", calc_date, &fast).await.unwrap();

    let report = db.manager.summary_report_rows(calc_date).await.unwrap();
    let tickers: Vec<&str> = report.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["FAST", "SLOW", "NONE"]);
}
