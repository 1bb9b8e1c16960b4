//! Annual-series and growth-summary behavior over the shared fixture.

use pretty_assertions::assert_eq;

use crate::common::test_data;
use stock_analyzer::analysis::{build_annual_rows, build_summary};

#[test]
fn fixture_produces_two_annual_rows_with_growth() {
    let data = test_data::healthy_ticker("Fixture Corp");
    let rows = build_annual_rows(&data);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fiscal_year, 2023);
    assert_eq!(rows[1].fiscal_year, 2024);

    // Revenue 5000 -> 6000 (millions): 20% growth
    assert_eq!(rows[0].revenue_mil, Some(5000.0));
    assert_eq!(rows[1].revenue_mil, Some(6000.0));
    let g = rows[1].revenue_yoy.unwrap();
    assert!((g - 0.2).abs() < 1e-12);

    // EPS comes straight from the Basic EPS line
    assert_eq!(rows[0].earnings_per_share, Some(3.5));
    assert_eq!(rows[1].earnings_per_share, Some(5.0));

    // Average prices group by calendar year
    assert_eq!(rows[0].avg_share_price, Some(75.0));
    assert_eq!(rows[1].avg_share_price, Some(95.0));
    // Avg P/E = 95 / 5
    assert_eq!(rows[1].avg_pe, Some(19.0));

    // First row never has YoY values
    assert_eq!(rows[0].eps_yoy, None);
}

#[test]
fn summary_combines_annual_history_with_ttm() {
    let data = test_data::healthy_ticker("Fixture Corp");
    let rows = build_annual_rows(&data);
    let summary = build_summary(&data, &rows, test_data::date(2025, 3, 1));

    assert_eq!(summary.years_of_data, 2);

    // EPS 3.5 -> 5.0 over one year
    let g = summary.eps_cagr_full.unwrap();
    assert!((g - (5.0 / 3.5 - 1.0)).abs() < 1e-9);

    // Recent window: 2023 row (EPS 3.5) to TTM EPS 5.0 over 2 years
    let g = summary.eps_cagr_recent.unwrap();
    assert!((g - ((5.0f64 / 3.5).sqrt() - 1.0)).abs() < 1e-9);

    // TTM values from the snapshot
    assert_eq!(summary.eps_ttm, Some(5.0));
    assert_eq!(summary.revenue_ttm_mil, Some(6000.0));
    assert_eq!(summary.price_current, Some(100.0));

    // Snapshot health ratios
    assert_eq!(summary.roe_pct, Some(22.0));
    assert_eq!(summary.dividends_ttm, Some(1.2));
    assert_eq!(summary.total_liabilities, Some(7.0e9));
    // Quick ratio: (4.0e9 - 0.4e9) / 2.0e9
    assert_eq!(summary.quick_ratio, Some(1.8));
}
