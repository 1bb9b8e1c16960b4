//! Year-over-year growth, CAGR, and the per-run growth summary combining
//! annual history with trailing-twelve-month values and snapshot ratios.

use chrono::{Datelike, Duration, NaiveDate};

use crate::analysis::fundamentals::statement_roic;
use crate::models::{AnnualMetrics, SummaryMetrics, TickerData};
use crate::statements::{line_items, sanitize};

const MILLION: f64 = 1_000_000.0;

/// Year-over-year growth: `(current - prior) / |prior|`.
///
/// `None` if either value is absent or the prior is exactly zero. The
/// absolute-value denominator keeps the sign meaningful when the prior is
/// negative (a loss shrinking toward zero is positive growth).
pub fn yoy_growth(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (c, p) = (current?, prior?);
    if p == 0.0 {
        return None;
    }
    sanitize(Some((c - p) / p.abs()))
}

/// Compound annual growth rate: `(end/start)^(1/years) - 1`.
///
/// Requires start > 0, end > 0, years > 0; otherwise `None`. Negative or
/// zero endpoints have no meaningful geometric growth rate.
pub fn calculate_cagr(start: Option<f64>, end: Option<f64>, years: Option<f64>) -> Option<f64> {
    let (start, end, years) = (start?, end?, years?);
    if start <= 0.0 || end <= 0.0 || years <= 0.0 {
        return None;
    }
    sanitize(Some((end / start).powf(1.0 / years) - 1.0))
}

/// Trailing-twelve-month values in the same units as the annual rows.
#[derive(Debug, Clone, Default)]
pub struct TtmValues {
    pub roic_pct: Option<f64>,
    pub bvps: Option<f64>,
    pub eps: Option<f64>,
    pub revenue_mil: Option<f64>,
    pub fcf_mil: Option<f64>,
    pub price: Option<f64>,
    pub pe: Option<f64>,
}

/// Extract TTM values from the snapshot and the latest statement columns.
pub fn extract_ttm(data: &TickerData) -> TtmValues {
    let snap = &data.snapshot;

    // Statement-based ROIC for the latest period, ROE as the stand-in
    let roic_pct = match (data.income.latest_col(), data.balance.latest_col()) {
        (Some(ic), Some(bc)) => statement_roic(&data.income, &data.balance, ic, bc),
        _ => None,
    }
    .or_else(|| sanitize(snap.return_on_equity))
    .map(|r| r * 100.0);

    TtmValues {
        roic_pct,
        bvps: sanitize(snap.book_value),
        eps: sanitize(snap.trailing_eps),
        revenue_mil: sanitize(snap.total_revenue).map(|v| v / MILLION),
        fcf_mil: sanitize(snap.free_cash_flow).map(|v| v / MILLION),
        price: sanitize(snap.price()),
        pe: sanitize(snap.trailing_pe),
    }
}

/// Snapshot health ratios for the summary record.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRatios {
    pub roa_pct: Option<f64>,
    pub roe_pct: Option<f64>,
    pub dividends_ttm: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
}

/// Extract snapshot ratios. Dividends prefer the provider's forward rate,
/// falling back to dividend events paid in the trailing twelve months; a
/// zero sum counts as no dividend.
pub fn extract_snapshot(data: &TickerData, today: NaiveDate) -> SnapshotRatios {
    let snap = &data.snapshot;

    let dividends_ttm = sanitize(snap.dividend_rate).or_else(|| {
        let cutoff = today - Duration::days(365);
        let total: f64 = data
            .dividends
            .iter()
            .filter(|(date, _)| *date >= cutoff)
            .map(|(_, amount)| amount)
            .sum();
        (total > 0.0).then_some(total)
    });

    let (total_liabilities, quick_ratio) = match data.balance.latest_col() {
        Some(col) => {
            let liabilities = data.balance.value(line_items::TOTAL_LIABILITIES, col);
            let quick = {
                let ca = data.balance.value(line_items::CURRENT_ASSETS, col);
                let cl = data.balance.value(line_items::CURRENT_LIABILITIES, col);
                let inv = data.balance.value(line_items::INVENTORY, col).unwrap_or(0.0);
                match (ca, cl) {
                    (Some(ca), Some(cl)) if cl > 0.0 => Some((ca - inv) / cl),
                    _ => None,
                }
            };
            (liabilities, quick)
        }
        None => (None, None),
    };

    SnapshotRatios {
        roa_pct: sanitize(snap.return_on_assets).map(|v| v * 100.0),
        roe_pct: sanitize(snap.return_on_equity).map(|v| v * 100.0),
        dividends_ttm,
        dividend_yield_pct: sanitize(snap.dividend_yield).map(|v| v * 100.0),
        total_liabilities,
        debt_to_equity: sanitize(snap.debt_to_equity),
        current_ratio: sanitize(snap.current_ratio),
        quick_ratio,
    }
}

/// Assemble the per-run growth summary.
///
/// Full-history CAGRs span the earliest to the latest annual row. The recent
/// window anchors on the second-to-last annual row (the literal record, even
/// across fiscal-year gaps) and ends at the TTM value, with the year count
/// taken against the current calendar year.
pub fn build_summary(data: &TickerData, rows: &[AnnualMetrics], today: NaiveDate) -> SummaryMetrics {
    let ttm = extract_ttm(data);
    let ratios = extract_snapshot(data, today);

    let mut summary = SummaryMetrics {
        years_of_data: rows.len() as i32,
        roic_ttm: ttm.roic_pct,
        bvps_ttm: ttm.bvps,
        eps_ttm: ttm.eps,
        revenue_ttm_mil: ttm.revenue_mil,
        fcf_ttm_mil: ttm.fcf_mil,
        price_current: ttm.price,
        pe_ttm: ttm.pe,
        roa_pct: ratios.roa_pct,
        roe_pct: ratios.roe_pct,
        dividends_ttm: ratios.dividends_ttm,
        dividend_yield_pct: ratios.dividend_yield_pct,
        total_liabilities: ratios.total_liabilities,
        debt_to_equity: ratios.debt_to_equity,
        current_ratio: ratios.current_ratio,
        quick_ratio: ratios.quick_ratio,
        ..Default::default()
    };

    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return summary;
    };

    let span = Some((last.fiscal_year - first.fiscal_year) as f64);
    summary.roic_cagr_full = calculate_cagr(first.roic_pct, last.roic_pct, span);
    summary.bvps_cagr_full =
        calculate_cagr(first.book_value_per_share, last.book_value_per_share, span);
    summary.eps_cagr_full =
        calculate_cagr(first.earnings_per_share, last.earnings_per_share, span);
    summary.revenue_cagr_full = calculate_cagr(first.revenue_mil, last.revenue_mil, span);
    summary.fcf_cagr_full = calculate_cagr(first.fcf_mil, last.fcf_mil, span);
    summary.price_cagr_full =
        calculate_cagr(first.avg_share_price, last.avg_share_price, span);
    summary.pe_cagr_full = calculate_cagr(first.avg_pe, last.avg_pe, span);

    if rows.len() >= 2 {
        let anchor = &rows[rows.len() - 2];
        let years = (today.year() - anchor.fiscal_year) as f64;
        if years > 0.0 {
            let years = Some(years);
            summary.roic_cagr_recent = calculate_cagr(anchor.roic_pct, ttm.roic_pct, years);
            summary.bvps_cagr_recent =
                calculate_cagr(anchor.book_value_per_share, ttm.bvps, years);
            summary.eps_cagr_recent = calculate_cagr(anchor.earnings_per_share, ttm.eps, years);
            summary.revenue_cagr_recent =
                calculate_cagr(anchor.revenue_mil, ttm.revenue_mil, years);
            summary.fcf_cagr_recent = calculate_cagr(anchor.fcf_mil, ttm.fcf_mil, years);
            summary.price_cagr_recent = calculate_cagr(anchor.avg_share_price, ttm.price, years);
            summary.pe_cagr_recent = calculate_cagr(anchor.avg_pe, ttm.pe, years);
        }
    }

    summary
}
