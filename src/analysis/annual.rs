//! Annual time-series extraction: per-fiscal-year value maps from the
//! statement tables and price history, joined into YoY growth rows.

use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;

use crate::analysis::growth::yoy_growth;
use crate::models::{AnnualMetrics, TickerData};
use crate::statements::{line_items, StatementTable};

const MILLION: f64 = 1_000_000.0;

/// ROIC as a percentage per fiscal year. A year only resolves when both the
/// income statement and the balance sheet report it.
pub fn extract_annual_roic(
    income: &StatementTable,
    balance: &StatementTable,
) -> HashMap<i32, f64> {
    let balance_cols: HashMap<i32, usize> = balance.fiscal_years().into_iter().collect();

    let mut out = HashMap::new();
    for (year, income_col) in income.fiscal_years() {
        let Some(&balance_col) = balance_cols.get(&year) else {
            continue;
        };
        if let Some(roic) =
            super::fundamentals::statement_roic(income, balance, income_col, balance_col)
        {
            out.insert(year, roic * 100.0);
        }
    }
    out
}

/// Book value per share per fiscal year: equity / shares, shares > 0.
pub fn extract_bvps(balance: &StatementTable) -> HashMap<i32, f64> {
    let mut out = HashMap::new();
    for (year, col) in balance.fiscal_years() {
        let equity = balance.value(line_items::STOCKHOLDERS_EQUITY, col);
        let shares = balance.value(line_items::SHARES_OUTSTANDING, col);
        if let (Some(eq), Some(sh)) = (equity, shares) {
            if sh > 0.0 {
                out.insert(year, eq / sh);
            }
        }
    }
    out
}

/// EPS per fiscal year: the reported Basic/Diluted EPS line, falling back to
/// net income over same-year balance-sheet shares.
pub fn extract_eps(income: &StatementTable, balance: &StatementTable) -> HashMap<i32, f64> {
    let balance_cols: HashMap<i32, usize> = balance.fiscal_years().into_iter().collect();

    let mut out = HashMap::new();
    for (year, income_col) in income.fiscal_years() {
        if let Some(eps) = income.value(line_items::EPS, income_col) {
            out.insert(year, eps);
            continue;
        }
        let net_income = income.value(line_items::NET_INCOME, income_col);
        let shares = balance_cols
            .get(&year)
            .and_then(|&col| balance.value(line_items::SHARES_OUTSTANDING, col));
        if let (Some(ni), Some(sh)) = (net_income, shares) {
            if sh > 0.0 {
                out.insert(year, ni / sh);
            }
        }
    }
    out
}

/// Total revenue per fiscal year, in millions.
pub fn extract_revenue(income: &StatementTable) -> HashMap<i32, f64> {
    let mut out = HashMap::new();
    for (year, col) in income.fiscal_years() {
        if let Some(rev) = income.value(line_items::TOTAL_REVENUE, col) {
            out.insert(year, rev / MILLION);
        }
    }
    out
}

/// Free cash flow per fiscal year, in millions.
pub fn extract_fcf(cashflow: &StatementTable) -> HashMap<i32, f64> {
    let mut out = HashMap::new();
    for (year, col) in cashflow.fiscal_years() {
        if let Some(fcf) = cashflow.value(line_items::FREE_CASH_FLOW, col) {
            out.insert(year, fcf / MILLION);
        }
    }
    out
}

/// Mean daily close per calendar year, restricted to the given fiscal years.
pub fn average_prices(
    history: &[(chrono::NaiveDate, f64)],
    years: &BTreeSet<i32>,
) -> HashMap<i32, f64> {
    let mut sums: HashMap<i32, (f64, u32)> = HashMap::new();
    for (date, close) in history {
        let year = date.year();
        if years.contains(&year) && close.is_finite() {
            let entry = sums.entry(year).or_insert((0.0, 0));
            entry.0 += close;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

/// Build the per-year metric rows, ascending by fiscal year, with YoY growth
/// against the immediately preceding row in the sequence (gaps allowed).
pub fn build_annual_rows(data: &TickerData) -> Vec<AnnualMetrics> {
    let roic = extract_annual_roic(&data.income, &data.balance);
    let bvps = extract_bvps(&data.balance);
    let eps = extract_eps(&data.income, &data.balance);
    let revenue = extract_revenue(&data.income);
    let fcf = extract_fcf(&data.cashflow);

    // Known years: union over the statement-derived series
    let years: BTreeSet<i32> = roic
        .keys()
        .chain(bvps.keys())
        .chain(eps.keys())
        .chain(revenue.keys())
        .chain(fcf.keys())
        .copied()
        .collect();

    let avg_price = average_prices(&data.price_history, &years);
    let avg_pe: HashMap<i32, f64> = avg_price
        .iter()
        .filter_map(|(&year, &price)| {
            let e = *eps.get(&year)?;
            (e > 0.0).then(|| (year, price / e))
        })
        .collect();

    let mut rows: Vec<AnnualMetrics> = Vec::with_capacity(years.len());
    for year in years {
        let mut row = AnnualMetrics {
            fiscal_year: year,
            roic_pct: roic.get(&year).copied(),
            book_value_per_share: bvps.get(&year).copied(),
            earnings_per_share: eps.get(&year).copied(),
            revenue_mil: revenue.get(&year).copied(),
            fcf_mil: fcf.get(&year).copied(),
            avg_share_price: avg_price.get(&year).copied(),
            avg_pe: avg_pe.get(&year).copied(),
            ..Default::default()
        };
        if let Some(prev) = rows.last() {
            row.roic_yoy = yoy_growth(row.roic_pct, prev.roic_pct);
            row.bvps_yoy = yoy_growth(row.book_value_per_share, prev.book_value_per_share);
            row.eps_yoy = yoy_growth(row.earnings_per_share, prev.earnings_per_share);
            row.revenue_yoy = yoy_growth(row.revenue_mil, prev.revenue_mil);
            row.fcf_yoy = yoy_growth(row.fcf_mil, prev.fcf_mil);
            row.price_yoy = yoy_growth(row.avg_share_price, prev.avg_share_price);
            row.pe_yoy = yoy_growth(row.avg_pe, prev.avg_pe);
        }
        rows.push(row);
    }
    rows
}
