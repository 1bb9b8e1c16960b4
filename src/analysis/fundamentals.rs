//! Point-in-time metric derivation for a single ticker's latest data:
//! ROIC, Piotroski F-Score, earnings/FCF yield and snapshot pass-throughs.

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DailyMetrics, TickerData};
use crate::statements::{line_items, sanitize, StatementTable};

/// Statement-based ROIC as a fraction: EBIT / (TotalAssets - CurrentLiabilities - Cash).
///
/// Cash defaults to zero when absent. Invested capital must be strictly
/// positive. This is a best-effort estimate, not exact capital-structure
/// accounting.
pub fn statement_roic(
    income: &StatementTable,
    balance: &StatementTable,
    income_col: usize,
    balance_col: usize,
) -> Option<f64> {
    let ebit = income.value(line_items::EBIT, income_col)?;
    let total_assets = balance.value(line_items::TOTAL_ASSETS, balance_col)?;
    let current_liabilities = balance.value(line_items::CURRENT_LIABILITIES, balance_col)?;
    let cash = balance.value(line_items::CASH, balance_col).unwrap_or(0.0);

    let invested_capital = total_assets - current_liabilities - cash;
    if invested_capital > 0.0 {
        Some(ebit / invested_capital)
    } else {
        None
    }
}

/// ROIC for the latest period, falling back to snapshot ROE (as a fraction)
/// when the statement-based calculation does not resolve.
pub fn calculate_roic(data: &TickerData) -> Option<f64> {
    if !data.income.is_empty() && !data.balance.is_empty() {
        if let (Some(income_col), Some(balance_col)) =
            (data.income.latest_col(), data.balance.latest_col())
        {
            if let Some(roic) = statement_roic(&data.income, &data.balance, income_col, balance_col)
            {
                return Some(roic);
            }
        }
        debug!("ROIC from statements failed, falling back to ROE");
    }
    sanitize(data.snapshot.return_on_equity)
}

/// True when `num_curr/den_curr > num_prev/den_prev` with all four inputs
/// strictly positive. Used by the ratio-improvement Piotroski tests.
fn ratio_improved(
    num_curr: Option<f64>,
    den_curr: Option<f64>,
    num_prev: Option<f64>,
    den_prev: Option<f64>,
) -> bool {
    match (num_curr, den_curr, num_prev, den_prev) {
        (Some(nc), Some(dc), Some(np), Some(dp))
            if nc > 0.0 && dc > 0.0 && np > 0.0 && dp > 0.0 =>
        {
            nc / dc > np / dp
        }
        _ => false,
    }
}

/// Piotroski F-Score: nine independent binary tests, 0-9.
///
/// Tests that compare against the prior fiscal year require at least two
/// periods in both the income statement and the balance sheet; otherwise
/// they contribute 0. A test that cannot resolve its inputs contributes 0,
/// never an error.
pub fn calculate_piotroski(data: &TickerData) -> i32 {
    let income = &data.income;
    let balance = &data.balance;
    let cashflow = &data.cashflow;
    let mut score = 0;

    let has_multi_year = income.period_count() >= 2 && balance.period_count() >= 2;
    let inc_curr = income.latest_col();
    let inc_prev = income.prior_col();
    let bal_curr = balance.latest_col();
    let bal_prev = balance.prior_col();

    let at = |table: &StatementTable, keys: &[&str], col: Option<usize>| -> Option<f64> {
        col.and_then(|c| table.value(keys, c))
    };

    // ---- Profitability (4 points) ----

    // 1. Positive ROA
    if sanitize(data.snapshot.return_on_assets).map_or(false, |roa| roa > 0.0) {
        score += 1;
    }

    // 2. Positive operating cash flow
    let ocf = at(cashflow, line_items::OPERATING_CASH_FLOW, cashflow.latest_col());
    if ocf.map_or(false, |v| v > 0.0) {
        score += 1;
    }

    // 3. ROA improving vs prior year
    if has_multi_year
        && ratio_improved(
            at(income, line_items::NET_INCOME, inc_curr),
            at(balance, line_items::TOTAL_ASSETS, bal_curr),
            at(income, line_items::NET_INCOME, inc_prev),
            at(balance, line_items::TOTAL_ASSETS, bal_prev),
        )
    {
        score += 1;
    }

    // 4. Cash flow from operations > net income (accrual quality)
    let net_income = at(income, line_items::NET_INCOME, inc_curr);
    if let (Some(ocf), Some(ni)) = (ocf, net_income) {
        if ocf > ni {
            score += 1;
        }
    }

    // ---- Leverage, liquidity (3 points) ----

    // 5. Long-term debt not increasing
    if has_multi_year {
        let debt_curr = at(balance, line_items::LONG_TERM_DEBT, bal_curr);
        let debt_prev = at(balance, line_items::LONG_TERM_DEBT, bal_prev);
        if let (Some(curr), Some(prev)) = (debt_curr, debt_prev) {
            if curr <= prev {
                score += 1;
            }
        }
    }

    // 6. Improving current ratio
    if has_multi_year
        && ratio_improved(
            at(balance, line_items::CURRENT_ASSETS, bal_curr),
            at(balance, line_items::CURRENT_LIABILITIES, bal_curr),
            at(balance, line_items::CURRENT_ASSETS, bal_prev),
            at(balance, line_items::CURRENT_LIABILITIES, bal_prev),
        )
    {
        score += 1;
    }

    // 7. No share dilution
    if has_multi_year {
        let shares_curr = at(balance, line_items::SHARES_OUTSTANDING, bal_curr);
        let shares_prev = at(balance, line_items::SHARES_OUTSTANDING, bal_prev);
        if let (Some(curr), Some(prev)) = (shares_curr, shares_prev) {
            if curr <= prev {
                score += 1;
            }
        }
    }

    // ---- Operating efficiency (2 points) ----

    // 8. Improving gross margin
    if has_multi_year
        && ratio_improved(
            at(income, line_items::GROSS_PROFIT, inc_curr),
            at(income, line_items::TOTAL_REVENUE, inc_curr),
            at(income, line_items::GROSS_PROFIT, inc_prev),
            at(income, line_items::TOTAL_REVENUE, inc_prev),
        )
    {
        score += 1;
    }

    // 9. Improving asset turnover
    if has_multi_year
        && ratio_improved(
            at(income, line_items::TOTAL_REVENUE, inc_curr),
            at(balance, line_items::TOTAL_ASSETS, bal_curr),
            at(income, line_items::TOTAL_REVENUE, inc_prev),
            at(balance, line_items::TOTAL_ASSETS, bal_prev),
        )
    {
        score += 1;
    }

    score
}

/// EBITDA / enterprise value; absent unless both are present and EV > 0.
pub fn earnings_yield(ebitda: Option<f64>, enterprise_value: Option<f64>) -> Option<f64> {
    match (sanitize(ebitda), sanitize(enterprise_value)) {
        (Some(e), Some(ev)) if ev > 0.0 => Some(e / ev),
        _ => None,
    }
}

/// Free cash flow / market cap; absent unless both are present and cap > 0.
pub fn fcf_yield(free_cash_flow: Option<f64>, market_cap: Option<f64>) -> Option<f64> {
    match (sanitize(free_cash_flow), sanitize(market_cap)) {
        (Some(fcf), Some(cap)) if cap > 0.0 => Some(fcf / cap),
        _ => None,
    }
}

/// Build the full point-in-time metrics record for one ticker.
///
/// Rank, composite score and signal are left empty; they are filled in by the
/// cross-sectional pass once the whole day's cohort exists.
pub fn build_daily_metrics(ticker: &str, calc_date: NaiveDate, data: &TickerData) -> DailyMetrics {
    let snap = &data.snapshot;

    DailyMetrics {
        ticker: ticker.to_string(),
        calc_date,
        company_name: snap.company_name.clone(),
        sector: snap.sector.clone(),
        industry: snap.industry.clone(),
        price: sanitize(snap.price()),
        market_cap: sanitize(snap.market_cap),
        enterprise_value: sanitize(snap.enterprise_value),
        trailing_pe: sanitize(snap.trailing_pe),
        forward_pe: sanitize(snap.forward_pe),
        price_to_book: sanitize(snap.price_to_book),
        ev_to_ebitda: sanitize(snap.ev_to_ebitda),
        earnings_yield: earnings_yield(snap.ebitda, snap.enterprise_value),
        fcf_yield: fcf_yield(snap.free_cash_flow, snap.market_cap),
        roic: calculate_roic(data),
        roe: sanitize(snap.return_on_equity),
        roa: sanitize(snap.return_on_assets),
        gross_margin: sanitize(snap.gross_margins),
        operating_margin: sanitize(snap.operating_margins),
        net_margin: sanitize(snap.profit_margins),
        debt_to_equity: sanitize(snap.debt_to_equity),
        current_ratio: sanitize(snap.current_ratio),
        revenue_growth: sanitize(snap.revenue_growth),
        earnings_growth: sanitize(snap.earnings_growth),
        piotroski_score: calculate_piotroski(data),
        magic_formula_rank: None,
        composite_score: None,
        signal: None,
    }
}
