use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Line-item name candidates for statement lookups.
///
/// Providers are inconsistent about naming, so every lookup goes through an
/// ordered candidate list and takes the first row that resolves.
pub mod line_items {
    pub const EBIT: &[&str] = &["EBIT", "Operating Income"];
    pub const TOTAL_ASSETS: &[&str] = &["Total Assets"];
    pub const CURRENT_LIABILITIES: &[&str] = &["Current Liabilities", "Total Current Liabilities"];
    pub const CURRENT_ASSETS: &[&str] = &["Current Assets", "Total Current Assets"];
    pub const CASH: &[&str] = &[
        "Cash And Cash Equivalents",
        "Cash Cash Equivalents And Short Term Investments",
    ];
    pub const LONG_TERM_DEBT: &[&str] = &[
        "Long Term Debt",
        "Long Term Debt And Capital Lease Obligation",
    ];
    pub const SHARES_OUTSTANDING: &[&str] = &["Ordinary Shares Number", "Share Issued"];
    pub const STOCKHOLDERS_EQUITY: &[&str] = &[
        "Stockholders Equity",
        "Total Equity Gross Minority Interest",
        "Common Stock Equity",
    ];
    pub const NET_INCOME: &[&str] = &["Net Income"];
    pub const TOTAL_REVENUE: &[&str] = &["Total Revenue"];
    pub const GROSS_PROFIT: &[&str] = &["Gross Profit"];
    pub const EPS: &[&str] = &["Basic EPS", "Diluted EPS"];
    pub const OPERATING_CASH_FLOW: &[&str] = &[
        "Operating Cash Flow",
        "Total Cash From Operating Activities",
    ];
    pub const FREE_CASH_FLOW: &[&str] = &["Free Cash Flow"];
    pub const TOTAL_LIABILITIES: &[&str] = &[
        "Total Liabilities Net Minority Interest",
        "Total Liab",
    ];
    pub const INVENTORY: &[&str] = &["Inventory"];
}

/// Drop NaN and infinite values, pass through everything else.
pub fn sanitize(val: Option<f64>) -> Option<f64> {
    val.filter(|v| v.is_finite())
}

/// A financial statement table: named line-item rows by reporting period.
///
/// Column order is whatever the provider delivered; nothing downstream may
/// assume newest-first or oldest-first. Period resolution always goes through
/// [`StatementTable::fiscal_years`], which inspects each column's date.
#[derive(Debug, Clone, Default)]
pub struct StatementTable {
    periods: Vec<NaiveDate>,
    rows: HashMap<String, Vec<Option<f64>>>,
}

impl StatementTable {
    pub fn new(periods: Vec<NaiveDate>) -> Self {
        Self {
            periods,
            rows: HashMap::new(),
        }
    }

    /// Insert a row of values aligned with the period columns. Values beyond
    /// the period count are dropped; short rows are padded with `None`.
    pub fn insert_row(&mut self, name: &str, mut values: Vec<Option<f64>>) {
        values.resize(self.periods.len(), None);
        self.rows.insert(name.to_string(), values);
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() || self.rows.is_empty()
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Look up a value by candidate row names at the given period column.
    ///
    /// Tries each candidate in order and returns the first present, finite
    /// value. A row that exists but is missing at this column does not stop
    /// the search. Returns `None` if nothing resolves.
    pub fn value(&self, keys: &[&str], col: usize) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        for key in keys {
            if let Some(row) = self.rows.get(*key) {
                if let Some(Some(v)) = row.get(col) {
                    if v.is_finite() {
                        return Some(*v);
                    }
                }
            }
        }
        None
    }

    /// Fiscal years present in this table as `(year, column index)` pairs,
    /// sorted oldest first. Resolved from each column's calendar date.
    pub fn fiscal_years(&self) -> Vec<(i32, usize)> {
        let mut years: Vec<(i32, usize)> = self
            .periods
            .iter()
            .enumerate()
            .map(|(i, d)| (d.year(), i))
            .collect();
        years.sort_by_key(|&(y, _)| y);
        years
    }

    /// Column index of the most recent fiscal period.
    pub fn latest_col(&self) -> Option<usize> {
        self.fiscal_years().last().map(|&(_, i)| i)
    }

    /// Column index of the second most recent fiscal period.
    pub fn prior_col(&self) -> Option<usize> {
        let years = self.fiscal_years();
        if years.len() >= 2 {
            Some(years[years.len() - 2].1)
        } else {
            None
        }
    }
}
