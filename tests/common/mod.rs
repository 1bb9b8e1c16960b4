//! Common test utilities and helpers

pub mod database;

pub use database::TestDatabase;

/// Test data builders
pub mod test_data {
    use chrono::NaiveDate;
    use stock_analyzer::models::{TickerData, TickerSnapshot};
    use stock_analyzer::statements::StatementTable;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A snapshot with sensible, complete values.
    pub fn snapshot(company_name: &str) -> TickerSnapshot {
        TickerSnapshot {
            company_name: company_name.to_string(),
            sector: Some("Technology".to_string()),
            industry: Some("Software".to_string()),
            regular_market_price: Some(100.0),
            current_price: Some(100.0),
            market_cap: Some(10_000_000_000.0),
            enterprise_value: Some(11_000_000_000.0),
            ebitda: Some(1_100_000_000.0),
            free_cash_flow: Some(800_000_000.0),
            trailing_pe: Some(20.0),
            forward_pe: Some(18.0),
            price_to_book: Some(4.0),
            ev_to_ebitda: Some(10.0),
            return_on_equity: Some(0.22),
            return_on_assets: Some(0.11),
            gross_margins: Some(0.55),
            operating_margins: Some(0.25),
            profit_margins: Some(0.18),
            debt_to_equity: Some(60.0),
            current_ratio: Some(1.8),
            revenue_growth: Some(0.12),
            earnings_growth: Some(0.15),
            dividend_rate: Some(1.2),
            dividend_yield: Some(0.012),
            book_value: Some(25.0),
            trailing_eps: Some(5.0),
            total_revenue: Some(6_000_000_000.0),
        }
    }

    /// Two fiscal years (2023, 2024) of consistent statement data where the
    /// company improves on every dimension.
    pub fn two_year_statements() -> (StatementTable, StatementTable, StatementTable) {
        let periods = vec![date(2024, 12, 31), date(2023, 12, 31)];

        let mut income = StatementTable::new(periods.clone());
        income.insert_row("Total Revenue", vec![Some(6.0e9), Some(5.0e9)]);
        income.insert_row("Gross Profit", vec![Some(3.3e9), Some(2.5e9)]);
        income.insert_row("EBIT", vec![Some(1.5e9), Some(1.1e9)]);
        income.insert_row("Net Income", vec![Some(1.0e9), Some(0.7e9)]);
        income.insert_row("Basic EPS", vec![Some(5.0), Some(3.5)]);

        let mut balance = StatementTable::new(periods.clone());
        balance.insert_row("Total Assets", vec![Some(12.0e9), Some(11.5e9)]);
        balance.insert_row("Current Assets", vec![Some(4.0e9), Some(3.5e9)]);
        balance.insert_row("Current Liabilities", vec![Some(2.0e9), Some(2.2e9)]);
        balance.insert_row("Cash And Cash Equivalents", vec![Some(1.5e9), Some(1.2e9)]);
        balance.insert_row("Long Term Debt", vec![Some(2.5e9), Some(3.0e9)]);
        balance.insert_row("Ordinary Shares Number", vec![Some(2.0e8), Some(2.0e8)]);
        balance.insert_row("Stockholders Equity", vec![Some(5.0e9), Some(4.2e9)]);
        balance.insert_row(
            "Total Liabilities Net Minority Interest",
            vec![Some(7.0e9), Some(7.3e9)],
        );
        balance.insert_row("Inventory", vec![Some(0.4e9), Some(0.5e9)]);

        let mut cashflow = StatementTable::new(periods);
        cashflow.insert_row("Operating Cash Flow", vec![Some(1.4e9), Some(1.0e9)]);
        cashflow.insert_row("Free Cash Flow", vec![Some(0.8e9), Some(0.6e9)]);

        (income, balance, cashflow)
    }

    /// Complete ticker data for a healthy, growing company.
    pub fn healthy_ticker(company_name: &str) -> TickerData {
        let (income, balance, cashflow) = two_year_statements();
        TickerData {
            snapshot: snapshot(company_name),
            income,
            balance,
            cashflow,
            price_history: vec![
                (date(2023, 3, 1), 70.0),
                (date(2023, 9, 1), 80.0),
                (date(2024, 3, 1), 90.0),
                (date(2024, 9, 1), 100.0),
            ],
            dividends: vec![(date(2024, 6, 1), 0.30), (date(2024, 12, 1), 0.30)],
        }
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn init_test_logging() {
        INIT.call_once(|| {
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("stock_analyzer=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }
}
