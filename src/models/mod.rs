use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::statements::StatementTable;

/// Buy/hold/sell signal derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Hold,
    Sell,
}

impl Signal {
    /// Composite >= 70 is a BUY, <= 30 a SELL, anything between a HOLD.
    /// Both boundaries are inclusive.
    pub fn from_composite(score: f64) -> Self {
        if score >= 70.0 {
            Signal::Buy
        } else if score <= 30.0 {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Signal::Buy),
            "HOLD" => Some(Signal::Hold),
            "SELL" => Some(Signal::Sell),
            _ => None,
        }
    }
}

/// Weights for the six composite-score dimensions.
///
/// No normalization is enforced; keeping the sum near 1.0 is the operator's
/// responsibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub magic_formula: f64,
    pub piotroski: f64,
    pub fcf_yield: f64,
    pub debt_to_equity: f64,
    pub revenue_growth: f64,
    pub gross_margin: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            magic_formula: 0.30,
            piotroski: 0.25,
            fcf_yield: 0.15,
            debt_to_equity: 0.10,
            revenue_growth: 0.10,
            gross_margin: 0.10,
        }
    }
}

/// Configuration for the analyzer binaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub tickers_file: String,
    pub delay_seconds: f64,
    pub weights: ScoreWeights,
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "stocks.db".to_string()),
            tickers_file: std::env::var("TICKERS_FILE")
                .unwrap_or_else(|_| "tickers.txt".to_string()),
            delay_seconds: env_f64("DELAY_SECONDS", 1.5),
            weights: ScoreWeights {
                magic_formula: env_f64("W_MAGIC_FORMULA", 0.30),
                piotroski: env_f64("W_PIOTROSKI", 0.25),
                fcf_yield: env_f64("W_FCF_YIELD", 0.15),
                debt_to_equity: env_f64("W_DEBT_EQUITY", 0.10),
                revenue_growth: env_f64("W_REVENUE_GROWTH", 0.10),
                gross_margin: env_f64("W_GROSS_MARGIN", 0.10),
            },
        })
    }
}

/// Most-recent-period scalar fields from the provider's summary view.
///
/// Everything numeric is optional; downstream math treats absence as a
/// first-class value and never substitutes zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub regular_market_price: Option<f64>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub dividend_rate: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub book_value: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub total_revenue: Option<f64>,
}

impl TickerSnapshot {
    /// Best available price: the live price, falling back to the regular
    /// market price.
    pub fn price(&self) -> Option<f64> {
        self.current_price.or(self.regular_market_price)
    }
}

/// Everything fetched for one ticker in one pass.
#[derive(Debug, Clone, Default)]
pub struct TickerData {
    pub snapshot: TickerSnapshot,
    /// Income-statement-like table ("financials")
    pub income: StatementTable,
    pub balance: StatementTable,
    pub cashflow: StatementTable,
    /// Daily closing prices, bounded retrospective window
    pub price_history: Vec<(NaiveDate, f64)>,
    /// Dividend events (ex-date, amount)
    pub dividends: Vec<(NaiveDate, f64)>,
}

/// Point-in-time valuation/quality/health/growth metrics for one ticker on
/// one calculation date. Rank, composite and signal stay empty until the
/// cross-sectional pass runs over the full day's cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub ticker: String,
    pub calc_date: NaiveDate,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    // Valuation
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub fcf_yield: Option<f64>,
    // Quality
    pub roic: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    // Health
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    // Growth
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    // Scores
    pub piotroski_score: i32,
    pub magic_formula_rank: Option<i64>,
    pub composite_score: Option<f64>,
    pub signal: Option<Signal>,
}

/// One fiscal year of annual metrics for a ticker, with YoY growth against
/// the previous year present in the series (gaps allowed).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnualMetrics {
    pub fiscal_year: i32,
    pub roic_pct: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub revenue_mil: Option<f64>,
    pub fcf_mil: Option<f64>,
    pub avg_share_price: Option<f64>,
    pub avg_pe: Option<f64>,
    pub roic_yoy: Option<f64>,
    pub bvps_yoy: Option<f64>,
    pub eps_yoy: Option<f64>,
    pub revenue_yoy: Option<f64>,
    pub fcf_yoy: Option<f64>,
    pub price_yoy: Option<f64>,
    pub pe_yoy: Option<f64>,
}

/// Per-run growth summary for a ticker: CAGRs over the full annual history
/// and over the recent window (second-to-last fiscal year to TTM), plus TTM
/// values and snapshot health ratios.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub years_of_data: i32,
    pub roic_cagr_full: Option<f64>,
    pub bvps_cagr_full: Option<f64>,
    pub eps_cagr_full: Option<f64>,
    pub revenue_cagr_full: Option<f64>,
    pub fcf_cagr_full: Option<f64>,
    pub price_cagr_full: Option<f64>,
    pub pe_cagr_full: Option<f64>,
    pub roic_cagr_recent: Option<f64>,
    pub bvps_cagr_recent: Option<f64>,
    pub eps_cagr_recent: Option<f64>,
    pub revenue_cagr_recent: Option<f64>,
    pub fcf_cagr_recent: Option<f64>,
    pub price_cagr_recent: Option<f64>,
    pub pe_cagr_recent: Option<f64>,
    pub roic_ttm: Option<f64>,
    pub bvps_ttm: Option<f64>,
    pub eps_ttm: Option<f64>,
    pub revenue_ttm_mil: Option<f64>,
    pub fcf_ttm_mil: Option<f64>,
    pub price_current: Option<f64>,
    pub pe_ttm: Option<f64>,
    pub roa_pct: Option<f64>,
    pub roe_pct: Option<f64>,
    pub dividends_ttm: Option<f64>,
    pub dividend_yield_pct: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
}
