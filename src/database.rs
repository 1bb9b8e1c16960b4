use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

use crate::analysis::{CohortMetrics, RankedScore};
use crate::models::{AnnualMetrics, DailyMetrics, Signal, SummaryMetrics};

/// SQLite-backed store for the analyzer pipelines.
///
/// All writes are idempotent upserts keyed on the natural unique constraint
/// of each table, so re-running a pipeline for the same day overwrites
/// instead of duplicating.
pub struct DatabaseManager {
    pool: SqlitePool,
}

/// One row of the composite-score leaderboard.
#[derive(Debug, Clone)]
pub struct LeaderboardRow {
    pub ticker: String,
    pub company_name: String,
    pub composite_score: f64,
    pub magic_formula_rank: Option<i64>,
    pub signal: Option<Signal>,
}

/// One row of the growth-summary report.
#[derive(Debug, Clone)]
pub struct SummaryReportRow {
    pub ticker: String,
    pub years_of_data: i32,
    pub bvps_cagr_full: Option<f64>,
    pub eps_cagr_full: Option<f64>,
    pub revenue_cagr_full: Option<f64>,
    pub fcf_cagr_full: Option<f64>,
}

impl DatabaseManager {
    /// Open (creating if needed) the database and ensure the schema exists.
    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;

        let manager = Self { pool };
        manager.create_schema().await?;
        info!("💾 Database ready at {}", database_path);
        Ok(manager)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stocks (
                ticker TEXT PRIMARY KEY,
                company_name TEXT,
                sector TEXT,
                industry TEXT,
                updated_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                calc_date TEXT NOT NULL,
                price REAL,
                market_cap REAL,
                enterprise_value REAL,
                trailing_pe REAL,
                forward_pe REAL,
                price_to_book REAL,
                ev_to_ebitda REAL,
                earnings_yield REAL,
                fcf_yield REAL,
                roic REAL,
                roe REAL,
                roa REAL,
                gross_margin REAL,
                operating_margin REAL,
                net_margin REAL,
                debt_to_equity REAL,
                current_ratio REAL,
                revenue_growth REAL,
                earnings_growth REAL,
                piotroski_score INTEGER,
                magic_formula_rank INTEGER,
                composite_score REAL,
                signal TEXT,
                UNIQUE(ticker, calc_date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rule1_annual (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                fiscal_year INTEGER NOT NULL,
                roic_pct REAL,
                book_value_per_share REAL,
                earnings_per_share REAL,
                revenue_mil REAL,
                fcf_mil REAL,
                avg_share_price REAL,
                avg_pe REAL,
                roic_yoy REAL,
                bvps_yoy REAL,
                eps_yoy REAL,
                revenue_yoy REAL,
                fcf_yoy REAL,
                price_yoy REAL,
                pe_yoy REAL,
                UNIQUE(ticker, fiscal_year)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rule1_summary (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                calc_date TEXT NOT NULL,
                years_of_data INTEGER,
                roic_cagr_full REAL,
                bvps_cagr_full REAL,
                eps_cagr_full REAL,
                revenue_cagr_full REAL,
                fcf_cagr_full REAL,
                price_cagr_full REAL,
                pe_cagr_full REAL,
                roic_cagr_recent REAL,
                bvps_cagr_recent REAL,
                eps_cagr_recent REAL,
                revenue_cagr_recent REAL,
                fcf_cagr_recent REAL,
                price_cagr_recent REAL,
                pe_cagr_recent REAL,
                roic_ttm REAL,
                bvps_ttm REAL,
                eps_ttm REAL,
                revenue_ttm_mil REAL,
                fcf_ttm_mil REAL,
                price_current REAL,
                pe_ttm REAL,
                roa_pct REAL,
                roe_pct REAL,
                dividends_ttm REAL,
                dividend_yield_pct REAL,
                total_liabilities REAL,
                debt_to_equity REAL,
                current_ratio REAL,
                quick_ratio REAL,
                UNIQUE(ticker, calc_date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_stock(
        &self,
        ticker: &str,
        company_name: &str,
        sector: Option<&str>,
        industry: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stocks (ticker, company_name, sector, industry, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(ticker) DO UPDATE SET
                company_name = excluded.company_name,
                sector = excluded.sector,
                industry = excluded.industry,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(ticker)
        .bind(company_name)
        .bind(sector)
        .bind(industry)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_daily_metrics(&self, m: &DailyMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_metrics (
                ticker, calc_date, price, market_cap, enterprise_value,
                trailing_pe, forward_pe, price_to_book, ev_to_ebitda,
                earnings_yield, fcf_yield, roic, roe, roa,
                gross_margin, operating_margin, net_margin,
                debt_to_equity, current_ratio, revenue_growth, earnings_growth,
                piotroski_score, magic_formula_rank, composite_score, signal
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(ticker, calc_date) DO UPDATE SET
                price = excluded.price,
                market_cap = excluded.market_cap,
                enterprise_value = excluded.enterprise_value,
                trailing_pe = excluded.trailing_pe,
                forward_pe = excluded.forward_pe,
                price_to_book = excluded.price_to_book,
                ev_to_ebitda = excluded.ev_to_ebitda,
                earnings_yield = excluded.earnings_yield,
                fcf_yield = excluded.fcf_yield,
                roic = excluded.roic,
                roe = excluded.roe,
                roa = excluded.roa,
                gross_margin = excluded.gross_margin,
                operating_margin = excluded.operating_margin,
                net_margin = excluded.net_margin,
                debt_to_equity = excluded.debt_to_equity,
                current_ratio = excluded.current_ratio,
                revenue_growth = excluded.revenue_growth,
                earnings_growth = excluded.earnings_growth,
                piotroski_score = excluded.piotroski_score,
                magic_formula_rank = excluded.magic_formula_rank,
                composite_score = excluded.composite_score,
                signal = excluded.signal
            "#,
        )
        .bind(&m.ticker)
        .bind(m.calc_date)
        .bind(m.price)
        .bind(m.market_cap)
        .bind(m.enterprise_value)
        .bind(m.trailing_pe)
        .bind(m.forward_pe)
        .bind(m.price_to_book)
        .bind(m.ev_to_ebitda)
        .bind(m.earnings_yield)
        .bind(m.fcf_yield)
        .bind(m.roic)
        .bind(m.roe)
        .bind(m.roa)
        .bind(m.gross_margin)
        .bind(m.operating_margin)
        .bind(m.net_margin)
        .bind(m.debt_to_equity)
        .bind(m.current_ratio)
        .bind(m.revenue_growth)
        .bind(m.earnings_growth)
        .bind(m.piotroski_score)
        .bind(m.magic_formula_rank)
        .bind(m.composite_score)
        .bind(m.signal.map(|s| s.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read back the metrics the ranker needs for every ticker recorded on
    /// the given date.
    pub async fn daily_cohort(&self, calc_date: NaiveDate) -> Result<Vec<CohortMetrics>> {
        let rows = sqlx::query(
            r#"
            SELECT ticker, roic, earnings_yield, piotroski_score,
                   fcf_yield, debt_to_equity, revenue_growth, gross_margin
            FROM stock_metrics
            WHERE calc_date = ?
            ORDER BY ticker
            "#,
        )
        .bind(calc_date)
        .fetch_all(&self.pool)
        .await?;

        let cohort = rows
            .into_iter()
            .map(|row| {
                Ok(CohortMetrics {
                    ticker: row.try_get("ticker")?,
                    roic: row.try_get("roic")?,
                    earnings_yield: row.try_get("earnings_yield")?,
                    piotroski_score: row.try_get("piotroski_score")?,
                    fcf_yield: row.try_get("fcf_yield")?,
                    debt_to_equity: row.try_get("debt_to_equity")?,
                    revenue_growth: row.try_get("revenue_growth")?,
                    gross_margin: row.try_get("gross_margin")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(cohort)
    }

    /// Write rank, composite and signal back onto the day's metric rows.
    pub async fn apply_rankings(
        &self,
        calc_date: NaiveDate,
        scores: &[RankedScore],
    ) -> Result<()> {
        for score in scores {
            sqlx::query(
                r#"
                UPDATE stock_metrics
                SET magic_formula_rank = ?, composite_score = ?, signal = ?
                WHERE ticker = ? AND calc_date = ?
                "#,
            )
            .bind(score.magic_formula_rank)
            .bind(score.composite_score)
            .bind(score.signal.as_str())
            .bind(&score.ticker)
            .bind(calc_date)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn top_by_composite(
        &self,
        calc_date: NaiveDate,
        limit: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r#"
            SELECT m.ticker, COALESCE(s.company_name, m.ticker) AS company_name,
                   m.composite_score, m.magic_formula_rank, m.signal
            FROM stock_metrics m
            LEFT JOIN stocks s ON s.ticker = m.ticker
            WHERE m.calc_date = ? AND m.composite_score IS NOT NULL
            ORDER BY m.composite_score DESC
            LIMIT ?
            "#,
        )
        .bind(calc_date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let leaderboard = rows
            .into_iter()
            .map(|row| {
                let signal: Option<String> = row.try_get("signal")?;
                Ok(LeaderboardRow {
                    ticker: row.try_get("ticker")?,
                    company_name: row.try_get("company_name")?,
                    composite_score: row.try_get("composite_score")?,
                    magic_formula_rank: row.try_get("magic_formula_rank")?,
                    signal: signal.as_deref().and_then(Signal::parse),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(leaderboard)
    }

    /// Count of BUY/HOLD/SELL signals for the day, in that order.
    pub async fn signal_tally(&self, calc_date: NaiveDate) -> Result<(i64, i64, i64)> {
        let rows = sqlx::query(
            r#"
            SELECT signal, COUNT(*) AS n
            FROM stock_metrics
            WHERE calc_date = ? AND signal IS NOT NULL
            GROUP BY signal
            "#,
        )
        .bind(calc_date)
        .fetch_all(&self.pool)
        .await?;

        let mut tally = (0, 0, 0);
        for row in rows {
            let signal: String = row.try_get("signal")?;
            let n: i64 = row.try_get("n")?;
            match Signal::parse(&signal) {
                Some(Signal::Buy) => tally.0 = n,
                Some(Signal::Hold) => tally.1 = n,
                Some(Signal::Sell) => tally.2 = n,
                None => {}
            }
        }
        Ok(tally)
    }

    pub async fn upsert_annual(&self, ticker: &str, row: &AnnualMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rule1_annual (
                ticker, fiscal_year, roic_pct, book_value_per_share,
                earnings_per_share, revenue_mil, fcf_mil, avg_share_price, avg_pe,
                roic_yoy, bvps_yoy, eps_yoy, revenue_yoy, fcf_yoy, price_yoy, pe_yoy
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(ticker, fiscal_year) DO UPDATE SET
                roic_pct = excluded.roic_pct,
                book_value_per_share = excluded.book_value_per_share,
                earnings_per_share = excluded.earnings_per_share,
                revenue_mil = excluded.revenue_mil,
                fcf_mil = excluded.fcf_mil,
                avg_share_price = excluded.avg_share_price,
                avg_pe = excluded.avg_pe,
                roic_yoy = excluded.roic_yoy,
                bvps_yoy = excluded.bvps_yoy,
                eps_yoy = excluded.eps_yoy,
                revenue_yoy = excluded.revenue_yoy,
                fcf_yoy = excluded.fcf_yoy,
                price_yoy = excluded.price_yoy,
                pe_yoy = excluded.pe_yoy
            "#,
        )
        .bind(ticker)
        .bind(row.fiscal_year)
        .bind(row.roic_pct)
        .bind(row.book_value_per_share)
        .bind(row.earnings_per_share)
        .bind(row.revenue_mil)
        .bind(row.fcf_mil)
        .bind(row.avg_share_price)
        .bind(row.avg_pe)
        .bind(row.roic_yoy)
        .bind(row.bvps_yoy)
        .bind(row.eps_yoy)
        .bind(row.revenue_yoy)
        .bind(row.fcf_yoy)
        .bind(row.price_yoy)
        .bind(row.pe_yoy)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_summary(
        &self,
        ticker: &str,
        calc_date: NaiveDate,
        s: &SummaryMetrics,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rule1_summary (
                ticker, calc_date, years_of_data,
                roic_cagr_full, bvps_cagr_full, eps_cagr_full, revenue_cagr_full,
                fcf_cagr_full, price_cagr_full, pe_cagr_full,
                roic_cagr_recent, bvps_cagr_recent, eps_cagr_recent,
                revenue_cagr_recent, fcf_cagr_recent, price_cagr_recent, pe_cagr_recent,
                roic_ttm, bvps_ttm, eps_ttm, revenue_ttm_mil, fcf_ttm_mil,
                price_current, pe_ttm,
                roa_pct, roe_pct, dividends_ttm, dividend_yield_pct,
                total_liabilities, debt_to_equity, current_ratio, quick_ratio
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                      ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(ticker, calc_date) DO UPDATE SET
                years_of_data = excluded.years_of_data,
                roic_cagr_full = excluded.roic_cagr_full,
                bvps_cagr_full = excluded.bvps_cagr_full,
                eps_cagr_full = excluded.eps_cagr_full,
                revenue_cagr_full = excluded.revenue_cagr_full,
                fcf_cagr_full = excluded.fcf_cagr_full,
                price_cagr_full = excluded.price_cagr_full,
                pe_cagr_full = excluded.pe_cagr_full,
                roic_cagr_recent = excluded.roic_cagr_recent,
                bvps_cagr_recent = excluded.bvps_cagr_recent,
                eps_cagr_recent = excluded.eps_cagr_recent,
                revenue_cagr_recent = excluded.revenue_cagr_recent,
                fcf_cagr_recent = excluded.fcf_cagr_recent,
                price_cagr_recent = excluded.price_cagr_recent,
                pe_cagr_recent = excluded.pe_cagr_recent,
                roic_ttm = excluded.roic_ttm,
                bvps_ttm = excluded.bvps_ttm,
                eps_ttm = excluded.eps_ttm,
                revenue_ttm_mil = excluded.revenue_ttm_mil,
                fcf_ttm_mil = excluded.fcf_ttm_mil,
                price_current = excluded.price_current,
                pe_ttm = excluded.pe_ttm,
                roa_pct = excluded.roa_pct,
                roe_pct = excluded.roe_pct,
                dividends_ttm = excluded.dividends_ttm,
                dividend_yield_pct = excluded.dividend_yield_pct,
                total_liabilities = excluded.total_liabilities,
                debt_to_equity = excluded.debt_to_equity,
                current_ratio = excluded.current_ratio,
                quick_ratio = excluded.quick_ratio
            "#,
        )
        .bind(ticker)
        .bind(calc_date)
        .bind(s.years_of_data)
        .bind(s.roic_cagr_full)
        .bind(s.bvps_cagr_full)
        .bind(s.eps_cagr_full)
        .bind(s.revenue_cagr_full)
        .bind(s.fcf_cagr_full)
        .bind(s.price_cagr_full)
        .bind(s.pe_cagr_full)
        .bind(s.roic_cagr_recent)
        .bind(s.bvps_cagr_recent)
        .bind(s.eps_cagr_recent)
        .bind(s.revenue_cagr_recent)
        .bind(s.fcf_cagr_recent)
        .bind(s.price_cagr_recent)
        .bind(s.pe_cagr_recent)
        .bind(s.roic_ttm)
        .bind(s.bvps_ttm)
        .bind(s.eps_ttm)
        .bind(s.revenue_ttm_mil)
        .bind(s.fcf_ttm_mil)
        .bind(s.price_current)
        .bind(s.pe_ttm)
        .bind(s.roa_pct)
        .bind(s.roe_pct)
        .bind(s.dividends_ttm)
        .bind(s.dividend_yield_pct)
        .bind(s.total_liabilities)
        .bind(s.debt_to_equity)
        .bind(s.current_ratio)
        .bind(s.quick_ratio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Per-ticker growth summaries for the report, best EPS CAGR first,
    /// tickers without one at the end.
    pub async fn summary_report_rows(&self, calc_date: NaiveDate) -> Result<Vec<SummaryReportRow>> {
        let rows = sqlx::query(
            r#"
            SELECT ticker, years_of_data, bvps_cagr_full, eps_cagr_full,
                   revenue_cagr_full, fcf_cagr_full
            FROM rule1_summary
            WHERE calc_date = ?
            ORDER BY eps_cagr_full IS NULL, eps_cagr_full DESC
            "#,
        )
        .bind(calc_date)
        .fetch_all(&self.pool)
        .await?;

        let report = rows
            .into_iter()
            .map(|row| {
                Ok(SummaryReportRow {
                    ticker: row.try_get("ticker")?,
                    years_of_data: row.try_get("years_of_data")?,
                    bvps_cagr_full: row.try_get("bvps_cagr_full")?,
                    eps_cagr_full: row.try_get("eps_cagr_full")?,
                    revenue_cagr_full: row.try_get("revenue_cagr_full")?,
                    fcf_cagr_full: row.try_get("fcf_cagr_full")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(report)
    }
}
