use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use stock_analyzer::analysis::{build_annual_rows, build_summary};
use stock_analyzer::api::{ApiRateLimiter, StockDataProvider, YahooClient};
use stock_analyzer::database::DatabaseManager;
use stock_analyzer::models::Config;
use stock_analyzer::utils::read_tickers;

/// Minimum annualized growth rate for a metric to count toward a Rule #1
/// pass (10% as a fraction).
const RULE1_THRESHOLD: f64 = 0.10;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let matches = Command::new("Rule #1 Analyzer")
        .version("1.0")
        .about("Multi-year growth metrics: annual ROIC/BVPS/EPS/revenue/FCF with CAGRs")
        .arg(
            Arg::new("database")
                .long("db")
                .value_name("FILE")
                .help("Path to the SQLite database (overrides DATABASE_PATH)"),
        )
        .arg(
            Arg::new("tickers")
                .long("tickers")
                .value_name("FILE")
                .help("Ticker list file (overrides TICKERS_FILE)"),
        )
        .arg(
            Arg::new("delay")
                .long("delay")
                .value_name("SECONDS")
                .help("Delay between provider requests (overrides DELAY_SECONDS)"),
        )
        .get_matches();

    let mut config = Config::from_env()?;
    if let Some(db) = matches.get_one::<String>("database") {
        config.database_path = db.clone();
    }
    if let Some(tickers) = matches.get_one::<String>("tickers") {
        config.tickers_file = tickers.clone();
    }
    if let Some(delay) = matches.get_one::<String>("delay") {
        config.delay_seconds = delay.parse()?;
    }

    let tickers = read_tickers(Path::new(&config.tickers_file))?;
    if tickers.is_empty() {
        warn!("No tickers in {}, nothing to do", config.tickers_file);
        return Ok(());
    }

    println!("📐 RULE #1 GROWTH ANALYZER");
    println!("💾 Database: {}", config.database_path);
    println!("🎯 Tickers: {} from {}", tickers.len(), config.tickers_file);
    println!("{}", "=".repeat(60));

    let start_time = Instant::now();
    let calc_date = Utc::now().date_naive();

    let db = DatabaseManager::new(&config.database_path).await?;
    let provider = YahooClient::new()?;
    let limiter = ApiRateLimiter::new(config.delay_seconds);

    let mut succeeded = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (i, ticker) in tickers.iter().enumerate() {
        info!("[{}/{}] Processing {}", i + 1, tickers.len(), ticker);

        match process_ticker(&db, &provider, ticker, calc_date).await {
            Ok(true) => succeeded += 1,
            Ok(false) => {
                warn!("⏭️  {}: no usable data, skipped", ticker);
                skipped += 1;
            }
            Err(e) => {
                error!("❌ {} failed: {:#}", ticker, e);
                failed += 1;
            }
        }

        if i + 1 < tickers.len() {
            limiter.wait().await;
        }
    }

    print_report(&db, calc_date).await?;

    println!(
        "\n✅ Finished in {:.1}s ({} ok / {} skipped / {} failed)",
        start_time.elapsed().as_secs_f64(),
        succeeded,
        skipped,
        failed
    );
    Ok(())
}

async fn process_ticker(
    db: &DatabaseManager,
    provider: &impl StockDataProvider,
    ticker: &str,
    calc_date: chrono::NaiveDate,
) -> Result<bool> {
    let Some(data) = provider.fetch_ticker(ticker).await? else {
        return Ok(false);
    };

    let rows = build_annual_rows(&data);
    if rows.is_empty() {
        warn!("📭 {}: no annual statement data", ticker);
        return Ok(false);
    }

    let summary = build_summary(&data, &rows, calc_date);

    db.upsert_stock(
        ticker,
        &data.snapshot.company_name,
        data.snapshot.sector.as_deref(),
        data.snapshot.industry.as_deref(),
    )
    .await?;
    for row in &rows {
        db.upsert_annual(ticker, row).await?;
    }
    db.upsert_summary(ticker, calc_date, &summary).await?;

    info!(
        "✅ {}: {} fiscal years, BVPS CAGR {:?}, EPS CAGR {:?}",
        ticker,
        rows.len(),
        summary.bvps_cagr_full,
        summary.eps_cagr_full
    );
    Ok(true)
}

/// A ticker passes Rule #1 when all four core growth rates (BVPS, EPS,
/// revenue, FCF) compound at 10% or better over the full history.
async fn print_report(db: &DatabaseManager, calc_date: chrono::NaiveDate) -> Result<()> {
    let rows = db.summary_report_rows(calc_date).await?;
    if rows.is_empty() {
        return Ok(());
    }

    println!("\n📊 GROWTH SUMMARY (full-history CAGR)");
    println!(
        "{:<8} {:>5} {:>10} {:>10} {:>10} {:>10}",
        "Ticker", "Yrs", "BVPS", "EPS", "Revenue", "FCF"
    );
    println!("{}", "-".repeat(60));

    let mut passes = 0usize;
    for row in &rows {
        let core = [
            row.bvps_cagr_full,
            row.eps_cagr_full,
            row.revenue_cagr_full,
            row.fcf_cagr_full,
        ];
        let pass = core.iter().all(|g| g.map_or(false, |g| g >= RULE1_THRESHOLD));
        if pass {
            passes += 1;
        }

        println!(
            "{:<8} {:>5} {:>10} {:>10} {:>10} {:>10} {}",
            row.ticker,
            row.years_of_data,
            fmt_pct(row.bvps_cagr_full),
            fmt_pct(row.eps_cagr_full),
            fmt_pct(row.revenue_cagr_full),
            fmt_pct(row.fcf_cagr_full),
            if pass { "🎯" } else { "" },
        );
    }

    println!("{}", "-".repeat(60));
    println!("🎯 Rule #1 pass (all four ≥ 10%): {}/{}", passes, rows.len());
    Ok(())
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "-".to_string(),
    }
}
