use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use stock_analyzer::analysis::{build_daily_metrics, rank_cohort};
use stock_analyzer::api::{ApiRateLimiter, StockDataProvider, YahooClient};
use stock_analyzer::database::DatabaseManager;
use stock_analyzer::models::Config;
use stock_analyzer::utils::read_tickers;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let matches = Command::new("Stock Analyzer")
        .version("1.0")
        .about("Daily value metrics, Piotroski F-Score and cross-sectional ranking")
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

    println!("📈 STOCK ANALYZER");
    println!("💾 Database: {}", config.database_path);
    println!("🎯 Tickers: {} from {}", tickers.len(), config.tickers_file);
    println!("{}", "=".repeat(60));

    let start_time = Instant::now();
    let calc_date = Utc::now().date_naive();

    // Database or provider setup failure aborts the whole run
    let db = DatabaseManager::new(&config.database_path).await?;
    let provider = YahooClient::new()?;
    let limiter = ApiRateLimiter::new(config.delay_seconds);

    // Phase 1: fetch and store per-ticker metrics
    let mut succeeded = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;

    for (i, ticker) in tickers.iter().enumerate() {
        info!("[{}/{}] Processing {}", i + 1, tickers.len(), ticker);

        match process_ticker(&db, &provider, ticker, calc_date).await {
            Ok(true) => succeeded += 1,
            Ok(false) => {
                warn!("⏭️  {}: no market data, skipped", ticker);
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

    info!(
        "Phase 1 done: {} stored, {} skipped, {} failed",
        succeeded, skipped, failed
    );

    // Phase 2: cross-sectional ranking over everything stored today
    let cohort = db.daily_cohort(calc_date).await?;
    let scores = rank_cohort(&cohort, &config.weights);
    db.apply_rankings(calc_date, &scores).await?;
    info!("🏆 Ranked {} tickers for {}", scores.len(), calc_date);

    if !scores.is_empty() {
        println!("\n📊 TOP 10 BY COMPOSITE SCORE");
        println!("{}", "-".repeat(60));
        for row in db.top_by_composite(calc_date, 10).await? {
            println!(
                "{:<8} {:<28} {:>6.2}  MF#{:<4} {}",
                row.ticker,
                truncate(&row.company_name, 28),
                row.composite_score,
                row.magic_formula_rank.unwrap_or(0),
                row.signal.map(|s| s.as_str()).unwrap_or("-"),
            );
        }

        let (buy, hold, sell) = db.signal_tally(calc_date).await?;
        println!("{}", "-".repeat(60));
        println!("🟢 BUY: {}   🟡 HOLD: {}   🔴 SELL: {}", buy, hold, sell);
    }

    println!(
        "\n✅ Finished in {:.1}s ({} ok / {} skipped / {} failed)",
        start_time.elapsed().as_secs_f64(),
        succeeded,
        skipped,
        failed
    );
    Ok(())
}

/// Fetch one ticker and store its metrics. `Ok(false)` means the provider
/// had no usable data for the symbol.
async fn process_ticker(
    db: &DatabaseManager,
    provider: &impl StockDataProvider,
    ticker: &str,
    calc_date: chrono::NaiveDate,
) -> Result<bool> {
    let Some(data) = provider.fetch_ticker(ticker).await? else {
        return Ok(false);
    };

    let metrics = build_daily_metrics(ticker, calc_date, &data);
    db.upsert_stock(
        ticker,
        &data.snapshot.company_name,
        data.snapshot.sector.as_deref(),
        data.snapshot.industry.as_deref(),
    )
    .await?;
    db.upsert_daily_metrics(&metrics).await?;

    info!(
        "✅ {}: piotroski {}, roic {:?}",
        ticker, metrics.piotroski_score, metrics.roic
    );
    Ok(true)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
