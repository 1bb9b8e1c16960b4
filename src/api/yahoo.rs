use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::{ProviderError, StockDataProvider};
use crate::models::{TickerData, TickerSnapshot};
use crate::statements::StatementTable;

const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const TIMESERIES_URL: &str =
    "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const QUOTE_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics,assetProfile";

/// Annual line items requested per statement. The `annual` prefix is part of
/// the timeseries type name; the canonical row name is derived from the rest.
const INCOME_TYPES: &[&str] = &[
    "annualTotalRevenue",
    "annualGrossProfit",
    "annualEBIT",
    "annualOperatingIncome",
    "annualNetIncome",
    "annualBasicEPS",
    "annualDilutedEPS",
];

const BALANCE_TYPES: &[&str] = &[
    "annualTotalAssets",
    "annualCurrentAssets",
    "annualCurrentLiabilities",
    "annualCashAndCashEquivalents",
    "annualLongTermDebt",
    "annualOrdinarySharesNumber",
    "annualStockholdersEquity",
    "annualTotalLiabilitiesNetMinorityInterest",
    "annualInventory",
];

const CASHFLOW_TYPES: &[&str] = &["annualOperatingCashFlow", "annualFreeCashFlow"];

/// Yahoo Finance client: quote summary for the snapshot, the fundamentals
/// timeseries for annual statements, and the chart endpoint for five years
/// of daily closes and dividend events.
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;
        Ok(Self { client })
    }

    async fn get_json(&self, url: &str, symbol: &str) -> Result<Value, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::parse(
                symbol,
                format!("status {status} from {url}"),
            ));
        }
        let body = response.json::<Value>().await?;
        Ok(body)
    }

    async fn fetch_snapshot(&self, symbol: &str) -> Result<Option<TickerSnapshot>, ProviderError> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}?modules={QUOTE_MODULES}");
        let body = self.get_json(&url, symbol).await?;

        let Some(result) = body
            .pointer("/quoteSummary/result/0")
            .filter(|v| !v.is_null())
        else {
            debug!("📭 No quote summary result for {}", symbol);
            return Ok(None);
        };

        let price = &result["price"];
        if raw(price, "regularMarketPrice").is_none() {
            return Ok(None);
        }

        let summary = &result["summaryDetail"];
        let financial = &result["financialData"];
        let stats = &result["defaultKeyStatistics"];
        let profile = &result["assetProfile"];

        let company_name = price["longName"]
            .as_str()
            .or_else(|| price["shortName"].as_str())
            .unwrap_or(symbol)
            .to_string();

        Ok(Some(TickerSnapshot {
            company_name,
            sector: profile["sector"].as_str().map(str::to_string),
            industry: profile["industry"].as_str().map(str::to_string),
            regular_market_price: raw(price, "regularMarketPrice"),
            current_price: raw(financial, "currentPrice"),
            market_cap: raw(price, "marketCap").or_else(|| raw(summary, "marketCap")),
            enterprise_value: raw(stats, "enterpriseValue"),
            ebitda: raw(financial, "ebitda"),
            free_cash_flow: raw(financial, "freeCashflow"),
            trailing_pe: raw(summary, "trailingPE"),
            forward_pe: raw(stats, "forwardPE").or_else(|| raw(summary, "forwardPE")),
            price_to_book: raw(stats, "priceToBook"),
            ev_to_ebitda: raw(stats, "enterpriseToEbitda"),
            return_on_equity: raw(financial, "returnOnEquity"),
            return_on_assets: raw(financial, "returnOnAssets"),
            gross_margins: raw(financial, "grossMargins"),
            operating_margins: raw(financial, "operatingMargins"),
            profit_margins: raw(financial, "profitMargins"),
            debt_to_equity: raw(financial, "debtToEquity"),
            current_ratio: raw(financial, "currentRatio"),
            revenue_growth: raw(financial, "revenueGrowth"),
            earnings_growth: raw(financial, "earningsGrowth"),
            dividend_rate: raw(summary, "dividendRate"),
            dividend_yield: raw(summary, "dividendYield"),
            book_value: raw(stats, "bookValue"),
            trailing_eps: raw(stats, "trailingEps"),
            total_revenue: raw(financial, "totalRevenue"),
        }))
    }

    async fn fetch_statement(
        &self,
        symbol: &str,
        types: &[&str],
    ) -> Result<StatementTable, ProviderError> {
        let now = Utc::now();
        let period1 = (now - Duration::days(6 * 365)).timestamp();
        let period2 = now.timestamp();
        let url = format!(
            "{TIMESERIES_URL}/{symbol}?symbol={symbol}&type={}&period1={period1}&period2={period2}",
            types.join(",")
        );
        let body = self.get_json(&url, symbol).await?;

        let Some(results) = body.pointer("/timeseries/result").and_then(Value::as_array) else {
            warn!("📭 No fundamentals timeseries for {}", symbol);
            return Ok(StatementTable::default());
        };

        // First pass: collect every reporting date any series mentions
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut series: Vec<(String, Vec<(NaiveDate, f64)>)> = Vec::new();
        for entry in results {
            let Some(type_name) = entry.pointer("/meta/type/0").and_then(Value::as_str) else {
                continue;
            };
            let Some(points) = entry[type_name].as_array() else {
                continue;
            };
            let mut values = Vec::new();
            for point in points {
                if point.is_null() {
                    continue;
                }
                let date = point["asOfDate"]
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
                let value = point.pointer("/reportedValue/raw").and_then(Value::as_f64);
                if let (Some(date), Some(value)) = (date, value) {
                    dates.insert(date);
                    values.push((date, value));
                }
            }
            if !values.is_empty() {
                series.push((row_name(type_name), values));
            }
        }

        // Newest-first columns; downstream resolves order from the dates
        let periods: Vec<NaiveDate> = dates.into_iter().rev().collect();
        let mut table = StatementTable::new(periods.clone());
        for (name, values) in series {
            let row = periods
                .iter()
                .map(|p| {
                    values
                        .iter()
                        .find(|(d, _)| d == p)
                        .map(|&(_, v)| v)
                })
                .collect();
            table.insert_row(&name, row);
        }
        Ok(table)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
    ) -> Result<(Vec<(NaiveDate, f64)>, Vec<(NaiveDate, f64)>), ProviderError> {
        let url = format!("{CHART_URL}/{symbol}?range=5y&interval=1d&events=div");
        let body = self.get_json(&url, symbol).await?;

        let Some(result) = body.pointer("/chart/result/0") else {
            warn!("📭 No price history for {}", symbol);
            return Ok((Vec::new(), Vec::new()));
        };

        let timestamps: Vec<i64> = result["timestamp"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let closes = result
            .pointer("/indicators/quote/0/close")
            .and_then(Value::as_array);

        let mut history = Vec::new();
        if let Some(closes) = closes {
            for (ts, close) in timestamps.iter().zip(closes) {
                if let (Some(date), Some(close)) = (timestamp_date(*ts), close.as_f64()) {
                    if close.is_finite() {
                        history.push((date, close));
                    }
                }
            }
        }

        let mut dividends = Vec::new();
        if let Some(events) = result.pointer("/events/dividends").and_then(Value::as_object) {
            for event in events.values() {
                let date = event["date"].as_i64().and_then(timestamp_date);
                let amount = event["amount"].as_f64();
                if let (Some(date), Some(amount)) = (date, amount) {
                    dividends.push((date, amount));
                }
            }
        }
        dividends.sort_by_key(|&(date, _)| date);

        Ok((history, dividends))
    }
}

#[async_trait::async_trait]
impl StockDataProvider for YahooClient {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Option<TickerData>, ProviderError> {
        let Some(snapshot) = self.fetch_snapshot(symbol).await? else {
            return Ok(None);
        };

        let income = self.fetch_statement(symbol, INCOME_TYPES).await?;
        let balance = self.fetch_statement(symbol, BALANCE_TYPES).await?;
        let cashflow = self.fetch_statement(symbol, CASHFLOW_TYPES).await?;
        let (price_history, dividends) = self.fetch_history(symbol).await?;

        debug!(
            "📦 {}: {} income / {} balance / {} cashflow periods, {} closes",
            symbol,
            income.period_count(),
            balance.period_count(),
            cashflow.period_count(),
            price_history.len()
        );

        Ok(Some(TickerData {
            snapshot,
            income,
            balance,
            cashflow,
            price_history,
            dividends,
        }))
    }
}

/// Yahoo wraps most numbers as `{"raw": ..., "fmt": ...}`; some fields come
/// back as bare numbers.
fn raw(obj: &Value, key: &str) -> Option<f64> {
    let field = &obj[key];
    field["raw"].as_f64().or_else(|| field.as_f64())
}

fn timestamp_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Canonical row name from a timeseries type: strip the `annual` prefix and
/// space out the camel-case words ("annualBasicEPS" -> "Basic EPS").
fn row_name(type_name: &str) -> String {
    let stripped = type_name.strip_prefix("annual").unwrap_or(type_name);
    let chars: Vec<char> = stripped.chars().collect();
    let mut out = String::with_capacity(stripped.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev_lower || (chars[i - 1].is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}
