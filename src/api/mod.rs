use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::TickerData;

pub mod yahoo;
pub use yahoo::YahooClient;

/// Provider-boundary errors. Missing individual line items are not errors;
/// they surface as `None` in the parsed data.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected payload for {symbol}: {reason}")]
    Parse { symbol: String, reason: String },
}

impl ProviderError {
    pub fn parse(symbol: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// A source of per-ticker fundamentals and price history.
///
/// `Ok(None)` means the provider knows nothing useful about the symbol
/// (no market price); the caller should skip it rather than fail the batch.
#[async_trait]
pub trait StockDataProvider {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Option<TickerData>, ProviderError>;
}

/// Fixed courtesy delay between provider requests.
pub struct ApiRateLimiter {
    delay: Duration,
}

impl ApiRateLimiter {
    pub fn new(delay_seconds: f64) -> Self {
        Self {
            delay: Duration::from_secs_f64(delay_seconds.max(0.0)),
        }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}
