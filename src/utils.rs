use anyhow::{Context, Result};
use std::path::Path;

/// Read ticker symbols from a newline-delimited file. Blank lines and `#`
/// comments are skipped; symbols are upper-cased and trimmed.
pub fn read_tickers(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading tickers file {}", path.display()))?;

    let tickers = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_uppercase())
        .collect();
    Ok(tickers)
}
