//! Metric derivation: point-in-time fundamentals, annual time series,
//! growth/CAGR summaries, and the cross-sectional ranking pass.

pub mod annual;
pub mod fundamentals;
pub mod growth;
pub mod ranking;

pub use annual::build_annual_rows;
pub use fundamentals::build_daily_metrics;
pub use growth::build_summary;
pub use ranking::{rank_cohort, CohortMetrics, RankedScore};
