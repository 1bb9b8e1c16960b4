//! Cross-sectional pass over one day's cohort: Magic Formula ranks,
//! percentile-based composite score, and the BUY/HOLD/SELL signal.

use tracing::warn;

use crate::models::{ScoreWeights, Signal};

/// The slice of per-ticker metrics the ranker needs, read back from storage.
#[derive(Debug, Clone)]
pub struct CohortMetrics {
    pub ticker: String,
    pub roic: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub piotroski_score: i32,
    pub fcf_yield: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub gross_margin: Option<f64>,
}

/// Ranking output for one ticker, written back alongside its metrics row.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedScore {
    pub ticker: String,
    pub magic_formula_rank: i64,
    pub composite_score: f64,
    pub signal: Signal,
}

/// Average ranks counted from the worst value: position 1 is the worst,
/// position n the best. Ties share the average of their positions, and
/// missing values all tie at the very bottom.
///
/// `lower_is_better` flips the ordering so that, e.g., low debt/equity
/// earns a high rank.
fn ranks_from_worst(values: &[Option<f64>], lower_is_better: bool) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();

    // Missing first (worst), then by value; reverse value order when lower
    // is better
    order.sort_by(|&a, &b| match (values[a], values[b]) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal);
            if lower_is_better {
                ord.reverse()
            } else {
                ord
            }
        }
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // Find the extent of the tie group starting at sorted position i
        let mut j = i + 1;
        while j < n {
            let tied = match (values[order[i]], values[order[j]]) {
                (None, None) => true,
                (Some(x), Some(y)) => x == y,
                _ => false,
            };
            if !tied {
                break;
            }
            j += 1;
        }
        // Positions are 1-based; the group shares their average
        let avg = (i + 1..=j).sum::<usize>() as f64 / (j - i) as f64;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

/// Percentile in [0, 100]: best value lands near 100, missing values at the
/// bottom.
fn percentiles(values: &[Option<f64>], lower_is_better: bool) -> Vec<f64> {
    let n = values.len() as f64;
    ranks_from_worst(values, lower_is_better)
        .into_iter()
        .map(|r| r / n * 100.0)
        .collect()
}

/// Rank the day's cohort.
///
/// Magic Formula: descending ranks on ROIC and earnings yield (missing
/// values rank worst), summed, then re-ranked ascending so rank 1 is the
/// best combined value. The composite score is a weighted sum of percentile
/// ranks over six dimensions, rounded to two decimals so repeated runs over
/// the same cohort write identical values.
pub fn rank_cohort(cohort: &[CohortMetrics], weights: &ScoreWeights) -> Vec<RankedScore> {
    if cohort.is_empty() {
        warn!("Empty cohort, nothing to rank");
        return Vec::new();
    }
    let n = cohort.len() as f64;

    let roic: Vec<Option<f64>> = cohort.iter().map(|m| m.roic).collect();
    let ey: Vec<Option<f64>> = cohort.iter().map(|m| m.earnings_yield).collect();

    // rank 1 = best, from the rank-from-worst vector
    let roic_rank: Vec<f64> = ranks_from_worst(&roic, false)
        .into_iter()
        .map(|r| n + 1.0 - r)
        .collect();
    let ey_rank: Vec<f64> = ranks_from_worst(&ey, false)
        .into_iter()
        .map(|r| n + 1.0 - r)
        .collect();

    let combined: Vec<Option<f64>> = roic_rank
        .iter()
        .zip(&ey_rank)
        .map(|(a, b)| Some(a + b))
        .collect();

    // Lowest combined sum is the best Magic Formula candidate
    let mf_rank: Vec<f64> = ranks_from_worst(&combined, true)
        .into_iter()
        .map(|r| n + 1.0 - r)
        .collect();

    // Percentile dimensions for the composite; the combined sum is negated
    // so that a better Magic Formula standing scores higher
    let mf_pct = percentiles(
        &combined.iter().map(|c| c.map(|v| -v)).collect::<Vec<_>>(),
        false,
    );
    let piotroski_pct = percentiles(
        &cohort
            .iter()
            .map(|m| Some(m.piotroski_score as f64))
            .collect::<Vec<_>>(),
        false,
    );
    let fcf_pct = percentiles(&cohort.iter().map(|m| m.fcf_yield).collect::<Vec<_>>(), false);
    let de_pct = percentiles(
        &cohort.iter().map(|m| m.debt_to_equity).collect::<Vec<_>>(),
        true,
    );
    let growth_pct = percentiles(
        &cohort.iter().map(|m| m.revenue_growth).collect::<Vec<_>>(),
        false,
    );
    let margin_pct = percentiles(
        &cohort.iter().map(|m| m.gross_margin).collect::<Vec<_>>(),
        false,
    );

    cohort
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let composite = weights.magic_formula * mf_pct[i]
                + weights.piotroski * piotroski_pct[i]
                + weights.fcf_yield * fcf_pct[i]
                + weights.debt_to_equity * de_pct[i]
                + weights.revenue_growth * growth_pct[i]
                + weights.gross_margin * margin_pct[i];
            let composite = (composite * 100.0).round() / 100.0;

            RankedScore {
                ticker: m.ticker.clone(),
                magic_formula_rank: mf_rank[i] as i64,
                composite_score: composite,
                signal: Signal::from_composite(composite),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn member(ticker: &str, roic: Option<f64>, ey: Option<f64>) -> CohortMetrics {
        CohortMetrics {
            ticker: ticker.to_string(),
            roic,
            earnings_yield: ey,
            piotroski_score: 5,
            fcf_yield: None,
            debt_to_equity: None,
            revenue_growth: None,
            gross_margin: None,
        }
    }

    #[test]
    fn ranks_from_worst_averages_ties_and_sinks_missing() {
        let values = vec![Some(10.0), Some(20.0), Some(20.0), None];
        let ranks = ranks_from_worst(&values, false);
        // None is worst (1), then 10 (2), then the 20s tie at (3+4)/2
        assert_eq!(ranks, vec![2.0, 3.5, 3.5, 1.0]);

        let ranks = ranks_from_worst(&values, true);
        // Lower is better: the 20s are worst, tying at (1+2)/2... but the
        // missing value is still worse than any present one
        assert_eq!(ranks, vec![4.0, 2.5, 2.5, 1.0]);
    }

    #[test]
    fn magic_formula_combines_both_ranks() {
        // ROIC order: A > B > C; earnings yield order: C > A > B
        let cohort = vec![
            member("A", Some(0.30), Some(0.08)),
            member("B", Some(0.20), Some(0.05)),
            member("C", Some(0.10), Some(0.12)),
        ];
        let ranked = rank_cohort(&cohort, &ScoreWeights::default());

        // ROIC ranks: A=1 B=2 C=3; EY ranks: C=1 A=2 B=3
        // Combined: A=3 B=5 C=4 -> MF ranks A=1, C=2, B=3
        assert_eq!(ranked[0].magic_formula_rank, 1);
        assert_eq!(ranked[1].magic_formula_rank, 3);
        assert_eq!(ranked[2].magic_formula_rank, 2);
    }

    #[test]
    fn missing_metrics_rank_worst() {
        let cohort = vec![
            member("A", Some(0.30), Some(0.08)),
            member("B", None, None),
        ];
        let ranked = rank_cohort(&cohort, &ScoreWeights::default());
        assert_eq!(ranked[0].magic_formula_rank, 1);
        assert_eq!(ranked[1].magic_formula_rank, 2);
        assert!(ranked[0].composite_score > ranked[1].composite_score);
    }

    #[test]
    fn composite_stays_in_bounds_and_signals_follow() {
        let cohort: Vec<CohortMetrics> = (0..10)
            .map(|i| CohortMetrics {
                ticker: format!("T{i}"),
                roic: Some(i as f64 * 0.03),
                earnings_yield: Some(i as f64 * 0.01),
                piotroski_score: i % 10,
                fcf_yield: Some(i as f64 * 0.005),
                debt_to_equity: Some(200.0 - i as f64 * 10.0),
                revenue_growth: Some(i as f64 * 0.02),
                gross_margin: Some(0.2 + i as f64 * 0.05),
            })
            .collect();

        let ranked = rank_cohort(&cohort, &ScoreWeights::default());
        for r in &ranked {
            assert!(r.composite_score >= 0.0 && r.composite_score <= 100.0);
            assert_eq!(r.signal, Signal::from_composite(r.composite_score));
        }
        // The uniformly best ticker must outrank the uniformly worst
        let best = ranked.last().unwrap();
        let worst = ranked.first().unwrap();
        assert_eq!(best.magic_formula_rank, 1);
        assert_eq!(best.signal, Signal::Buy);
        assert_eq!(worst.signal, Signal::Sell);
        assert!(best.composite_score > worst.composite_score);
    }

    #[test]
    fn rescoring_the_same_cohort_is_idempotent() {
        let cohort = vec![
            member("A", Some(0.30), Some(0.08)),
            member("B", Some(0.20), Some(0.05)),
            member("C", Some(0.10), Some(0.12)),
        ];
        let first = rank_cohort(&cohort, &ScoreWeights::default());
        let second = rank_cohort(&cohort, &ScoreWeights::default());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_cohort_is_a_noop() {
        assert!(rank_cohort(&[], &ScoreWeights::default()).is_empty());
    }
}
