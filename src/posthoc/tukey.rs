//! Tukey's honestly significant difference test (Tukey-Kramer for unequal
//! group sizes).

use log::debug;
use serde::Serialize;

use super::distribution::{studentized_range_cdf, studentized_range_quantile};
use super::samples::GroupSamples;
use crate::error::AnalysisError;

/// One pair of groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TukeyRow {
    /// First group (lower label)
    pub group1: String,
    /// Second group
    pub group2: String,
    /// Mean of `group2` minus mean of `group1`
    pub mean_difference: f64,
    /// Adjusted p-value from the studentized range distribution
    pub p_adjusted: f64,
    /// Lower bound of the simultaneous confidence interval
    pub lower: f64,
    /// Upper bound of the simultaneous confidence interval
    pub upper: f64,
    /// Null hypothesis rejected at `alpha`
    pub reject: bool,
}

/// Result of Tukey's HSD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TukeyResult {
    /// Family-wise significance level
    pub alpha: f64,
    /// Pooled-variance degrees of freedom
    pub df: f64,
    /// One row per unordered pair, lexicographic over sorted labels
    pub rows: Vec<TukeyRow>,
}

/// Run Tukey's HSD over every pair of groups.
///
/// Single-observation groups are allowed; the pooled variance needs at least
/// one residual degree of freedom.
pub fn tukey_hsd(samples: &GroupSamples, alpha: f64) -> Result<TukeyResult, AnalysisError> {
    samples.require(2, 1)?;
    let (variance, df) = samples.pooled_variance()?;
    let k = samples.len();
    let q_crit = studentized_range_quantile(1.0 - alpha, k, df)?;

    let groups = samples.groups();
    let mut rows = Vec::with_capacity(k * (k - 1) / 2);
    for (i, first) in groups.iter().enumerate() {
        for second in &groups[i + 1..] {
            let mean_difference = second.mean() - first.mean();
            let se = (0.5 * variance * (1.0 / first.n() as f64 + 1.0 / second.n() as f64)).sqrt();
            let q = mean_difference.abs() / se;
            let p_adjusted = (1.0 - studentized_range_cdf(q, k, df)?).clamp(0.0, 1.0);
            debug!(
                "Tukey {} - {}: q = {:.4}, p = {:.6}",
                first.group, second.group, q, p_adjusted
            );
            rows.push(TukeyRow {
                group1: first.group.clone(),
                group2: second.group.clone(),
                mean_difference,
                p_adjusted,
                lower: mean_difference - q_crit * se,
                upper: mean_difference + q_crit * se,
                reject: p_adjusted < alpha,
            });
        }
    }

    Ok(TukeyResult { alpha, df, rows })
}
