//! Bonferroni-corrected pairwise t-tests.
//!
//! Labelled "Scheffe" in reports for compatibility with existing study
//! summaries. This is not the Scheffé contrast procedure: each pair gets an
//! independent pooled-variance Student t-test whose p-value is multiplied by
//! the number of pairs and capped at 1.

use log::debug;
use serde::Serialize;

use super::distribution::student_t_two_sided;
use super::samples::{GroupSample, GroupSamples};
use crate::error::AnalysisError;

/// Marker for a significant adjusted p-value
pub const SIGNIFICANT_MARKER: &str = "*";
/// Marker for a non-significant adjusted p-value
pub const NOT_SIGNIFICANT_MARKER: &str = "ns";

/// One pair of groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseRow {
    /// First group (lower label)
    pub group_a: String,
    /// Second group
    pub group_b: String,
    /// Mean of `group_a` minus mean of `group_b`, rounded to 2 decimals
    pub mean_difference: f64,
    /// Student t statistic
    pub statistic: f64,
    /// Uncorrected two-sided p-value
    pub p_value: f64,
    /// `min(p_value * pairs, 1.0)`
    pub p_adjusted: f64,
    /// `p_adjusted < alpha`
    pub significant: bool,
}

impl PairwiseRow {
    /// "*" when significant, "ns" otherwise
    pub fn marker(&self) -> &'static str {
        if self.significant {
            SIGNIFICANT_MARKER
        } else {
            NOT_SIGNIFICANT_MARKER
        }
    }
}

/// Result of the Bonferroni-corrected pairwise comparisons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseResult {
    /// Family-wise significance level
    pub alpha: f64,
    /// Number of pairs the correction multiplies by
    pub pairs: usize,
    /// One row per unordered pair, lexicographic over sorted labels
    pub rows: Vec<PairwiseRow>,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pooled-variance two-sample t statistic and its degrees of freedom
fn t_test(a: &GroupSample, b: &GroupSample) -> Result<(f64, f64), AnalysisError> {
    let (na, nb) = (a.n() as f64, b.n() as f64);
    let df = na + nb - 2.0;
    if df < 1.0 {
        return Err(AnalysisError::InsufficientData(format!(
            "groups '{}' and '{}' have {} observation(s) between them; at least 3 required",
            a.group,
            b.group,
            a.n() + b.n()
        )));
    }
    let variance = (a.sum_sq_dev() + b.sum_sq_dev()) / df;
    let se = (variance * (1.0 / na + 1.0 / nb)).sqrt();
    if !(se > 0.0) {
        return Err(AnalysisError::Computation(format!(
            "groups '{}' and '{}' have zero variance",
            a.group, b.group
        )));
    }
    Ok(((a.mean() - b.mean()) / se, df))
}

/// Run a t-test on every pair and apply the Bonferroni correction
pub fn bonferroni_pairwise(
    samples: &GroupSamples,
    alpha: f64,
) -> Result<PairwiseResult, AnalysisError> {
    samples.require(2, 1)?;

    let groups = samples.groups();
    let pairs = groups.len() * (groups.len() - 1) / 2;
    let mut rows = Vec::with_capacity(pairs);

    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            let (statistic, df) = t_test(a, b)?;
            let p_value = student_t_two_sided(statistic, df)?;
            let p_adjusted = (p_value * pairs as f64).min(1.0);
            debug!(
                "Pairwise {} - {}: t = {:.4}, p = {:.6}, adjusted = {:.6}",
                a.group, b.group, statistic, p_value, p_adjusted
            );
            rows.push(PairwiseRow {
                group_a: a.group.clone(),
                group_b: b.group.clone(),
                mean_difference: round2(a.mean() - b.mean()),
                statistic,
                p_value,
                p_adjusted,
                significant: p_adjusted < alpha,
            });
        }
    }

    Ok(PairwiseResult { alpha, pairs, rows })
}
