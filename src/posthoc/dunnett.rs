//! Dunnett's many-to-one comparison against a shared control.
//!
//! Every non-control group is compared with the control using the pooled
//! within-group variance of all groups (df = N - k). The p-value of a
//! comparison is `1 - P(max_j |T_j| < |t_i|)` under the joint multivariate t
//! distribution of all comparisons, which controls the family-wise error rate
//! across the family.

use log::debug;
use serde::Serialize;

use super::distribution::dunnett_cdf;
use super::samples::GroupSamples;
use crate::error::AnalysisError;

/// One treatment-vs-control comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DunnettRow {
    /// "{control} vs {group}"
    pub comparison: String,
    /// Treatment group label
    pub group: String,
    /// Treatment mean minus control mean
    pub mean_difference: f64,
    /// t statistic using the pooled variance
    pub statistic: f64,
    /// Two-sided, family-adjusted p-value
    pub p_value: f64,
}

/// Result of Dunnett's test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DunnettResult {
    /// Control group label
    pub control: String,
    /// Pooled-variance degrees of freedom
    pub df: f64,
    /// One row per non-control group, in sorted group order
    pub rows: Vec<DunnettRow>,
}

/// Run Dunnett's test of every group against `control`
pub fn dunnett(samples: &GroupSamples, control: &str) -> Result<DunnettResult, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no measurements in the selected data".to_string(),
        ));
    }
    let control_sample = samples.get(control).ok_or_else(|| {
        AnalysisError::Configuration(format!(
            "control group '{}' is absent from the filtered data",
            control
        ))
    })?;
    samples.require(2, 2)?;

    let (variance, df) = samples.pooled_variance()?;
    let n0 = control_sample.n() as f64;
    let mean0 = control_sample.mean();

    let treatments: Vec<_> = samples
        .groups()
        .iter()
        .filter(|g| g.group != control)
        .collect();
    let lambdas: Vec<f64> = treatments
        .iter()
        .map(|g| {
            let n = g.n() as f64;
            (n / (n + n0)).sqrt()
        })
        .collect();

    let mut rows = Vec::with_capacity(treatments.len());
    for group in treatments {
        let n = group.n() as f64;
        let mean_difference = group.mean() - mean0;
        let statistic = mean_difference / (variance * (1.0 / n + 1.0 / n0)).sqrt();
        let p_value = (1.0 - dunnett_cdf(statistic.abs(), &lambdas, df)?).clamp(0.0, 1.0);
        debug!(
            "Dunnett {} vs {}: t = {:.4}, p = {:.6}",
            control, group.group, statistic, p_value
        );
        rows.push(DunnettRow {
            comparison: format!("{} vs {}", control, group.group),
            group: group.group.clone(),
            mean_difference,
            statistic,
            p_value,
        });
    }

    Ok(DunnettResult {
        control: control.to_string(),
        df,
        rows,
    })
}
