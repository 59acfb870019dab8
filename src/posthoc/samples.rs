use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::Observation;
use crate::error::AnalysisError;
use crate::filter::measured;

/// Non-null measurements of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSample {
    /// Group label
    pub group: String,
    /// Measurements in source order
    pub values: Vec<f64>,
}

impl GroupSample {
    /// Number of measurements
    pub fn n(&self) -> usize {
        self.values.len()
    }

    /// Arithmetic mean (NaN when empty)
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sum of squared deviations from the mean
    pub fn sum_sq_dev(&self) -> f64 {
        let mean = self.mean();
        self.values.iter().map(|v| (v - mean).powi(2)).sum()
    }
}

/// Per-group measurement vectors, sorted by group label
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GroupSamples {
    groups: Vec<GroupSample>,
}

impl GroupSamples {
    /// Collect non-null measurements per group; groups with none are absent
    pub fn from_observations<'a, I>(observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (observation, value) in measured(observations) {
            by_group
                .entry(observation.group.as_str())
                .or_default()
                .push(value);
        }
        let groups = by_group
            .into_iter()
            .map(|(group, values)| GroupSample {
                group: group.to_string(),
                values,
            })
            .collect();
        Self { groups }
    }

    /// Build from explicit `(label, values)` pairs; labels are sorted
    pub fn from_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut groups: Vec<GroupSample> = groups
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(group, values)| GroupSample {
                group: group.into(),
                values,
            })
            .collect();
        groups.sort_by(|a, b| a.group.cmp(&b.group));
        Self { groups }
    }

    /// Groups in label order
    pub fn groups(&self) -> &[GroupSample] {
        &self.groups
    }

    /// Sample for one group
    pub fn get(&self, group: &str) -> Option<&GroupSample> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True if no group has a measurement
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of measurements
    pub fn total(&self) -> usize {
        self.groups.iter().map(GroupSample::n).sum()
    }

    /// Require at least `min_groups` groups, each with `min_per_group` values
    pub fn require(&self, min_groups: usize, min_per_group: usize) -> Result<(), AnalysisError> {
        if self.groups.len() < min_groups {
            return Err(AnalysisError::InsufficientData(format!(
                "need at least {} groups with measurements, found {}",
                min_groups,
                self.groups.len()
            )));
        }
        if let Some(small) = self.groups.iter().find(|g| g.n() < min_per_group) {
            return Err(AnalysisError::InsufficientData(format!(
                "group '{}' has {} observation(s); at least {} required",
                small.group,
                small.n(),
                min_per_group
            )));
        }
        Ok(())
    }

    /// Pooled within-group variance and its degrees of freedom (N - k)
    pub fn pooled_variance(&self) -> Result<(f64, f64), AnalysisError> {
        let df = self.total() as f64 - self.groups.len() as f64;
        if df < 1.0 {
            return Err(AnalysisError::InsufficientData(
                "no residual degrees of freedom for a pooled variance".to_string(),
            ));
        }
        let ss: f64 = self.groups.iter().map(GroupSample::sum_sq_dev).sum();
        let variance = ss / df;
        if !variance.is_finite() || variance <= 0.0 {
            return Err(AnalysisError::Computation(
                "pooled variance is zero (every group is constant)".to_string(),
            ));
        }
        Ok((variance, df))
    }
}
