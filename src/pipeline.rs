//! Filter → summary → samples, recomputed from scratch on every call.

use log::info;
use serde::Serialize;

use std::collections::BTreeSet;

use crate::config::{AnalysisConfig, AnalysisOptions};
use crate::dataset::{Dataset, InvalidCell};
use crate::error::AnalysisError;
use crate::filter::ObservationFilter;
use crate::posthoc::{self, ComparisonResult, GroupSamples, Procedure};
use crate::summary::{summarize_groups, summarize_trend, SummaryTable};
use crate::table::Table;

/// Everything one interaction needs before running procedures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Resolved configuration
    pub config: AnalysisConfig,
    /// Mean/SEM per group × time inside the time window, sorted by label
    pub trend: SummaryTable,
    /// Count/mean/SEM per group at the statistic time point, sorted by label
    pub summary: SummaryTable,
    /// Measurements per group at the statistic time point
    pub samples: GroupSamples,
    /// Non-numeric measurement cells among the statistic rows
    pub invalid_cells: Vec<InvalidCell>,
}

impl Analysis {
    /// Control group for Dunnett's test, if one is configured
    pub fn control(&self) -> Option<&str> {
        self.config.control_group.as_deref()
    }

    /// Run one procedure on the statistic rows.
    ///
    /// Fails with a configuration error naming the first offending cell when
    /// any statistic row holds a non-numeric measurement.
    pub fn run(&self, procedure: Procedure) -> Result<ComparisonResult, AnalysisError> {
        if let Some(first) = self.invalid_cells.first() {
            return Err(AnalysisError::Configuration(format!(
                "{} ({} non-numeric cell(s) in the selected rows)",
                first,
                self.invalid_cells.len()
            )));
        }
        posthoc::run(procedure, &self.samples, self.control())
    }
}

/// Resolve options against a table and build the dataset
pub fn prepare(
    table: &Table,
    options: &AnalysisOptions,
) -> Result<(Dataset, AnalysisConfig), AnalysisError> {
    let columns = options.columns(table)?;
    let dataset = Dataset::from_table(table, &columns)?;
    let config = options.resolve(&dataset)?;
    Ok((dataset, config))
}

/// Run the filter and summary steps for a configuration
pub fn analyze(dataset: &Dataset, config: &AnalysisConfig) -> Analysis {
    let trend_rows = ObservationFilter::for_trend(config).apply(dataset);
    let trend = summarize_trend(trend_rows.iter().copied())
        .sorted()
        .with_group_column(&config.columns.group);

    let stat_rows = ObservationFilter::for_statistics(config).apply(dataset);
    let summary = summarize_groups(stat_rows.iter().copied())
        .sorted()
        .with_group_column(&config.columns.group);
    let samples = GroupSamples::from_observations(stat_rows.iter().copied());

    let selected: BTreeSet<usize> = stat_rows.iter().map(|o| o.row).collect();
    let invalid_cells: Vec<InvalidCell> = dataset
        .invalid_cells()
        .iter()
        .filter(|cell| selected.contains(&cell.row))
        .cloned()
        .collect();

    info!(
        "Analysis of '{}' at {}: {} trend rows, {} groups, {} measurements",
        config.columns.measurement,
        config.statistic_time_point,
        trend.len(),
        summary.len(),
        samples.total()
    );

    Analysis {
        config: config.clone(),
        trend,
        summary,
        samples,
        invalid_cells,
    }
}
