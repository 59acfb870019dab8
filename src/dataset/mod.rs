//! # Dataset Module
//!
//! Interprets a loaded [`Table`] through a [`ColumnSelection`] and produces the
//! ordered sequence of [`Observation`]s the pipeline works on.
//!
//! ## Cell Rules
//!
//! - Rows with an empty group or time cell are skipped (counted in
//!   [`Dataset::skipped_rows`]).
//! - Time cells must be numeric.
//! - Measurement cells that are empty or hold a missing marker (`NA`, `N/A`,
//!   `NaN`, `null`, `-`) become `None`.
//! - Any other non-numeric measurement cell also becomes `None` and is kept
//!   in [`Dataset::invalid_cells`]; post-hoc procedures refuse rows that
//!   carry one.
//!
//! Observations keep their source row index as identity.

mod types;

#[cfg(test)]
mod tests;

pub use types::{InvalidCell, Observation, TimePoint};

use log::{debug, warn};
use std::collections::BTreeSet;

use crate::config::ColumnSelection;
use crate::error::AnalysisError;
use crate::table::Table;

/// Cell values treated as a missing measurement (compared case-insensitively)
pub const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "-"];

/// An ordered collection of observations sharing one column selection
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: ColumnSelection,
    observations: Vec<Observation>,
    skipped_rows: usize,
    invalid_cells: Vec<InvalidCell>,
}

impl Dataset {
    /// Build a dataset from a table and the selected columns
    pub fn from_table(table: &Table, columns: &ColumnSelection) -> Result<Self, AnalysisError> {
        columns.validate(table)?;

        // validate() guarantees the three columns exist
        let index = |name: &str| table.column_index(name).unwrap_or_default();
        let group_idx = index(&columns.group);
        let time_idx = index(&columns.time);
        let value_idx = index(&columns.measurement);

        let mut observations = Vec::with_capacity(table.len());
        let mut skipped_rows = 0;
        let mut invalid_cells = Vec::new();

        for (row, record) in table.records().iter().enumerate() {
            let group = record[group_idx].trim();
            let time = record[time_idx].trim();
            if group.is_empty() || time.is_empty() {
                skipped_rows += 1;
                continue;
            }

            let time = parse_number(time)
                .and_then(TimePoint::new)
                .ok_or_else(|| invalid_cell(&columns.time, row, time))?;

            let value = record[value_idx].trim();
            let measurement = if is_missing(value) {
                None
            } else {
                let parsed = parse_number(value);
                if parsed.is_none() {
                    invalid_cells.push(InvalidCell {
                        row,
                        column: columns.measurement.clone(),
                        value: value.to_string(),
                    });
                }
                parsed
            };

            observations.push(Observation {
                row,
                group: group.to_string(),
                time,
                measurement,
            });
        }

        if skipped_rows > 0 {
            warn!(
                "Skipped {} row(s) with an empty '{}' or '{}' cell",
                skipped_rows, columns.group, columns.time
            );
        }
        if let Some(first) = invalid_cells.first() {
            warn!(
                "{} non-numeric '{}' cell(s) treated as missing; first: {}",
                invalid_cells.len(),
                columns.measurement,
                first
            );
        }
        debug!(
            "Built dataset with {} observations from {} rows",
            observations.len(),
            table.len()
        );

        Ok(Self {
            columns: columns.clone(),
            observations,
            skipped_rows,
            invalid_cells,
        })
    }

    /// Build a dataset directly from observations
    pub fn from_observations(columns: ColumnSelection, observations: Vec<Observation>) -> Self {
        Self {
            columns,
            observations,
            skipped_rows: 0,
            invalid_cells: Vec::new(),
        }
    }

    /// Columns the dataset was read from
    pub fn columns(&self) -> &ColumnSelection {
        &self.columns
    }

    /// All observations in source order
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct group labels, sorted
    pub fn groups(&self) -> Vec<String> {
        self.observations
            .iter()
            .map(|o| o.group.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct time points, sorted
    pub fn time_points(&self) -> Vec<TimePoint> {
        self.observations
            .iter()
            .map(|o| o.time)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True if there are no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rows dropped because the group or time cell was empty
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Non-numeric measurement cells, in row order
    pub fn invalid_cells(&self) -> &[InvalidCell] {
        &self.invalid_cells
    }
}

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| value.eq_ignore_ascii_case(marker))
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn invalid_cell(column: &str, row: usize, value: &str) -> AnalysisError {
    let cell = InvalidCell {
        row,
        column: column.to_string(),
        value: value.to_string(),
    };
    AnalysisError::Configuration(cell.to_string())
}
