//! Analysis configuration.
//!
//! Column names come from arbitrary uploaded schemas, so the user-facing
//! [`AnalysisOptions`] are all optional and are resolved against a loaded
//! [`Table`] and [`Dataset`] into a validated [`AnalysisConfig`] before any
//! computation runs. An invalid selection is an
//! [`AnalysisError::Configuration`], never an index fault.
//!
//! Defaults follow the study viewer: group column `Group`, time column `Day`
//! (falling back to the first column), the first remaining column as the
//! measurement, the last time point for statistics and the first group in
//! sorted order as control.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dataset::{Dataset, TimePoint};
use crate::error::AnalysisError;
use crate::filter::TimeSelection;
use crate::table::Table;

/// Default name of the group label column
pub const DEFAULT_GROUP_COLUMN: &str = "Group";

/// Default name of the time column
pub const DEFAULT_TIME_COLUMN: &str = "Day";

/// The three columns an analysis reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    /// Group label column
    pub group: String,
    /// Time (day) column
    pub time: String,
    /// Numeric measurement column
    pub measurement: String,
}

impl ColumnSelection {
    /// Create a selection from explicit column names
    pub fn new(group: &str, time: &str, measurement: &str) -> Self {
        Self {
            group: group.to_string(),
            time: time.to_string(),
            measurement: measurement.to_string(),
        }
    }

    /// Check that all three columns exist in the table and are distinct
    pub fn validate(&self, table: &Table) -> Result<(), AnalysisError> {
        for (role, name) in [
            ("group", &self.group),
            ("time", &self.time),
            ("measurement", &self.measurement),
        ] {
            if !table.has_column(name) {
                return Err(AnalysisError::Configuration(format!(
                    "{} column '{}' not found (available: {})",
                    role,
                    name,
                    table.headers().join(", ")
                )));
            }
        }
        if self.group == self.time
            || self.group == self.measurement
            || self.time == self.measurement
        {
            return Err(AnalysisError::Configuration(format!(
                "group, time and measurement columns must differ (got '{}', '{}', '{}')",
                self.group, self.time, self.measurement
            )));
        }
        Ok(())
    }
}

/// User-facing analysis options; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Group label column
    pub group_column: Option<String>,
    /// Time column
    pub time_column: Option<String>,
    /// Measurement column
    pub measurement_column: Option<String>,
    /// Inclusive time window for the trend table
    pub time_range: Option<(f64, f64)>,
    /// Groups to include; all groups when absent
    pub selected_groups: Option<Vec<String>>,
    /// Time point for the statistics step, or `"pooled"`
    pub statistic_time_point: Option<TimeSelection>,
    /// Control group for Dunnett's test
    pub control_group: Option<String>,
}

impl AnalysisOptions {
    /// Overlay `overrides` on top of `self`; set fields in `overrides` win
    pub fn merged_with(self, overrides: AnalysisOptions) -> AnalysisOptions {
        AnalysisOptions {
            group_column: overrides.group_column.or(self.group_column),
            time_column: overrides.time_column.or(self.time_column),
            measurement_column: overrides.measurement_column.or(self.measurement_column),
            time_range: overrides.time_range.or(self.time_range),
            selected_groups: overrides.selected_groups.or(self.selected_groups),
            statistic_time_point: overrides
                .statistic_time_point
                .or(self.statistic_time_point),
            control_group: overrides.control_group.or(self.control_group),
        }
    }

    /// Pick the three analysis columns, applying defaults, and validate them
    pub fn columns(&self, table: &Table) -> Result<ColumnSelection, AnalysisError> {
        let headers = table.headers();
        let fallback = |preferred: &str| -> Option<String> {
            if table.has_column(preferred) {
                Some(preferred.to_string())
            } else {
                headers.first().cloned()
            }
        };

        let group = match &self.group_column {
            Some(name) => name.clone(),
            None => fallback(DEFAULT_GROUP_COLUMN).ok_or_else(no_columns)?,
        };
        let time = match &self.time_column {
            Some(name) => name.clone(),
            None => fallback(DEFAULT_TIME_COLUMN).ok_or_else(no_columns)?,
        };
        let measurement = match &self.measurement_column {
            Some(name) => name.clone(),
            None => headers
                .iter()
                .find(|h| **h != group && **h != time)
                .cloned()
                .ok_or_else(|| {
                    AnalysisError::Configuration(
                        "no column left to use as the measurement".to_string(),
                    )
                })?,
        };

        let selection = ColumnSelection {
            group,
            time,
            measurement,
        };
        selection.validate(table)?;
        Ok(selection)
    }

    /// Resolve the remaining options against a loaded dataset
    pub fn resolve(&self, dataset: &Dataset) -> Result<AnalysisConfig, AnalysisError> {
        let groups = dataset.groups();

        let time_range = match self.time_range {
            Some((lo, hi)) => {
                let (lo, hi) = match (TimePoint::new(lo), TimePoint::new(hi)) {
                    (Some(lo), Some(hi)) => (lo, hi),
                    _ => {
                        return Err(AnalysisError::Configuration(
                            "time range bounds must be numbers".to_string(),
                        ))
                    }
                };
                if lo > hi {
                    return Err(AnalysisError::Configuration(format!(
                        "time range is inverted: {} > {}",
                        lo, hi
                    )));
                }
                Some((lo, hi))
            }
            None => None,
        };

        let selected_groups = match &self.selected_groups {
            Some(selected) => {
                if let Some(unknown) = selected.iter().find(|g| !groups.contains(*g)) {
                    return Err(AnalysisError::Configuration(format!(
                        "selected group '{}' does not occur in column '{}'",
                        unknown,
                        dataset.columns().group
                    )));
                }
                Some(selected.iter().cloned().collect::<BTreeSet<_>>())
            }
            None => None,
        };

        let statistic_time_point = match self.statistic_time_point {
            Some(selection) => selection,
            None => dataset
                .time_points()
                .last()
                .copied()
                .map(TimeSelection::At)
                .unwrap_or(TimeSelection::Pooled),
        };

        let control_group = match &self.control_group {
            Some(control) => {
                if !groups.contains(control) {
                    return Err(AnalysisError::Configuration(format!(
                        "control group '{}' does not occur in column '{}'",
                        control,
                        dataset.columns().group
                    )));
                }
                Some(control.clone())
            }
            None => groups.first().cloned(),
        };

        Ok(AnalysisConfig {
            columns: dataset.columns().clone(),
            time_range,
            selected_groups,
            statistic_time_point,
            control_group,
        })
    }
}

fn no_columns() -> AnalysisError {
    AnalysisError::Configuration("study file has no columns".to_string())
}

/// Fully resolved analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// Columns the dataset was built from
    pub columns: ColumnSelection,
    /// Inclusive time window; the whole study when `None`
    pub time_range: Option<(TimePoint, TimePoint)>,
    /// Groups to include; all groups when `None`
    pub selected_groups: Option<BTreeSet<String>>,
    /// Time point (or pooled) used by the statistics step
    pub statistic_time_point: TimeSelection,
    /// Control group; `None` only when the dataset has no groups at all
    pub control_group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(csv: &str) -> Table {
        Table::from_reader(Cursor::new(csv), b',').unwrap()
    }

    const STUDY: &str = "Animal,Group,Day,BodyWeight,Food\n\
        1,G1,0,20.1,5\n2,G2,0,20.4,5\n1,G1,7,22.0,6\n2,G2,7,21.0,4\n";

    #[test]
    fn test_default_columns() {
        let table = table(STUDY);
        let columns = AnalysisOptions::default().columns(&table).unwrap();
        assert_eq!(columns, ColumnSelection::new("Group", "Day", "Animal"));
    }

    #[test]
    fn test_explicit_columns() {
        let table = table(STUDY);
        let options = AnalysisOptions {
            measurement_column: Some("BodyWeight".to_string()),
            ..Default::default()
        };
        let columns = options.columns(&table).unwrap();
        assert_eq!(columns.measurement, "BodyWeight");
    }

    #[test]
    fn test_missing_column_is_configuration_error() {
        let table = table(STUDY);
        let options = AnalysisOptions {
            measurement_column: Some("Weight".to_string()),
            ..Default::default()
        };
        let err = options.columns(&table).unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(err.to_string().contains("'Weight'"));
    }

    #[test]
    fn test_duplicate_column_roles_rejected() {
        let table = table(STUDY);
        let options = AnalysisOptions {
            measurement_column: Some("Day".to_string()),
            ..Default::default()
        };
        assert!(options.columns(&table).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let table = table(STUDY);
        let options = AnalysisOptions {
            measurement_column: Some("BodyWeight".to_string()),
            ..Default::default()
        };
        let columns = options.columns(&table).unwrap();
        let dataset = Dataset::from_table(&table, &columns).unwrap();
        let config = options.resolve(&dataset).unwrap();

        assert_eq!(config.statistic_time_point, TimeSelection::At(TimePoint::from(7)));
        assert_eq!(config.control_group.as_deref(), Some("G1"));
        assert!(config.time_range.is_none());
        assert!(config.selected_groups.is_none());
    }

    #[test]
    fn test_resolve_rejects_unknown_control_and_inverted_range() {
        let table = table(STUDY);
        let columns = ColumnSelection::new("Group", "Day", "BodyWeight");
        let dataset = Dataset::from_table(&table, &columns).unwrap();

        let options = AnalysisOptions {
            control_group: Some("G9".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            options.resolve(&dataset),
            Err(AnalysisError::Configuration(_))
        ));

        let options = AnalysisOptions {
            time_range: Some((7.0, 0.0)),
            ..Default::default()
        };
        assert!(options.resolve(&dataset).is_err());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = AnalysisOptions {
            control_group: Some("G1".to_string()),
            measurement_column: Some("BodyWeight".to_string()),
            ..Default::default()
        };
        let flags = AnalysisOptions {
            control_group: Some("G2".to_string()),
            ..Default::default()
        };
        let merged = file.merged_with(flags);
        assert_eq!(merged.control_group.as_deref(), Some("G2"));
        assert_eq!(merged.measurement_column.as_deref(), Some("BodyWeight"));
    }
}
