//! # Report Module
//!
//! Turns the statistical summary and the retained comparison results into
//! sheets, then into an XLSX workbook or terminal tables.
//!
//! ## Workbook Layout
//!
//! ```text
//! Report.xlsx (ZIP archive)
//! ├── [Content_Types].xml
//! ├── _rels/.rels
//! ├── docProps/core.xml          # creation timestamp (only varying part)
//! ├── xl/workbook.xml            # Summary_Data, Stat_Dunnett, Stat_Tukey, Stat_Scheffe
//! ├── xl/_rels/workbook.xml.rels
//! ├── xl/styles.xml
//! └── xl/worksheets/sheetN.xml   # one per sheet
//! ```
//!
//! Procedures that were never run contribute no sheet. Sheet names are
//! truncated to the 31-character XLSX limit.

mod render;
mod xlsx;

pub use render::{render_failure, render_sheet};
pub use xlsx::{export_workbook, write_workbook, ExportError, ExportOptions};

use serde::Serialize;

use crate::posthoc::{ComparisonResult, Procedure};
use crate::session::Results;
use crate::summary::SummaryTable;

/// Name of the summary sheet
pub const SUMMARY_SHEET: &str = "Summary_Data";

/// Prefix of every comparison sheet
pub const STAT_SHEET_PREFIX: &str = "Stat_";

/// Longest sheet name XLSX accepts
pub const MAX_SHEET_NAME: usize = 31;

/// One cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text
    Text(String),
    /// Number; NaN is written as an empty cell
    Number(f64),
    /// Integer count
    Integer(i64),
    /// Boolean flag
    Bool(bool),
    /// No value
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Cell::Empty
        } else {
            Cell::Number(value)
        }
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

/// A named table ready for export or display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    /// Sheet name (already truncated)
    pub name: String,
    /// Column headers
    pub headers: Vec<String>,
    /// Data rows, each as wide as `headers`
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: String, headers: &[&str]) -> Self {
        Self {
            name,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// `prefix` + `name`, truncated to [`MAX_SHEET_NAME`] characters
pub fn sheet_name(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

/// Name of the trend table when rendered as a sheet
pub const TREND_SHEET: &str = "Trend_Data";

/// Sheet for the per-group statistical summary
pub fn summary_sheet(summary: &SummaryTable) -> Sheet {
    group_table_sheet(SUMMARY_SHEET, summary)
}

/// Sheet for the group × time trend table
pub fn trend_sheet(trend: &SummaryTable) -> Sheet {
    group_table_sheet(TREND_SHEET, trend)
}

fn group_table_sheet(name: &str, summary: &SummaryTable) -> Sheet {
    let with_time = summary.rows().iter().any(|r| r.time.is_some());
    let mut headers = vec![summary.group_column()];
    if with_time {
        headers.push("Time");
    }
    headers.extend(["count", "mean", "sem"]);
    let mut sheet = Sheet::new(name.to_string(), &headers);
    for row in summary.rows() {
        let mut cells = vec![Cell::from(row.group.as_str())];
        if with_time {
            cells.push(row.time.map(|t| Cell::from(t.value())).unwrap_or(Cell::Empty));
        }
        cells.push(Cell::from(row.count));
        cells.push(Cell::from(row.mean));
        cells.push(Cell::from(row.sem));
        sheet.rows.push(cells);
    }
    sheet
}

/// Sheet for one comparison result
pub fn comparison_sheet(result: &ComparisonResult) -> Sheet {
    let name = sheet_name(STAT_SHEET_PREFIX, result.procedure().name());
    match result {
        ComparisonResult::Dunnett(r) => {
            let mut sheet = Sheet::new(name, &["Comparison", "meandiff", "t", "p-value"]);
            for row in &r.rows {
                sheet.rows.push(vec![
                    Cell::from(row.comparison.as_str()),
                    Cell::from(row.mean_difference),
                    Cell::from(row.statistic),
                    Cell::from(row.p_value),
                ]);
            }
            sheet
        }
        ComparisonResult::Tukey(r) => {
            let mut sheet = Sheet::new(
                name,
                &["group1", "group2", "meandiff", "p-adj", "lower", "upper", "reject"],
            );
            for row in &r.rows {
                sheet.rows.push(vec![
                    Cell::from(row.group1.as_str()),
                    Cell::from(row.group2.as_str()),
                    Cell::from(row.mean_difference),
                    Cell::from(row.p_adjusted),
                    Cell::from(row.lower),
                    Cell::from(row.upper),
                    Cell::from(row.reject),
                ]);
            }
            sheet
        }
        ComparisonResult::Scheffe(r) => {
            let mut sheet = Sheet::new(
                name,
                &["group1", "group2", "meandiff", "t", "pval", "pval_corr", "significance"],
            );
            for row in &r.rows {
                sheet.rows.push(vec![
                    Cell::from(row.group_a.as_str()),
                    Cell::from(row.group_b.as_str()),
                    Cell::from(row.mean_difference),
                    Cell::from(row.statistic),
                    Cell::from(row.p_value),
                    Cell::from(row.p_adjusted),
                    Cell::from(row.marker()),
                ]);
            }
            sheet
        }
    }
}

/// Summary sheet followed by one sheet per retained result, in procedure order
pub fn report_sheets(summary: &SummaryTable, results: &Results) -> Vec<Sheet> {
    let mut sheets = vec![summary_sheet(summary)];
    for procedure in Procedure::ALL {
        if let Some(result) = results.get(&procedure) {
            sheets.push(comparison_sheet(result));
        }
    }
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posthoc::{run, GroupSamples};

    #[test]
    fn test_sheet_name_truncation() {
        assert_eq!(sheet_name(STAT_SHEET_PREFIX, "Dunnett"), "Stat_Dunnett");
        let long = sheet_name(STAT_SHEET_PREFIX, "A very long procedure name that overflows");
        assert_eq!(long.chars().count(), MAX_SHEET_NAME);
        assert!(long.starts_with("Stat_A very"));
        assert_eq!(sheet_name("", "a/b:c"), "a_b_c");
    }

    #[test]
    fn test_report_sheets_only_for_retained_results() {
        let samples = GroupSamples::from_groups(vec![
            ("A", vec![1.0, 2.0, 3.0]),
            ("B", vec![4.0, 5.0, 6.0]),
        ]);
        let mut results = Results::new();
        results.insert(
            Procedure::Scheffe,
            run(Procedure::Scheffe, &samples, None).unwrap(),
        );

        let sheets = report_sheets(&SummaryTable::default(), &results);
        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Summary_Data", "Stat_Scheffe"]);
        assert_eq!(sheets[1].rows.len(), 1);
        assert_eq!(sheets[1].rows[0][6], Cell::from("ns"));
    }

    #[test]
    fn test_summary_sheet_keeps_group_column_name() {
        let summary = crate::summary::summarize_groups(&[crate::dataset::Observation {
            row: 0,
            group: "Low".to_string(),
            time: crate::dataset::TimePoint::from(0),
            measurement: Some(2.0),
        }])
        .with_group_column("Treatment");

        let sheet = summary_sheet(&summary);
        assert_eq!(sheet.headers, vec!["Treatment", "count", "mean", "sem"]);
        assert_eq!(sheet.rows[0][0], Cell::from("Low"));

        let sheet = summary_sheet(&SummaryTable::default());
        assert_eq!(sheet.headers[0], "Group");
    }

    #[test]
    fn test_nan_becomes_empty_cell() {
        assert_eq!(Cell::from(f64::NAN), Cell::Empty);
        assert_eq!(Cell::from(1.5), Cell::Number(1.5));
    }
}
