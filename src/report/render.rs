//! Plain-text tables for the terminal.

use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

use super::{Cell, Sheet};
use crate::posthoc::ProcedureFailure;

impl Cell {
    /// Display form used in terminal tables (numbers to four decimals)
    pub fn display(&self) -> String {
        match self {
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => format!("{:.4}", value),
            Cell::Integer(value) => value.to_string(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Empty => String::new(),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_) | Cell::Integer(_))
    }
}

fn column_widths(sheet: &Sheet, cells: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = sheet.headers.iter().map(|h| h.chars().count()).collect();
    for row in cells {
        for (i, value) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }
    }
    widths
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{:>width$}", value, width = width)
    } else {
        format!("{:<width$}", value, width = width)
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Cell::display).collect())
            .collect();
        let widths = column_widths(self, &cells);

        writeln!(f, "{}", self.name)?;
        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w, false))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("  "))?;

        for (row, values) in self.rows.iter().zip(&cells) {
            let line: Vec<String> = row
                .iter()
                .zip(values)
                .zip(&widths)
                .map(|((cell, value), w)| pad(value, *w, cell.is_numeric()))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        if self.rows.is_empty() {
            writeln!(f, "(no rows)")?;
        }
        Ok(())
    }
}

/// Render a sheet, with a highlighted title when colors are enabled
pub fn render_sheet(sheet: &Sheet, colored: bool) -> String {
    #[cfg(feature = "colorized_output")]
    {
        if colored {
            let plain = sheet.to_string();
            let mut lines = plain.lines();
            let mut output = String::new();
            if let Some(title) = lines.next() {
                output.push_str(&format!("{}\n", style(title).bold().cyan()));
            }
            if let Some(header) = lines.next() {
                output.push_str(&format!("{}\n", style(header).bold()));
            }
            for line in lines {
                output.push_str(line);
                output.push('\n');
            }
            return output;
        }
    }
    #[cfg(not(feature = "colorized_output"))]
    let _ = colored;

    sheet.to_string()
}

/// Render a failed procedure run as a one-line message
pub fn render_failure(failure: &ProcedureFailure, colored: bool) -> String {
    #[cfg(feature = "colorized_output")]
    {
        if colored {
            use console::Emoji;
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");
            return format!(
                "[{}] {} - {}: {}\n",
                FAIL,
                style(failure.procedure.label()).red(),
                style(failure.error.kind()).red().bold(),
                failure.error
            );
        }
    }
    #[cfg(not(feature = "colorized_output"))]
    let _ = colored;

    format!(
        "[✗] {} - {}: {}\n",
        failure.procedure.label(),
        failure.error.kind(),
        failure.error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::posthoc::Procedure;

    #[test]
    fn test_sheet_display_aligns_columns() {
        let sheet = Sheet {
            name: "Stat_Tukey".to_string(),
            headers: vec!["group1".to_string(), "meandiff".to_string(), "reject".to_string()],
            rows: vec![
                vec![Cell::from("A"), Cell::from(3.0), Cell::from(true)],
                vec![Cell::from("Control"), Cell::from(-0.25), Cell::from(false)],
            ],
        };
        let text = sheet.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Stat_Tukey");
        assert_eq!(lines[1], "group1   meandiff  reject");
        assert_eq!(lines[2], "-------  --------  ------");
        assert_eq!(lines[3], "A          3.0000  True");
        assert_eq!(lines[4], "Control   -0.2500  False");
    }

    #[test]
    fn test_render_failure_plain() {
        let failure = ProcedureFailure {
            procedure: Procedure::Dunnett,
            error: AnalysisError::InsufficientData("need two groups".to_string()),
        };
        let text = render_failure(&failure, false);
        assert!(text.starts_with("[✗] Dunnett - InsufficientDataError"));
        assert!(text.contains("need two groups"));
    }
}
