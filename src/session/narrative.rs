//! Human-readable sentences for the rolling session summary.

use crate::posthoc::{ComparisonResult, ALPHA};
use crate::summary::SummaryTable;

/// Opening sentence about the control group
pub fn describe_control(summary: &SummaryTable, control: &str) -> String {
    match summary.get(control) {
        Some(row) if row.mean.is_finite() => format!(
            "Control group {} has mean {:.2}; other groups are tested against it.",
            control, row.mean
        ),
        _ => format!(
            "Control group {} has no measurements at the selected time point.",
            control
        ),
    }
}

/// One sentence summarising a procedure result
pub fn describe_result(result: &ComparisonResult) -> String {
    let significant = result.significant();
    let list = if significant.is_empty() {
        "none".to_string()
    } else {
        significant
            .iter()
            .map(|(label, p)| format!("{} p = {}", label, format_p(*p)))
            .collect::<Vec<_>>()
            .join("; ")
    };

    match result {
        ComparisonResult::Dunnett(r) => format!(
            "Dunnett: {} of {} comparisons against {} significant at α = {} ({}).",
            significant.len(),
            r.rows.len(),
            r.control,
            ALPHA,
            list
        ),
        ComparisonResult::Tukey(r) => format!(
            "Tukey HSD: {} of {} pairs reject the null at α = {} ({}).",
            significant.len(),
            r.rows.len(),
            r.alpha,
            list
        ),
        ComparisonResult::Scheffe(r) => format!(
            "Scheffe (Bonferroni corrected): {} of {} pairs significant ({}).",
            significant.len(),
            r.rows.len(),
            list
        ),
    }
}

/// p-values below 0.0001 are shown as "< 0.0001"
pub fn format_p(p: f64) -> String {
    if p < 1e-4 {
        "< 0.0001".to_string()
    } else {
        format!("{:.4}", p)
    }
}
