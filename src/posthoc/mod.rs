//! # Post-Hoc Comparator
//!
//! Three interchangeable procedures over the same per-group samples:
//!
//! | Procedure | Compares | Family-wise control |
//! |-----------|----------|---------------------|
//! | [`Procedure::Dunnett`] | every group vs the control | joint multivariate t |
//! | [`Procedure::Tukey`] | every pair | studentized range |
//! | [`Procedure::Scheffe`] | every pair | Bonferroni (`p * pairs`, capped at 1) |
//!
//! The `Scheffe` label is kept for report compatibility; the computation is
//! the Bonferroni correction in [`bonferroni`].
//!
//! Procedures are pure functions of their inputs. Each failure is an
//! [`AnalysisError`] that callers wrap in a [`ProcedureFailure`] so one failing
//! procedure never prevents the others from running.

pub mod bonferroni;
pub mod distribution;
pub mod dunnett;
mod samples;
pub mod tukey;

pub use bonferroni::{bonferroni_pairwise, PairwiseResult, PairwiseRow};
pub use dunnett::{dunnett, DunnettResult, DunnettRow};
pub use samples::{GroupSample, GroupSamples};
pub use tukey::{tukey_hsd, TukeyResult, TukeyRow};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Significance level used by every procedure
pub const ALPHA: f64 = 0.05;

/// The selectable post-hoc procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Procedure {
    /// Dunnett's many-to-one test
    Dunnett,
    /// Tukey's HSD
    Tukey,
    /// Bonferroni-corrected pairwise t-tests (historically labelled Scheffé)
    Scheffe,
}

impl Procedure {
    /// All procedures in display order
    pub const ALL: [Procedure; 3] = [Procedure::Dunnett, Procedure::Tukey, Procedure::Scheffe];

    /// Key under which results are retained and exported
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::Dunnett => "Dunnett",
            Procedure::Tukey => "Tukey",
            Procedure::Scheffe => "Scheffe",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Procedure::Dunnett => "Dunnett",
            Procedure::Tukey => "Tukey HSD",
            Procedure::Scheffe => "Scheffe (Bonferroni corrected)",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Procedure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dunnett" => Ok(Procedure::Dunnett),
            "tukey" | "tukeyhsd" | "tukey-hsd" => Ok(Procedure::Tukey),
            "scheffe" | "scheffé" | "bonferroni" => Ok(Procedure::Scheffe),
            _ => Err(format!(
                "Unknown procedure '{}'. Valid options: dunnett, tukey, scheffe",
                s
            )),
        }
    }
}

/// Output of one procedure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "procedure")]
pub enum ComparisonResult {
    /// Dunnett's test
    Dunnett(DunnettResult),
    /// Tukey's HSD
    Tukey(TukeyResult),
    /// Bonferroni-corrected pairwise t-tests
    Scheffe(PairwiseResult),
}

impl ComparisonResult {
    /// Procedure that produced this result
    pub fn procedure(&self) -> Procedure {
        match self {
            ComparisonResult::Dunnett(_) => Procedure::Dunnett,
            ComparisonResult::Tukey(_) => Procedure::Tukey,
            ComparisonResult::Scheffe(_) => Procedure::Scheffe,
        }
    }

    /// Number of comparison rows
    pub fn len(&self) -> usize {
        match self {
            ComparisonResult::Dunnett(r) => r.rows.len(),
            ComparisonResult::Tukey(r) => r.rows.len(),
            ComparisonResult::Scheffe(r) => r.rows.len(),
        }
    }

    /// True if there are no comparison rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(comparison label, p-value)` of every significant row at [`ALPHA`]
    pub fn significant(&self) -> Vec<(String, f64)> {
        match self {
            ComparisonResult::Dunnett(r) => r
                .rows
                .iter()
                .filter(|row| row.p_value < ALPHA)
                .map(|row| (row.comparison.clone(), row.p_value))
                .collect(),
            ComparisonResult::Tukey(r) => r
                .rows
                .iter()
                .filter(|row| row.reject)
                .map(|row| (format!("{} vs {}", row.group1, row.group2), row.p_adjusted))
                .collect(),
            ComparisonResult::Scheffe(r) => r
                .rows
                .iter()
                .filter(|row| row.significant)
                .map(|row| (format!("{} vs {}", row.group_a, row.group_b), row.p_adjusted))
                .collect(),
        }
    }
}

/// A procedure that failed, with the underlying condition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} failed: {error}", .procedure.label())]
pub struct ProcedureFailure {
    /// The procedure that failed
    pub procedure: Procedure,
    /// What went wrong
    pub error: AnalysisError,
}

/// Run one procedure on per-group samples.
///
/// `control` is required by Dunnett's test only.
pub fn run(
    procedure: Procedure,
    samples: &GroupSamples,
    control: Option<&str>,
) -> Result<ComparisonResult, AnalysisError> {
    match procedure {
        Procedure::Dunnett => {
            let control = match control {
                Some(control) => control,
                None if samples.is_empty() => {
                    return Err(AnalysisError::InsufficientData(
                        "no measurements in the selected data".to_string(),
                    ))
                }
                None => {
                    return Err(AnalysisError::Configuration(
                        "no control group selected".to_string(),
                    ))
                }
            };
            dunnett(samples, control).map(ComparisonResult::Dunnett)
        }
        Procedure::Tukey => tukey_hsd(samples, ALPHA).map(ComparisonResult::Tukey),
        Procedure::Scheffe => bonferroni_pairwise(samples, ALPHA).map(ComparisonResult::Scheffe),
    }
}
