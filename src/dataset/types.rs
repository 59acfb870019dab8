use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A point on the study time axis (typically an integer day).
///
/// Wraps an `f64` with a total order so time points can be sorted,
/// deduplicated and compared for exact equality. NaN is never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(f64);

impl TimePoint {
    /// Create a time point; returns `None` for NaN
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        // -0.0 and 0.0 must compare equal under total_cmp
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    /// The raw value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<i32> for TimePoint {
    fn from(day: i32) -> Self {
        Self(f64::from(day))
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for TimePoint {}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// One measured record from a study file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Zero-based data row in the source table
    pub row: usize,
    /// Group label (e.g. "G1")
    pub group: String,
    /// Time value (e.g. study day)
    pub time: TimePoint,
    /// Measured value; `None` when the cell was empty or a missing marker
    pub measurement: Option<f64>,
}

impl Observation {
    /// True if the measurement is present
    pub fn is_measured(&self) -> bool {
        self.measurement.is_some()
    }
}

/// A measurement cell that is neither numeric nor a missing marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidCell {
    /// Zero-based data row in the source table
    pub row: usize,
    /// Column the cell belongs to
    pub column: String,
    /// Trimmed cell text
    pub value: String,
}

impl fmt::Display for InvalidCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}' has non-numeric value '{}' in data row {}",
            self.column,
            self.value,
            self.row + 1
        )
    }
}
