//! Error kinds raised by the analysis pipeline.

/// Errors raised while preparing or running an analysis.
///
/// None of these are fatal to a session: they are caught at the boundary of
/// the procedure that raised them and reported to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// A selected column is missing, a value cannot be interpreted, or the
    /// control group is not part of the filtered data
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Too few groups, or a group with too few observations, for the procedure
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Numeric failure such as a degenerate (zero) variance
    #[error("computation error: {0}")]
    Computation(String),
}

impl AnalysisError {
    /// Short name of the error kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Configuration(_) => "ConfigurationError",
            AnalysisError::InsufficientData(_) => "InsufficientDataError",
            AnalysisError::Computation(_) => "ComputationError",
        }
    }
}
