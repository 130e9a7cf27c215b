//! Error taxonomy for the picking pipeline

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PickError {
    /// Filtering emptied the candidate pool; loosening filters may help
    #[error("no restaurants matched: {scope}")]
    NoCandidatesMatched { scope: String },

    #[error("building mode is active but no buildings were selected")]
    NoBuildingsSelected,

    #[error("external lookup failed during {operation}: {status}")]
    ExternalLookupFailed { operation: &'static str, status: String },

    #[error("decay factor must be strictly between 0 and 1, got {0}")]
    InvalidDecayFactor(f64),
}

impl PickError {
    pub fn lookup(operation: &'static str, status: impl Into<String>) -> Self {
        PickError::ExternalLookupFailed { operation, status: status.into() }
    }
}

pub type PickResult<T> = std::result::Result<T, PickError>;
