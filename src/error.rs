use thiserror::Error;

/// Failures surfaced by the gesture core.
///
/// A duplicate daily submission is not listed here: it is an expected
/// outcome and is reported through [`crate::attempts::SubmitOutcome`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed caller input. State is left untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad configuration, e.g. more daily letters than the pool holds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The attempt store could not be reached. Safe to retry.
    #[error("attempt store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
