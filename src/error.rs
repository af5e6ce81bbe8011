use std::fmt;
use thiserror::Error;

/// Boxed underlying cause carried by [`AuditError::DataUnavailable`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which of the two input datasets an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Results,
    Standings,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Results => write!(f, "raw results"),
            Dataset::Standings => write!(f, "materialized standings"),
        }
    }
}

/// Fatal errors for a run. Malformed individual records are not errors;
/// they are dropped or coerced during normalization.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Non-positive best-N, or missing connection parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A dataset could not be obtained. Never reported as a passing audit.
    #[error("{dataset} unavailable: {source}")]
    DataUnavailable {
        dataset: Dataset,
        #[source]
        source: BoxError,
    },
}

impl AuditError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        AuditError::InvalidConfiguration(msg.into())
    }

    pub fn unavailable(dataset: Dataset, source: impl Into<BoxError>) -> Self {
        AuditError::DataUnavailable {
            dataset,
            source: source.into(),
        }
    }
}
