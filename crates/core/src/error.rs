//! Unified error types for the warehouse ETL stack.
//!
//! Invocation-level failures only. Per-row defects (bad timestamps,
//! missing identifiers) are not errors; they are dropped during
//! cleaning and surface as an extracted-vs-loaded count gap.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the warehouse ETL stack.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured CSV source path does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// The CSV header is missing required columns (sorted).
    #[error("missing required columns: {}", .0.join(", "))]
    SchemaValidation(Vec<String>),

    /// The CSV source could not be read or parsed.
    #[error("csv error: {0}")]
    Csv(String),

    /// A storage round-trip failed.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a source-not-found error from the offending path.
    pub fn source_not_found(path: impl Into<String>) -> Self {
        Self::SourceNotFound(path.into())
    }

    /// Create a schema-validation error; missing columns are sorted so
    /// the message is deterministic.
    pub fn schema_validation(mut missing: Vec<String>) -> Self {
        missing.sort();
        Self::SchemaValidation(missing)
    }

    pub fn csv(msg: impl Into<String>) -> Self {
        Self::Csv(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::SourceNotFound(_) => 404,
            Self::SchemaValidation(_) => 400,
            Self::Csv(_) => 400,
            Self::Validation(_) => 400,
            Self::Storage(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}
