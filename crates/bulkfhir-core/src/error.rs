use thiserror::Error;

/// Core error types for BulkFHIR record handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid NDJSON at line {line}: {detail}")]
    InvalidNdjson { line: usize, detail: String },

    #[error("Record at line {line} has no resourceType field")]
    MissingResourceType { line: usize },

    #[error("Record is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidNdjson error
    pub fn invalid_ndjson(line: usize, detail: impl Into<String>) -> Self {
        Self::InvalidNdjson {
            line,
            detail: detail.into(),
        }
    }

    /// Create a new MissingResourceType error
    pub fn missing_resource_type(line: usize) -> Self {
        Self::MissingResourceType { line }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
