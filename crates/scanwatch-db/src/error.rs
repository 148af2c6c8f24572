//! Error types for the storage layer.
//!
//! Every backend failure surfaces as [`DbError::StorageUnavailable`]. Callers
//! treat it as fatal for the current ingestion cycle; nothing here retries.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The backing store could not be reached or rejected the command.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<fred::error::Error> for DbError {
    fn from(source: fred::error::Error) -> Self {
        Self::StorageUnavailable(source.to_string())
    }
}
