//! Error types for the cluster store.

use thiserror::Error;

/// Result type alias for cluster store operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors that can occur during cluster store operations.
///
/// `Conflict` is the one non-retryable submission failure: callers map it to
/// a permanent reconcile error. Everything else is storage-level and
/// retryable.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl ClusterError {
    /// Whether retrying the same call can ever succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Conflict(_))
    }
}
