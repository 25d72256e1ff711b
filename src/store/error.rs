//! Content store error types

use thiserror::Error;

/// Failures surfaced by the content store and object storage.
///
/// `NotFound` is an expected outcome for singleton and visibility lookups;
/// callers map it to a default instead of reporting it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network, auth or server-side failure
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// No row matched
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object storage write failed (including name collisions)
    #[error("Upload failed: {0}")]
    Upload(String),

    /// A row with the same id already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rejected before any I/O happened
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Upload refused because the object exists and overwrite was off
    pub fn is_collision(&self) -> bool {
        matches!(self, StoreError::Upload(msg) if msg.starts_with(OBJECT_EXISTS))
    }

    pub(crate) fn object_exists(path: &str) -> Self {
        StoreError::Upload(format!("{}: {}", OBJECT_EXISTS, path))
    }
}

const OBJECT_EXISTS: &str = "object already exists";

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Fetch(format!("request timed out: {}", e))
        } else {
            StoreError::Fetch(e.to_string())
        }
    }
}
