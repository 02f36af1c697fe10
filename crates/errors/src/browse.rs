//! Datastore browser error types

use thiserror::Error;

/// Errors raised by the storage browser provider.
///
/// Every variant is per-object recoverable: a failed browse skips one
/// datastore, a failed probe is treated as "descriptor not found".
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum BrowseError {
    #[error("datastore unreachable: {name}: {message}")]
    DatastoreUnreachable { name: String, message: String },

    #[error("datastore browse timed out after {seconds}s: {name}")]
    Timeout { name: String, seconds: u64 },

    #[error("datastore listing failed: {message}")]
    ListingFailed { message: String },

    #[error("descriptor probe failed in {folder}: {message}")]
    ProbeFailed { folder: String, message: String },

    #[error("invalid search pattern: {pattern}")]
    InvalidPattern { pattern: String },
}

impl BrowseError {
    /// Browse errors never terminate the pass on their own
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        false
    }
}
