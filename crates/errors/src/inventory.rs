//! VM inventory provider error types

use thiserror::Error;

/// Errors raised by the VM inventory provider.
///
/// Only `ConnectionLost` is fatal to an audit pass; everything else
/// degrades the affected VM to "skipped".
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InventoryError {
    #[error("inventory connection lost: {message}")]
    ConnectionLost { message: String },

    #[error("VM unavailable: {name}: {message}")]
    VmUnavailable { name: String, message: String },

    #[error("VM configuration unreadable: {name}")]
    ConfigUnreadable { name: String },

    #[error("inventory listing failed: {message}")]
    ListingFailed { message: String },

    #[error("inventory call timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },
}

impl InventoryError {
    /// `true` when the underlying session is gone and no further
    /// inventory call can succeed
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}
