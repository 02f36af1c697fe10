#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the vsaudit storage auditor
//!
//! This crate provides fine-grained error types organized by domain.
//! The dominant failure policy of the auditor is per-object degradation:
//! most errors are recoverable and cause one VM, one datastore, or one
//! probe to be skipped. The few fatal errors (loss of the inventory
//! session itself) terminate the whole pass, and each domain enum knows
//! which of its variants are fatal.

use thiserror::Error;

pub mod audit;
pub mod browse;
pub mod config;
pub mod inventory;

pub use audit::{AuditError, AuditPhase};
pub use browse::BrowseError;
pub use config::ConfigError;
pub use inventory::InventoryError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("browse error: {0}")]
    Browse(#[from] BrowseError),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create an internal error from any displayable value
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal(message.to_string())
    }

    /// `true` when the error must terminate the whole audit pass
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Inventory(e) => e.is_fatal(),
            Self::Browse(e) => e.is_fatal(),
            Self::Audit(_) | Self::Config(_) | Self::Internal(_) | Self::Cancelled => true,
        }
    }
}
