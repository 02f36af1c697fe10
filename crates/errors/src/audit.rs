//! Audit orchestration error types

use thiserror::Error;

/// Phase of the audit pass in which a fatal error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuditPhase {
    /// Listing virtual machines
    VmListing,
    /// Building the registered disk index
    IndexBuild,
    /// Listing datastores
    DatastoreListing,
    /// Scanning datastores for disk files
    DatastoreScan,
    /// Reconciling discovered files against the index
    Classification,
    /// Flattening snapshot trees
    SnapshotWalk,
}

impl AuditPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VmListing => "vm-listing",
            Self::IndexBuild => "index-build",
            Self::DatastoreListing => "datastore-listing",
            Self::DatastoreScan => "datastore-scan",
            Self::Classification => "classification",
            Self::SnapshotWalk => "snapshot-walk",
        }
    }
}

impl std::fmt::Display for AuditPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors surfaced by the audit orchestration layer.
///
/// Per-object failures never reach this type; by the time an
/// `AuditError` is constructed the pass is over and the caller gets a
/// single structured error naming the phase that failed.
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AuditError {
    #[error("audit pass failed in phase {phase}: {message}")]
    PhaseFailed { phase: AuditPhase, message: String },

    #[error("both primary and fallback strategies failed in phase {phase}: {message}")]
    StrategiesExhausted { phase: AuditPhase, message: String },
}

impl AuditError {
    /// Wrap a phase failure around an underlying error
    pub fn phase_failed(phase: AuditPhase, cause: impl std::fmt::Display) -> Self {
        Self::PhaseFailed {
            phase,
            message: cause.to_string(),
        }
    }
}
