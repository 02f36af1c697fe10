//! Report types handed to downstream consumers
//!
//! The engine produces plain data; rendering lives entirely in the
//! consumer (the CLI, or whatever report generator is wired up).

use crate::disk::ClassificationRecord;
use crate::snapshot::FlattenedSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which collection strategy produced a phase's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStrategy {
    /// Bulk retrieval succeeded on the first attempt
    Primary,
    /// The per-object fallback strategy supplied the data
    Fallback,
}

/// Coverage counters for one audit pass.
///
/// A conservative result (objects skipped, fallback engaged) is still a
/// complete result; these counters let the consumer judge how much of
/// the inventory the pass actually saw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coverage {
    pub vms_visited: usize,
    pub vms_skipped: usize,
    pub datastores_scanned: usize,
    pub datastores_skipped: usize,
    /// Dependent-helper files excluded during the scan
    pub dependent_files_excluded: usize,
    /// Descriptor probes that failed and were treated as "not found"
    pub probes_failed: usize,
    pub vm_listing_strategy: Option<CollectionStrategy>,
    pub datastore_listing_strategy: Option<CollectionStrategy>,
}

/// Complete output of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Wall-clock instant the ages in this report are relative to
    pub generated_at: DateTime<Utc>,
    pub classifications: Vec<ClassificationRecord>,
    pub snapshots: Vec<FlattenedSnapshot>,
    pub coverage: Coverage,
}

impl AuditReport {
    /// Records classified as orphaned
    pub fn orphans(&self) -> impl Iterator<Item = &ClassificationRecord> {
        self.classifications
            .iter()
            .filter(|r| r.status == crate::disk::Classification::Orphaned)
    }
}
