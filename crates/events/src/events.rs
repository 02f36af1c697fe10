//! Domain event definitions

use serde::{Deserialize, Serialize};

/// Top-level event envelope, grouped by functional domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    Audit(AuditEvent),
    Inventory(InventoryEvent),
    Scan(ScanEvent),
    Snapshot(SnapshotEvent),
    Fallback(FallbackEvent),
}

/// Lifecycle of a whole audit pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    Started,
    PhaseStarted { phase: String },
    PhaseCompleted { phase: String },
    Completed { orphans: usize, snapshots: usize },
    Failed { phase: String, message: String },
    Cancelled { phase: String },
}

/// Registered-disk index construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryEvent {
    VmListed { count: usize },
    VmSkipped { name: String, reason: String },
    DiskRegistered { vm: String, path: String },
    IndexBuilt {
        registered_paths: usize,
        template_paths: usize,
        directories: usize,
    },
}

/// Datastore walking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanEvent {
    DatastoreListed { count: usize },
    DatastoreStarted { name: String },
    DatastoreCompleted { name: String, files: usize },
    DatastoreSkipped { name: String, reason: String },
    DependentFileExcluded { path: String },
    ProbeFailed { folder: String, reason: String },
}

/// Snapshot tree walking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotEvent {
    VmSkipped { name: String, reason: String },
    Flattened { vms: usize, snapshots: usize },
}

/// Primary/fallback strategy selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackEvent {
    /// Primary strategy failed or returned an implausibly empty result
    Engaged { phase: String, reason: String },
    Completed { phase: String, items: usize },
}
