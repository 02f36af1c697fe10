#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! External collaborator interfaces for vsaudit
//!
//! The engine reaches the virtualization cluster only through the two
//! traits defined here: the VM inventory (management API) and the
//! storage browser (file-browsing API). Session establishment and wire
//! details live behind the implementations; the engine sees async
//! calls that can individually fail or time out.
//!
//! Each trait exposes a bulk listing (the primary collection strategy)
//! and a per-folder traversal (the fallback), mirroring the two
//! retrieval paths real management endpoints offer.

pub mod offline;

pub use offline::OfflineInventory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vsaudit_errors::{BrowseError, InventoryError};
use vsaudit_types::{DiskReference, SnapshotNode};

/// One registered VM as returned by an inventory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSummary {
    pub name: String,
    pub is_template: bool,
}

/// One datastore as returned by a datastore listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreSummary {
    pub name: String,
    #[serde(default = "default_accessible")]
    pub accessible: bool,
}

fn default_accessible() -> bool {
    true
}

/// One file as returned by a datastore browse, before any filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFileInfo {
    /// Datastore-qualified containing folder, e.g. `[ds1] vmA`
    pub folder_path: String,
    pub file_name: String,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// VM inventory provider (management API boundary).
///
/// `list_virtual_machines` is the bulk retrieval path;
/// `traverse_virtual_machines` is the slower per-folder walk used as a
/// fallback. Per-VM methods fail with recoverable errors that skip one
/// VM; `InventoryError::ConnectionLost` is fatal to the pass.
#[async_trait]
pub trait VmInventory: Send + Sync {
    /// Bulk listing of every registered VM and template
    async fn list_virtual_machines(&self) -> Result<Vec<VmSummary>, InventoryError>;

    /// Conservative per-folder traversal, used when the bulk listing
    /// fails or returns an implausible result
    async fn traverse_virtual_machines(&self) -> Result<Vec<VmSummary>, InventoryError>;

    /// Disk attachments of one VM
    async fn disk_references(&self, vm_name: &str) -> Result<Vec<DiskReference>, InventoryError>;

    /// Snapshot tree roots of one VM
    async fn snapshot_roots(&self, vm_name: &str) -> Result<Vec<SnapshotNode>, InventoryError>;
}

/// Storage browser provider (file-browsing API boundary).
///
/// Every call is independently fallible; a failed browse skips one
/// datastore and a failed probe is treated as "not found".
#[async_trait]
pub trait StorageBrowser: Send + Sync {
    /// Bulk listing of every datastore
    async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError>;

    /// Per-datacenter traversal, used as the fallback listing strategy
    async fn traverse_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError>;

    /// Recursively list files on one datastore matching a glob
    async fn browse(&self, datastore: &str, pattern: &str) -> Result<Vec<RawFileInfo>, BrowseError>;

    /// Check whether a file matching `pattern` exists directly in
    /// `folder_path`
    async fn probe_exists(&self, folder_path: &str, pattern: &str) -> Result<bool, BrowseError>;
}
