//! Offline inventory provider
//!
//! Serves both collaborator traits from a recorded JSON dump of an
//! environment. Support engineers capture a dump once and replay audits
//! against it without touching the live endpoint; integration tests use
//! the same format.

use crate::{DatastoreSummary, RawFileInfo, StorageBrowser, VmInventory, VmSummary};
use async_trait::async_trait;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vsaudit_errors::{BrowseError, Error, InventoryError};
use vsaudit_types::{dspath, DiskReference, SnapshotNode};

/// One VM entry in a dump file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmDump {
    pub name: String,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub disk_paths: Vec<String>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotNode>,
}

/// One datastore entry in a dump file, with its full file listing
/// (disk images and descriptors alike, so probes behave like the real
/// browser)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreDump {
    pub name: String,
    #[serde(default = "default_accessible")]
    pub accessible: bool,
    #[serde(default)]
    pub files: Vec<RawFileInfo>,
}

fn default_accessible() -> bool {
    true
}

/// Root of the dump format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDump {
    #[serde(default)]
    pub virtual_machines: Vec<VmDump>,
    #[serde(default)]
    pub datastores: Vec<DatastoreDump>,
}

/// Provider replaying a recorded [`InventoryDump`]
#[derive(Debug, Clone)]
pub struct OfflineInventory {
    dump: InventoryDump,
}

impl OfflineInventory {
    #[must_use]
    pub fn new(dump: InventoryDump) -> Self {
        Self { dump }
    }

    /// Parse a dump from JSON text
    ///
    /// # Errors
    ///
    /// Returns an error when the text is not a valid dump document.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let dump: InventoryDump =
            serde_json::from_str(text).map_err(|e| Error::internal(format!("invalid dump: {e}")))?;
        Ok(Self::new(dump))
    }

    /// Read and parse a dump file
    ///
    /// # Errors
    ///
    /// Returns an error when the file is unreadable or not a valid
    /// dump document.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::internal(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    fn vm(&self, name: &str) -> Result<&VmDump, InventoryError> {
        self.dump
            .virtual_machines
            .iter()
            .find(|vm| vm.name == name)
            .ok_or_else(|| InventoryError::VmUnavailable {
                name: name.to_string(),
                message: "not present in dump".to_string(),
            })
    }

    fn datastore(&self, name: &str) -> Result<&DatastoreDump, BrowseError> {
        self.dump
            .datastores
            .iter()
            .find(|ds| ds.name == name)
            .ok_or_else(|| BrowseError::DatastoreUnreachable {
                name: name.to_string(),
                message: "not present in dump".to_string(),
            })
    }

    fn compile(pattern: &str) -> Result<Pattern, BrowseError> {
        // Matching is case-insensitive, like the real browser
        Pattern::new(&pattern.to_lowercase()).map_err(|_| BrowseError::InvalidPattern {
            pattern: pattern.to_string(),
        })
    }
}

#[async_trait]
impl VmInventory for OfflineInventory {
    async fn list_virtual_machines(&self) -> Result<Vec<VmSummary>, InventoryError> {
        Ok(self
            .dump
            .virtual_machines
            .iter()
            .map(|vm| VmSummary {
                name: vm.name.clone(),
                is_template: vm.is_template,
            })
            .collect())
    }

    async fn traverse_virtual_machines(&self) -> Result<Vec<VmSummary>, InventoryError> {
        // A dump has a single retrieval path; the traversal is the
        // same listing
        self.list_virtual_machines().await
    }

    async fn disk_references(&self, vm_name: &str) -> Result<Vec<DiskReference>, InventoryError> {
        let vm = self.vm(vm_name)?;
        Ok(vm
            .disk_paths
            .iter()
            .map(|path| DiskReference {
                owning_entity_name: vm.name.clone(),
                path: path.clone(),
                is_template_owner: vm.is_template,
            })
            .collect())
    }

    async fn snapshot_roots(&self, vm_name: &str) -> Result<Vec<SnapshotNode>, InventoryError> {
        Ok(self.vm(vm_name)?.snapshots.clone())
    }
}

#[async_trait]
impl StorageBrowser for OfflineInventory {
    async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
        Ok(self
            .dump
            .datastores
            .iter()
            .map(|ds| DatastoreSummary {
                name: ds.name.clone(),
                accessible: ds.accessible,
            })
            .collect())
    }

    async fn traverse_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
        self.list_datastores().await
    }

    async fn browse(&self, datastore: &str, pattern: &str) -> Result<Vec<RawFileInfo>, BrowseError> {
        let ds = self.datastore(datastore)?;
        if !ds.accessible {
            return Err(BrowseError::DatastoreUnreachable {
                name: datastore.to_string(),
                message: "not accessible".to_string(),
            });
        }
        let matcher = Self::compile(pattern)?;
        Ok(ds
            .files
            .iter()
            .filter(|f| matcher.matches(&f.file_name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn probe_exists(&self, folder_path: &str, pattern: &str) -> Result<bool, BrowseError> {
        let datastore = dspath::datastore_name(folder_path).ok_or_else(|| {
            BrowseError::ProbeFailed {
                folder: folder_path.to_string(),
                message: "folder is not datastore-qualified".to_string(),
            }
        })?;
        let ds = self.datastore(datastore).map_err(|_| BrowseError::ProbeFailed {
            folder: folder_path.to_string(),
            message: "datastore not present in dump".to_string(),
        })?;
        let matcher = Self::compile(pattern)?;
        let wanted = dspath::normalize(folder_path);
        Ok(ds.files.iter().any(|f| {
            dspath::normalize(&f.folder_path) == wanted
                && matcher.matches(&f.file_name.to_lowercase())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump() -> OfflineInventory {
        OfflineInventory::from_json(
            r#"{
                "virtual_machines": [
                    {"name": "vm01", "disk_paths": ["[ds1] vm01/vm01.vmdk"]},
                    {"name": "gold-image", "is_template": true,
                     "disk_paths": ["[ds1] gold/gold.vmdk"]}
                ],
                "datastores": [
                    {"name": "ds1", "files": [
                        {"folder_path": "[ds1] vm01", "file_name": "vm01.vmdk", "size_bytes": 10},
                        {"folder_path": "[ds1] vm01", "file_name": "vm01.vmx"},
                        {"folder_path": "[ds1] stale", "file_name": "stale.vmdk"}
                    ]}
                ]
            }"#,
        )
        .expect("parse dump")
    }

    #[tokio::test]
    async fn lists_vms_and_templates() {
        let provider = dump();
        let vms = provider.list_virtual_machines().await.expect("list");
        assert_eq!(vms.len(), 2);
        assert!(vms.iter().any(|vm| vm.is_template));
    }

    #[tokio::test]
    async fn browse_filters_by_glob() {
        let provider = dump();
        let files = provider.browse("ds1", "*.vmdk").await.expect("browse");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.file_name.ends_with(".vmdk")));
    }

    #[tokio::test]
    async fn probe_matches_folder_exactly() {
        let provider = dump();
        assert!(provider
            .probe_exists("[ds1] vm01", "vm01.vmx")
            .await
            .expect("probe"));
        assert!(!provider
            .probe_exists("[ds1] stale", "stale.vmx")
            .await
            .expect("probe"));
    }

    #[tokio::test]
    async fn unknown_vm_is_recoverable() {
        let provider = dump();
        let err = provider.disk_references("ghost").await.unwrap_err();
        assert!(!err.is_fatal());
    }
}
