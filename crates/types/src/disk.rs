//! Disk attachment and classification types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One virtual-disk attachment on a registered VM.
///
/// Built transiently per inventory pass and immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskReference {
    /// Name of the VM or template owning the disk
    pub owning_entity_name: String,
    /// Datastore-qualified path, e.g. `[ds1] vmA/vmA.vmdk`
    pub path: String,
    /// `true` when the owning entity is a template
    pub is_template_owner: bool,
}

/// One disk-image file found during a datastore walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    pub datastore_name: String,
    /// Datastore-qualified containing folder, e.g. `[ds1] vmA`
    pub folder_path: String,
    pub file_name: String,
    /// Always `folder_path` joined with `file_name`
    pub full_path: String,
    pub size_bytes: i64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl DiscoveredFile {
    /// Build a discovered file, deriving `full_path` from the folder
    /// and file name so the reconstruction invariant holds.
    #[must_use]
    pub fn new(
        datastore_name: impl Into<String>,
        folder_path: impl Into<String>,
        file_name: impl Into<String>,
        size_bytes: i64,
        modified_at: Option<DateTime<Utc>>,
    ) -> Self {
        let datastore_name = datastore_name.into();
        let folder_path: String = folder_path.into();
        let file_name = file_name.into();
        let folder = folder_path.trim_end_matches('/');
        let full_path = if folder.ends_with(']') {
            // Root of the datastore: "[ds1]" + " " + name
            format!("{folder} {file_name}")
        } else {
            format!("{folder}/{file_name}")
        };
        Self {
            datastore_name,
            folder_path,
            file_name,
            full_path,
            size_bytes,
            modified_at,
        }
    }
}

/// Reconciliation outcome for one discovered file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Directly referenced by a registered, non-template VM
    InUse,
    /// Referenced only by a template
    TemplateOwned,
    /// Auto-generated dependent artifact, never independently reported
    DependentHelper,
    /// A VM descriptor accompanies the file but no live inventory
    /// object references it
    UnregisteredOwned,
    /// No discoverable owner
    Orphaned,
}

impl Classification {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InUse => "in-use",
            Self::TemplateOwned => "template-owned",
            Self::DependentHelper => "dependent-helper",
            Self::UnregisteredOwned => "unregistered-owned",
            Self::Orphaned => "orphaned",
        }
    }
}

/// How certain the classifier is about a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Backed by direct inventory evidence
    Definite,
    /// Inferred from folder layout, probes, or naming
    Heuristic,
}

/// Why a file was declared orphaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    NoDescriptorFound,
    RecoveryFolder,
    NotRegistered,
}

impl OrphanReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDescriptorFound => "no VM descriptor found",
            Self::RecoveryFolder => "located in system recovery folder",
            Self::NotRegistered => "not registered to any inventory object",
        }
    }
}

/// The reconciliation result for one discovered file.
///
/// Every discovered file that is not a dependent-helper variant
/// produces exactly one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub file: DiscoveredFile,
    pub status: Classification,
    /// Human-readable justification for the status
    pub reason_code: String,
    pub confidence: Confidence,
    /// Owning VM or template name, when one is known
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_reconstruction() {
        let f = DiscoveredFile::new("ds1", "[ds1] vmA", "vmA.vmdk", 42, None);
        assert_eq!(f.full_path, "[ds1] vmA/vmA.vmdk");

        let root = DiscoveredFile::new("ds1", "[ds1]", "top.vmdk", 1, None);
        assert_eq!(root.full_path, "[ds1] top.vmdk");

        let slashed = DiscoveredFile::new("ds1", "[ds1] vmA/", "vmA.vmdk", 42, None);
        assert_eq!(slashed.full_path, "[ds1] vmA/vmA.vmdk");
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(
            OrphanReason::NoDescriptorFound.as_str(),
            "no VM descriptor found"
        );
        assert_eq!(
            OrphanReason::RecoveryFolder.as_str(),
            "located in system recovery folder"
        );
    }
}
