//! Registered disk index
//!
//! The index answers one question for the classifier: is this path, or
//! the directory holding it, claimed by anything in the live inventory?
//! Every disk reference is inserted under its raw, normalized, and
//! bracket-stripped forms so a lookup matches whichever representation
//! the datastore browser happens to return.

use std::collections::HashMap;

use tracing::debug;
use vsaudit_config::Config;
use vsaudit_events::{AppEvent, EventEmitter, EventSender, InventoryEvent};
use vsaudit_providers::{VmInventory, VmSummary};
use vsaudit_types::{dspath, CancellationFlag, DiskReference};
use vsaudit_errors::{Error, InventoryError};

/// Who claims a registered path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredOwner {
    pub name: String,
    /// `true` when every claim on this path comes from a template
    pub template_only: bool,
}

/// Index of disk paths referenced by the VM inventory.
///
/// Built once per pass, then treated as a read-only input to the
/// classification engine.
#[derive(Debug, Default)]
pub struct RegisteredDiskIndex {
    /// Normalized path form -> owner, for disks attached to live VMs
    in_use: HashMap<String, String>,
    /// Normalized path form -> owner, for template-owned disks
    template: HashMap<String, String>,
    /// Normalized folder -> owning VM, for directories holding an
    /// active VM's files
    directories: HashMap<String, String>,
}

impl RegisteredDiskIndex {
    /// Insert one disk reference under all its comparable forms and
    /// mark its containing folder as in use.
    pub fn insert(&mut self, disk: &DiskReference) {
        let target = if disk.is_template_owner {
            &mut self.template
        } else {
            &mut self.in_use
        };
        let normalized = dspath::normalize(&disk.path);
        if let Some(stripped) = dspath::strip_datastore_prefix(&normalized) {
            target.insert(stripped.to_string(), disk.owning_entity_name.clone());
        }
        target.insert(normalized.clone(), disk.owning_entity_name.clone());

        // Snapshot deltas and descriptors live next to the disk; the
        // folder marker keeps them from being flagged independently.
        if !disk.is_template_owner {
            let folder = dspath::normalize(dspath::parent_folder(&disk.path));
            if !folder.is_empty() {
                self.directories
                    .insert(folder, disk.owning_entity_name.clone());
            }
        }
    }

    /// Look up a path under its normalized and bracket-stripped forms
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<RegisteredOwner> {
        let normalized = dspath::normalize(path);
        let stripped = dspath::strip_datastore_prefix(&normalized).map(str::to_string);

        let find = |map: &HashMap<String, String>| {
            map.get(&normalized)
                .or_else(|| stripped.as_ref().and_then(|s| map.get(s)))
                .cloned()
        };

        if let Some(name) = find(&self.in_use) {
            return Some(RegisteredOwner {
                name,
                template_only: false,
            });
        }
        find(&self.template).map(|name| RegisteredOwner {
            name,
            template_only: true,
        })
    }

    /// Owning VM of a directory-in-use marker, if the folder carries one
    #[must_use]
    pub fn directory_owner(&self, folder: &str) -> Option<&str> {
        self.directories
            .get(&dspath::normalize(folder))
            .map(String::as_str)
    }

    #[must_use]
    pub fn registered_paths(&self) -> usize {
        self.in_use.len()
    }

    #[must_use]
    pub fn template_paths(&self) -> usize {
        self.template.len()
    }

    #[must_use]
    pub fn directories(&self) -> usize {
        self.directories.len()
    }

    /// `true` when the index saw no disk references at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_use.is_empty() && self.template.is_empty()
    }
}

/// Counters from one index build
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStats {
    pub vms_visited: usize,
    pub vms_skipped: usize,
}

/// Build the registered disk index by visiting every VM in `vms`.
///
/// A VM whose disk references are unavailable (or time out) is skipped
/// with an event; the build never aborts for per-VM failures. The index
/// is complete when this returns: classification must not start before.
///
/// # Errors
///
/// Returns an error only on loss of the inventory session or
/// cancellation.
pub async fn build_index(
    inventory: &dyn VmInventory,
    vms: &[VmSummary],
    config: &Config,
    tx: &EventSender,
    cancel: &CancellationFlag,
) -> Result<(RegisteredDiskIndex, IndexStats), Error> {
    let mut index = RegisteredDiskIndex::default();
    let mut stats = IndexStats::default();
    let timeout = config.call_timeout();

    for vm in vms {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let result = tokio::time::timeout(timeout, inventory.disk_references(&vm.name))
            .await
            .unwrap_or_else(|_| {
                Err(InventoryError::Timeout {
                    operation: format!("disk_references({})", vm.name),
                    seconds: timeout.as_secs(),
                })
            });

        let disks = match result {
            Ok(disks) => disks,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                debug!(vm = %vm.name, error = %e, "skipping VM during index build");
                stats.vms_skipped += 1;
                tx.emit(AppEvent::Inventory(InventoryEvent::VmSkipped {
                    name: vm.name.clone(),
                    reason: e.to_string(),
                }));
                continue;
            }
        };

        for disk in &disks {
            index.insert(disk);
            if config.general.verbose_diagnostics {
                tx.emit(AppEvent::Inventory(InventoryEvent::DiskRegistered {
                    vm: vm.name.clone(),
                    path: disk.path.clone(),
                }));
            }
        }
        stats.vms_visited += 1;
    }

    tx.emit(AppEvent::Inventory(InventoryEvent::IndexBuilt {
        registered_paths: index.registered_paths(),
        template_paths: index.template_paths(),
        directories: index.directories(),
    }));

    Ok((index, stats))
}
