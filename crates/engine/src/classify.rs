//! Classification engine
//!
//! Reconciles the datastore scan against the registered disk index.
//! The heuristics run as one ordered chain, first match wins:
//!
//! 1. direct path match against the registered set (definite),
//! 2. containing folder marked in use by an active VM,
//! 3. VM-descriptor probe next to the file (unregistered-but-owned),
//! 4. stripped base name maps to a registered base disk,
//! 5. orphaned, with a reason code.
//!
//! Direct evidence always dominates inference: a registered path can
//! never be reported as orphaned, whatever the probes say. The
//! descriptor probe is itself fallible; a failed probe counts as "not
//! found" and the chain continues rather than failing the file.

use tracing::debug;
use vsaudit_config::Config;
use vsaudit_errors::Error;
use vsaudit_events::{AppEvent, EventEmitter, EventSender, ScanEvent};
use vsaudit_providers::StorageBrowser;
use vsaudit_types::{
    dspath, CancellationFlag, Classification, ClassificationRecord, Confidence, DiscoveredFile,
    OrphanReason,
};

use crate::index::RegisteredDiskIndex;

/// Counters from one classification pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyStats {
    pub probes_failed: usize,
}

/// Classify every discovered file against the fully built index.
///
/// Emits exactly one record per input file: dependent helpers were
/// excluded by the scanner, so everything arriving here is a candidate.
///
/// # Errors
///
/// Returns an error only on cancellation; no per-file failure aborts
/// the pass.
pub async fn classify(
    discovered: &[DiscoveredFile],
    index: &RegisteredDiskIndex,
    browser: &dyn StorageBrowser,
    config: &Config,
    tx: &EventSender,
    cancel: &CancellationFlag,
) -> Result<(Vec<ClassificationRecord>, ClassifyStats), Error> {
    let mut records = Vec::with_capacity(discovered.len());
    let mut stats = ClassifyStats::default();

    for file in discovered {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        records.push(classify_one(file, index, browser, config, tx, &mut stats).await);
    }

    Ok((records, stats))
}

async fn classify_one(
    file: &DiscoveredFile,
    index: &RegisteredDiskIndex,
    browser: &dyn StorageBrowser,
    config: &Config,
    tx: &EventSender,
    stats: &mut ClassifyStats,
) -> ClassificationRecord {
    // 1. Direct match: the path itself is registered
    if let Some(owner) = index.lookup(&file.full_path) {
        let (status, reason) = if owner.template_only {
            (
                Classification::TemplateOwned,
                format!("registered to template {}", owner.name),
            )
        } else {
            (
                Classification::InUse,
                format!("registered to VM {}", owner.name),
            )
        };
        return record(file, status, reason, Confidence::Definite, Some(owner.name));
    }

    // 2. Directory match: the folder belongs to an active VM, so this
    // is auxiliary content of that VM (snapshot chain member, spill
    // file) rather than an orphan
    if let Some(vm) = index.directory_owner(&file.folder_path) {
        return record(
            file,
            Classification::InUse,
            format!("resides in directory of VM {vm}"),
            Confidence::Heuristic,
            Some(vm.to_string()),
        );
    }

    // 3. Descriptor probe: a VM configuration file next to the disk
    // means an unregistered or detached VM owns it
    let stem = dspath::file_stem(&file.file_name);
    let base = dspath::strip_dependent_suffix(stem);
    let descriptor = format!("{base}.vmx");
    let mut descriptor_probed = false;
    let timeout = config.call_timeout();
    let probe = tokio::time::timeout(timeout, browser.probe_exists(&file.folder_path, &descriptor))
        .await
        .map_err(|_| format!("probe timed out after {}s", timeout.as_secs()))
        .and_then(|r| r.map_err(|e| e.to_string()));
    match probe {
        Ok(true) => {
            return record(
                file,
                Classification::UnregisteredOwned,
                format!("VM descriptor {descriptor} present but not in inventory"),
                Confidence::Heuristic,
                None,
            );
        }
        Ok(false) => descriptor_probed = true,
        Err(reason) => {
            // Treated as "not found"; the chain continues
            debug!(folder = %file.folder_path, %reason, "descriptor probe failed");
            stats.probes_failed += 1;
            tx.emit(AppEvent::Scan(ScanEvent::ProbeFailed {
                folder: file.folder_path.clone(),
                reason,
            }));
        }
    }

    // 4. Base-disk check: a dependent variant whose base disk is
    // registered belongs to that base
    if base.len() != stem.len() {
        // Root-of-datastore folders join with a space, like full_path
        let folder = file.folder_path.trim_end_matches('/');
        let base_path = if folder.ends_with(']') {
            format!("{folder} {base}.vmdk")
        } else {
            format!("{folder}/{base}.vmdk")
        };
        if let Some(owner) = index.lookup(&base_path) {
            return record(
                file,
                Classification::InUse,
                format!("variant of registered base disk {base}.vmdk"),
                Confidence::Heuristic,
                Some(owner.name),
            );
        }
    }

    // 5. Orphaned
    let reason = orphan_reason(file, descriptor_probed, config);
    record(
        file,
        Classification::Orphaned,
        reason.as_str().to_string(),
        Confidence::Heuristic,
        None,
    )
}

fn orphan_reason(file: &DiscoveredFile, descriptor_probed: bool, config: &Config) -> OrphanReason {
    let lowered = file.full_path.to_lowercase();
    if config
        .scan
        .recovery_folder_markers
        .iter()
        .any(|marker| lowered.contains(marker.as_str()))
    {
        return OrphanReason::RecoveryFolder;
    }
    if descriptor_probed {
        // The probe ran and definitively found nothing
        return OrphanReason::NoDescriptorFound;
    }
    OrphanReason::NotRegistered
}

fn record(
    file: &DiscoveredFile,
    status: Classification,
    reason_code: String,
    confidence: Confidence,
    owner: Option<String>,
) -> ClassificationRecord {
    ClassificationRecord {
        file: file.clone(),
        status,
        reason_code,
        confidence,
        owner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vsaudit_errors::BrowseError;
    use vsaudit_providers::{DatastoreSummary, RawFileInfo};
    use vsaudit_types::DiskReference;

    /// Browser that finds no descriptors
    struct NoDescriptors;

    #[async_trait]
    impl StorageBrowser for NoDescriptors {
        async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
            Ok(Vec::new())
        }

        async fn traverse_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
            Ok(Vec::new())
        }

        async fn browse(
            &self,
            _datastore: &str,
            _pattern: &str,
        ) -> Result<Vec<RawFileInfo>, BrowseError> {
            Ok(Vec::new())
        }

        async fn probe_exists(
            &self,
            _folder_path: &str,
            _pattern: &str,
        ) -> Result<bool, BrowseError> {
            Ok(false)
        }
    }

    /// Browser whose probes always fail
    struct BrokenProbes;

    #[async_trait]
    impl StorageBrowser for BrokenProbes {
        async fn list_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
            Ok(Vec::new())
        }

        async fn traverse_datastores(&self) -> Result<Vec<DatastoreSummary>, BrowseError> {
            Ok(Vec::new())
        }

        async fn browse(
            &self,
            _datastore: &str,
            _pattern: &str,
        ) -> Result<Vec<RawFileInfo>, BrowseError> {
            Ok(Vec::new())
        }

        async fn probe_exists(
            &self,
            folder_path: &str,
            _pattern: &str,
        ) -> Result<bool, BrowseError> {
            Err(BrowseError::ProbeFailed {
                folder: folder_path.to_string(),
                message: "search task failed".to_string(),
            })
        }
    }

    fn template_index(path: &str) -> RegisteredDiskIndex {
        let mut index = RegisteredDiskIndex::default();
        index.insert(&DiskReference {
            owning_entity_name: "gold-image".to_string(),
            path: path.to_string(),
            is_template_owner: true,
        });
        index
    }

    async fn classify_single(
        file: DiscoveredFile,
        index: &RegisteredDiskIndex,
        browser: &dyn StorageBrowser,
    ) -> (ClassificationRecord, ClassifyStats) {
        let (tx, _rx) = vsaudit_events::channel();
        let cancel = CancellationFlag::new();
        let (mut records, stats) =
            classify(&[file], index, browser, &Config::default(), &tx, &cancel)
                .await
                .expect("classify");
        (records.remove(0), stats)
    }

    #[tokio::test]
    async fn failed_probe_continues_the_chain() {
        let file = DiscoveredFile::new("ds1", "[ds1] stray", "stray.vmdk", 100, None);
        let (record, stats) =
            classify_single(file, &RegisteredDiskIndex::default(), &BrokenProbes).await;

        // The probe never ran to completion, so the weaker reason applies
        assert_eq!(record.status, Classification::Orphaned);
        assert_eq!(record.reason_code, "not registered to any inventory object");
        assert_eq!(stats.probes_failed, 1);
    }

    #[tokio::test]
    async fn failed_probe_emits_an_event() {
        let (tx, mut rx) = vsaudit_events::channel();
        let cancel = CancellationFlag::new();
        let file = DiscoveredFile::new("ds1", "[ds1] stray", "stray.vmdk", 100, None);
        classify(
            &[file],
            &RegisteredDiskIndex::default(),
            &BrokenProbes,
            &Config::default(),
            &tx,
            &cancel,
        )
        .await
        .expect("classify");

        let event = rx.try_recv().expect("probe event");
        assert!(matches!(
            event,
            AppEvent::Scan(ScanEvent::ProbeFailed { .. })
        ));
    }

    #[tokio::test]
    async fn variant_of_registered_base_is_in_use() {
        // Template bases never mark their directory, so only the
        // base-disk check can claim the variant
        let index = template_index("[ds1] gold/gold.vmdk");
        let file = DiscoveredFile::new("ds1", "[ds1] gold", "gold-000001.vmdk", 100, None);
        let (record, _) = classify_single(file, &index, &NoDescriptors).await;

        assert_eq!(record.status, Classification::InUse);
        assert_eq!(record.confidence, Confidence::Heuristic);
        assert_eq!(record.owner.as_deref(), Some("gold-image"));
    }

    #[tokio::test]
    async fn root_level_variant_matches_root_base() {
        // Base disk at the datastore root: the folder is just "[ds1]"
        // and the base path joins with a space, not a slash
        let index = template_index("[ds1] gold.vmdk");
        let file = DiscoveredFile::new("ds1", "[ds1]", "gold-000001.vmdk", 100, None);
        let (record, _) = classify_single(file, &index, &NoDescriptors).await;

        assert_eq!(record.status, Classification::InUse);
        assert_eq!(record.owner.as_deref(), Some("gold-image"));
    }

    #[tokio::test]
    async fn unmatched_variant_stays_orphaned() {
        let index = template_index("[ds1] gold/gold.vmdk");
        let file = DiscoveredFile::new("ds1", "[ds1] other", "other-000001.vmdk", 100, None);
        let (record, _) = classify_single(file, &index, &NoDescriptors).await;

        assert_eq!(record.status, Classification::Orphaned);
        assert_eq!(record.reason_code, "no VM descriptor found");
    }
}
