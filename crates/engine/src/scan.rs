//! Datastore file scanner
//!
//! One browse per datastore, bounded by a semaphore, each call under
//! the per-call timeout. Dependent-helper variants are dropped here,
//! before classification ever sees them. Results from all datastores
//! are collected and sorted into a deterministic order because the
//! classifier runs single-threaded over the full candidate set.

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;
use vsaudit_config::Config;
use vsaudit_errors::{BrowseError, Error};
use vsaudit_events::{AppEvent, EventEmitter, EventSender, ScanEvent};
use vsaudit_providers::{DatastoreSummary, StorageBrowser};
use vsaudit_types::{dspath, CancellationFlag, DiscoveredFile};

/// Counters from one datastore scan
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    pub datastores_scanned: usize,
    pub datastores_skipped: usize,
    pub dependent_files_excluded: usize,
}

enum DatastoreOutcome {
    Scanned {
        files: Vec<DiscoveredFile>,
        excluded: usize,
    },
    Skipped,
}

/// Scan every datastore for disk-image files.
///
/// Per-datastore browse failures and timeouts skip that datastore with
/// an event; the scan of the remaining datastores continues.
///
/// # Errors
///
/// Returns an error only on cancellation.
pub async fn scan_datastores(
    browser: &dyn StorageBrowser,
    datastores: &[DatastoreSummary],
    config: &Config,
    tx: &EventSender,
    cancel: &CancellationFlag,
) -> Result<(Vec<DiscoveredFile>, ScanStats), Error> {
    let semaphore = Semaphore::new(config.scan.concurrent_browses);
    let timeout = config.call_timeout();

    let browses = datastores.iter().map(|ds| {
        let semaphore = &semaphore;
        async move {
            // Acquire never fails: the semaphore is never closed
            let Ok(_permit) = semaphore.acquire().await else {
                return DatastoreOutcome::Skipped;
            };
            if cancel.is_cancelled() {
                return DatastoreOutcome::Skipped;
            }
            if !ds.accessible {
                tx.emit(AppEvent::Scan(ScanEvent::DatastoreSkipped {
                    name: ds.name.clone(),
                    reason: "not accessible".to_string(),
                }));
                return DatastoreOutcome::Skipped;
            }

            tx.emit(AppEvent::Scan(ScanEvent::DatastoreStarted {
                name: ds.name.clone(),
            }));

            let result = tokio::time::timeout(timeout, browser.browse(&ds.name, &config.scan.disk_glob))
                .await
                .unwrap_or_else(|_| {
                    Err(BrowseError::Timeout {
                        name: ds.name.clone(),
                        seconds: timeout.as_secs(),
                    })
                });

            match result {
                Ok(raw_files) => {
                    let mut files = Vec::with_capacity(raw_files.len());
                    let mut excluded = 0usize;
                    for raw in raw_files {
                        if dspath::is_dependent_helper(&raw.file_name) {
                            excluded += 1;
                            if config.general.verbose_diagnostics {
                                tx.emit(AppEvent::Scan(ScanEvent::DependentFileExcluded {
                                    path: format!("{}/{}", raw.folder_path, raw.file_name),
                                }));
                            }
                            continue;
                        }
                        files.push(DiscoveredFile::new(
                            ds.name.clone(),
                            raw.folder_path,
                            raw.file_name,
                            raw.size_bytes,
                            raw.modified_at,
                        ));
                    }
                    tx.emit(AppEvent::Scan(ScanEvent::DatastoreCompleted {
                        name: ds.name.clone(),
                        files: files.len(),
                    }));
                    DatastoreOutcome::Scanned { files, excluded }
                }
                Err(e) => {
                    debug!(datastore = %ds.name, error = %e, "skipping datastore");
                    tx.emit(AppEvent::Scan(ScanEvent::DatastoreSkipped {
                        name: ds.name.clone(),
                        reason: e.to_string(),
                    }));
                    DatastoreOutcome::Skipped
                }
            }
        }
    });

    let outcomes = join_all(browses).await;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut stats = ScanStats::default();
    let mut discovered = Vec::new();
    for outcome in outcomes {
        match outcome {
            DatastoreOutcome::Scanned { files, excluded } => {
                stats.datastores_scanned += 1;
                stats.dependent_files_excluded += excluded;
                discovered.extend(files);
            }
            DatastoreOutcome::Skipped => stats.datastores_skipped += 1,
        }
    }

    // Deterministic input order for the classifier
    discovered.sort_by(|a, b| {
        (a.datastore_name.as_str(), a.full_path.as_str())
            .cmp(&(b.datastore_name.as_str(), b.full_path.as_str()))
    });

    Ok((discovered, stats))
}
