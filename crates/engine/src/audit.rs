//! Top-level audit pass
//!
//! Drives the phases in their fixed order: VM listing, index build,
//! datastore listing, datastore scan, classification, snapshot walk.
//! Each phase either completes or converts its failure into a single
//! structured error naming the phase, so the caller never sees a
//! partial report.

use chrono::Utc;
use tracing::{info, instrument};
use vsaudit_config::Config;
use vsaudit_errors::{AuditError, AuditPhase, Error};
use vsaudit_events::{
    AppEvent, AuditEvent, EventEmitter, EventSender, InventoryEvent, ScanEvent,
};
use vsaudit_providers::{StorageBrowser, VmInventory};
use vsaudit_types::{AuditReport, CancellationFlag, Coverage};

use crate::classify::classify;
use crate::index::build_index;
use crate::orchestrator::collect_with_fallback;
use crate::scan::scan_datastores;
use crate::snapshots::collect_snapshots;

/// Run one complete audit pass against the given providers.
///
/// The report is produced only when every phase completes; a cancelled
/// pass surfaces [`Error::Cancelled`] and a failed phase surfaces
/// [`AuditError::PhaseFailed`] naming the phase.
///
/// # Errors
///
/// Returns an error when a phase fails fatally, when both listing
/// strategies of a phase fail, or when the pass is cancelled.
#[instrument(skip_all)]
pub async fn run_audit(
    inventory: &dyn VmInventory,
    browser: &dyn StorageBrowser,
    config: &Config,
    tx: &EventSender,
    cancel: &CancellationFlag,
) -> Result<AuditReport, Error> {
    tx.emit(AppEvent::Audit(AuditEvent::Started));

    // Phase 1: VM listing, with traversal fallback
    let phase = AuditPhase::VmListing;
    tx.emit(phase_started(phase));
    let vm_outcome = collect_with_fallback(
        phase,
        true,
        inventory.list_virtual_machines(),
        inventory.traverse_virtual_machines(),
        tx,
    )
    .await
    .map_err(|e| seal(phase, e, tx))?;
    tx.emit(AppEvent::Inventory(InventoryEvent::VmListed {
        count: vm_outcome.items.len(),
    }));
    tx.emit(phase_completed(phase));

    // Phase 2: registered disk index, complete before any classification
    let phase = AuditPhase::IndexBuild;
    tx.emit(phase_started(phase));
    let (index, index_stats) = build_index(inventory, &vm_outcome.items, config, tx, cancel)
        .await
        .map_err(|e| seal(phase, e, tx))?;
    tx.emit(phase_completed(phase));

    // Phase 3: datastore listing, with traversal fallback
    let phase = AuditPhase::DatastoreListing;
    tx.emit(phase_started(phase));
    let ds_outcome = collect_with_fallback(
        phase,
        true,
        browser.list_datastores(),
        browser.traverse_datastores(),
        tx,
    )
    .await
    .map_err(|e| seal(phase, e, tx))?;
    tx.emit(AppEvent::Scan(ScanEvent::DatastoreListed {
        count: ds_outcome.items.len(),
    }));
    tx.emit(phase_completed(phase));

    // Phase 4: walk every accessible datastore
    let phase = AuditPhase::DatastoreScan;
    tx.emit(phase_started(phase));
    let (discovered, scan_stats) =
        scan_datastores(browser, &ds_outcome.items, config, tx, cancel)
            .await
            .map_err(|e| seal(phase, e, tx))?;
    tx.emit(phase_completed(phase));

    // Phase 5: reconcile discovered files against the index
    let phase = AuditPhase::Classification;
    tx.emit(phase_started(phase));
    let (classifications, classify_stats) =
        classify(&discovered, &index, browser, config, tx, cancel)
            .await
            .map_err(|e| seal(phase, e, tx))?;
    tx.emit(phase_completed(phase));

    // Phase 6: flatten snapshot trees
    let phase = AuditPhase::SnapshotWalk;
    tx.emit(phase_started(phase));
    let (snapshots, snapshot_skips) =
        collect_snapshots(inventory, &vm_outcome.items, config, tx, cancel)
            .await
            .map_err(|e| seal(phase, e, tx))?;
    tx.emit(phase_completed(phase));

    let coverage = Coverage {
        vms_visited: index_stats.vms_visited,
        vms_skipped: index_stats.vms_skipped + snapshot_skips,
        datastores_scanned: scan_stats.datastores_scanned,
        datastores_skipped: scan_stats.datastores_skipped,
        dependent_files_excluded: scan_stats.dependent_files_excluded,
        probes_failed: classify_stats.probes_failed,
        vm_listing_strategy: Some(vm_outcome.strategy),
        datastore_listing_strategy: Some(ds_outcome.strategy),
    };

    let report = AuditReport {
        generated_at: Utc::now(),
        classifications,
        snapshots,
        coverage,
    };

    info!(
        orphans = report.orphans().count(),
        snapshots = report.snapshots.len(),
        "audit pass complete"
    );
    tx.emit(AppEvent::Audit(AuditEvent::Completed {
        orphans: report.orphans().count(),
        snapshots: report.snapshots.len(),
    }));

    Ok(report)
}

fn phase_started(phase: AuditPhase) -> AppEvent {
    AppEvent::Audit(AuditEvent::PhaseStarted {
        phase: phase.to_string(),
    })
}

fn phase_completed(phase: AuditPhase) -> AppEvent {
    AppEvent::Audit(AuditEvent::PhaseCompleted {
        phase: phase.to_string(),
    })
}

/// Convert a phase's error into its outward form and emit the matching
/// lifecycle event. Cancellation and already-attributed audit errors
/// pass through unwrapped.
fn seal(phase: AuditPhase, err: Error, tx: &EventSender) -> Error {
    match err {
        Error::Cancelled => {
            tx.emit(AppEvent::Audit(AuditEvent::Cancelled {
                phase: phase.to_string(),
            }));
            Error::Cancelled
        }
        Error::Audit(inner) => {
            tx.emit(AppEvent::Audit(AuditEvent::Failed {
                phase: phase.to_string(),
                message: inner.to_string(),
            }));
            Error::Audit(inner)
        }
        other => {
            tx.emit(AppEvent::Audit(AuditEvent::Failed {
                phase: phase.to_string(),
                message: other.to_string(),
            }));
            AuditError::phase_failed(phase, other).into()
        }
    }
}
