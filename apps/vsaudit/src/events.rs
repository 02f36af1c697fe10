//! Event handling and progress display

use console::style;
use tracing::{debug, warn};
use vsaudit_events::{
    AppEvent, AuditEvent, FallbackEvent, InventoryEvent, ScanEvent, SnapshotEvent,
};

/// Renders engine events as progress lines on stderr.
///
/// Stdout is reserved for the final report so that JSON output stays
/// machine-readable; everything here goes to stderr.
pub struct EventHandler {
    verbose: bool,
    quiet: bool,
}

impl EventHandler {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Audit(e) => self.handle_audit(e),
            AppEvent::Inventory(e) => self.handle_inventory(e),
            AppEvent::Scan(e) => self.handle_scan(e),
            AppEvent::Snapshot(e) => self.handle_snapshot(e),
            AppEvent::Fallback(e) => self.handle_fallback(e),
        }
    }

    fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    fn handle_audit(&self, event: AuditEvent) {
        match event {
            AuditEvent::Started => self.status("Starting audit pass"),
            AuditEvent::PhaseStarted { phase } => {
                debug!(%phase, "phase started");
                if self.verbose {
                    self.status(&format!("  {} {phase}", style(">").dim()));
                }
            }
            AuditEvent::PhaseCompleted { phase } => debug!(%phase, "phase completed"),
            AuditEvent::Completed { orphans, snapshots } => {
                self.status(&format!(
                    "Audit complete: {} orphaned file(s), {} snapshot(s)",
                    style(orphans).bold(),
                    style(snapshots).bold()
                ));
            }
            AuditEvent::Failed { phase, message } => {
                self.status(&format!(
                    "{} audit failed during {phase}: {message}",
                    style("error:").red().bold()
                ));
            }
            AuditEvent::Cancelled { phase } => {
                self.status(&format!("Audit cancelled during {phase}"));
            }
        }
    }

    fn handle_inventory(&self, event: InventoryEvent) {
        match event {
            InventoryEvent::VmListed { count } => {
                self.status(&format!("Found {count} virtual machine(s)"));
            }
            InventoryEvent::VmSkipped { name, reason } => {
                warn!(vm = %name, %reason, "VM skipped");
                self.status(&format!(
                    "  {} skipping VM {name}: {reason}",
                    style("warn:").yellow()
                ));
            }
            InventoryEvent::DiskRegistered { vm, path } => {
                if self.verbose {
                    self.status(&format!("  registered {path} ({vm})"));
                }
            }
            InventoryEvent::IndexBuilt {
                registered_paths,
                template_paths,
                directories,
            } => {
                debug!(registered_paths, template_paths, directories, "index built");
                self.status(&format!(
                    "Indexed {registered_paths} registered disk path(s), {template_paths} template path(s)"
                ));
            }
        }
    }

    fn handle_scan(&self, event: ScanEvent) {
        match event {
            ScanEvent::DatastoreListed { count } => {
                self.status(&format!("Found {count} datastore(s)"));
            }
            ScanEvent::DatastoreStarted { name } => {
                if self.verbose {
                    self.status(&format!("  scanning {name}"));
                }
            }
            ScanEvent::DatastoreCompleted { name, files } => {
                debug!(datastore = %name, files, "datastore scanned");
                self.status(&format!("  {name}: {files} candidate file(s)"));
            }
            ScanEvent::DatastoreSkipped { name, reason } => {
                warn!(datastore = %name, %reason, "datastore skipped");
                self.status(&format!(
                    "  {} skipping datastore {name}: {reason}",
                    style("warn:").yellow()
                ));
            }
            ScanEvent::DependentFileExcluded { path } => {
                if self.verbose {
                    self.status(&format!("  excluded helper {path}"));
                }
            }
            ScanEvent::ProbeFailed { folder, reason } => {
                debug!(%folder, %reason, "descriptor probe failed");
                if self.verbose {
                    self.status(&format!("  probe failed in {folder}: {reason}"));
                }
            }
        }
    }

    fn handle_snapshot(&self, event: SnapshotEvent) {
        match event {
            SnapshotEvent::VmSkipped { name, reason } => {
                warn!(vm = %name, %reason, "VM skipped during snapshot walk");
                self.status(&format!(
                    "  {} no snapshot data for {name}: {reason}",
                    style("warn:").yellow()
                ));
            }
            SnapshotEvent::Flattened { vms, snapshots } => {
                self.status(&format!("Walked snapshot trees of {vms} VM(s): {snapshots} snapshot(s)"));
            }
        }
    }

    fn handle_fallback(&self, event: FallbackEvent) {
        match event {
            FallbackEvent::Engaged { phase, reason } => {
                warn!(%phase, %reason, "fallback strategy engaged");
                self.status(&format!(
                    "  {} {phase}: falling back to traversal ({reason})",
                    style("warn:").yellow()
                ));
            }
            FallbackEvent::Completed { phase, items } => {
                debug!(%phase, items, "fallback completed");
            }
        }
    }
}
