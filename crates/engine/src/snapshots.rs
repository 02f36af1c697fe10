//! Snapshot tree walker
//!
//! Flattens per-VM snapshot forests into one oldest-first list with
//! derived ages. Traversal uses an explicit work stack instead of
//! language recursion, so the depth of a pathological chain never
//! touches the call stack and the emit order is trivially testable.

use chrono::{DateTime, Utc};
use tracing::debug;
use vsaudit_config::Config;
use vsaudit_errors::{Error, InventoryError};
use vsaudit_events::{AppEvent, EventEmitter, EventSender, SnapshotEvent};
use vsaudit_providers::{VmInventory, VmSummary};
use vsaudit_types::{CancellationFlag, FlattenedSnapshot, SnapshotNode};

/// Flatten a snapshot forest in pre-order and sort it oldest first.
///
/// Every node is emitted exactly once; a node with no creation time is
/// kept with the sentinel age and sorts before dated nodes. Ties on
/// creation time break by VM name, then snapshot name.
#[must_use]
pub fn flatten(roots: &[SnapshotNode], now: DateTime<Utc>) -> Vec<FlattenedSnapshot> {
    let mut flat = Vec::new();
    // Pre-order via LIFO stack: push children in reverse so the
    // leftmost child pops first
    let mut stack: Vec<&SnapshotNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        flat.push(FlattenedSnapshot::project(node, now));
        stack.extend(node.children.iter().rev());
    }

    flat.sort_by(|a, b| {
        // Option orders None first, which is where undated nodes go
        (a.created_at, &a.vm_name, &a.name).cmp(&(b.created_at, &b.vm_name, &b.name))
    });
    flat
}

/// Collect and flatten the snapshot trees of every VM.
///
/// A VM whose snapshot tree is unavailable is skipped with an event;
/// only a fatal inventory error or cancellation aborts.
///
/// # Errors
///
/// Returns an error on loss of the inventory session or cancellation.
pub async fn collect_snapshots(
    inventory: &dyn VmInventory,
    vms: &[VmSummary],
    config: &Config,
    tx: &EventSender,
    cancel: &CancellationFlag,
) -> Result<(Vec<FlattenedSnapshot>, usize), Error> {
    let mut roots = Vec::new();
    let mut skipped = 0usize;
    let timeout = config.call_timeout();

    for vm in vms {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let result = tokio::time::timeout(timeout, inventory.snapshot_roots(&vm.name))
            .await
            .unwrap_or_else(|_| {
                Err(InventoryError::Timeout {
                    operation: format!("snapshot_roots({})", vm.name),
                    seconds: timeout.as_secs(),
                })
            });
        match result {
            Ok(vm_roots) => roots.extend(vm_roots),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                debug!(vm = %vm.name, error = %e, "skipping VM during snapshot walk");
                skipped += 1;
                tx.emit(AppEvent::Snapshot(SnapshotEvent::VmSkipped {
                    name: vm.name.clone(),
                    reason: e.to_string(),
                }));
            }
        }
    }

    let flat = flatten(&roots, Utc::now());
    tx.emit(AppEvent::Snapshot(SnapshotEvent::Flattened {
        vms: vms.len() - skipped,
        snapshots: flat.len(),
    }));
    Ok((flat, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn node(vm: &str, name: &str, age_days: i64, children: Vec<SnapshotNode>) -> SnapshotNode {
        SnapshotNode {
            vm_name: vm.to_string(),
            name: name.to_string(),
            description: String::new(),
            created_at: Some(Utc::now() - Duration::days(age_days)),
            state: "poweredOff".to_string(),
            id: format!("snapshot-{vm}-{name}"),
            quiesced: false,
            children,
        }
    }

    #[test]
    fn flatten_visits_every_node_once() {
        let forest = vec![
            node(
                "vm01",
                "root",
                30,
                vec![
                    node("vm01", "child-a", 20, vec![node("vm01", "leaf", 10, vec![])]),
                    node("vm01", "child-b", 15, vec![]),
                ],
            ),
            node("vm02", "only", 5, vec![]),
        ];
        let total: usize = forest.iter().map(SnapshotNode::subtree_len).sum();
        let flat = flatten(&forest, Utc::now());
        assert_eq!(flat.len(), total);
    }

    #[test]
    fn flatten_sorts_oldest_first() {
        let forest = vec![
            node("vm01", "newer", 1, vec![node("vm01", "oldest", 90, vec![])]),
            node("vm02", "middle", 30, vec![]),
        ];
        let flat = flatten(&forest, Utc::now());
        let names: Vec<&str> = flat.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["oldest", "middle", "newer"]);
    }

    #[test]
    fn ties_break_by_vm_then_snapshot_name() {
        let instant = Utc::now() - Duration::days(3);
        let mut a = node("vmB", "snap", 0, vec![]);
        let mut b = node("vmA", "zz", 0, vec![]);
        let mut c = node("vmA", "aa", 0, vec![]);
        a.created_at = Some(instant);
        b.created_at = Some(instant);
        c.created_at = Some(instant);

        let flat = flatten(&[a, b, c], Utc::now());
        let order: Vec<(&str, &str)> = flat
            .iter()
            .map(|s| (s.vm_name.as_str(), s.name.as_str()))
            .collect();
        assert_eq!(order, [("vmA", "aa"), ("vmA", "zz"), ("vmB", "snap")]);
    }

    #[test]
    fn undated_nodes_survive_with_sentinel() {
        let mut undated = node("vm01", "broken", 0, vec![]);
        undated.created_at = None;
        let flat = flatten(&[undated, node("vm01", "dated", 10, vec![])], Utc::now());
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].name, "broken");
        assert_eq!(flat[0].age_days, vsaudit_types::snapshot::UNKNOWN_AGE_DAYS);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        // Hardware limits real chains; the walker should still take a
        // degenerate 10k-deep chain in stride
        let mut chain = node("vm01", "leaf", 0, vec![]);
        for i in 1..10_000 {
            chain = node("vm01", &format!("level-{i}"), i % 100, vec![chain]);
        }
        let flat = flatten(&[chain], Utc::now());
        assert_eq!(flat.len(), 10_000);
    }
}
