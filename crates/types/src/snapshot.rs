//! Snapshot tree types and the flattened, age-annotated projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One node in a VM's snapshot tree.
///
/// The source API guarantees a rooted forest: each parent exclusively
/// owns its children and there are no back-references or cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub vm_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Creation time; absent when the API returned no timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Power state captured with the snapshot (`poweredOn`, ...)
    #[serde(default)]
    pub state: String,
    /// Opaque snapshot identifier from the management API
    pub id: String,
    #[serde(default)]
    pub quiesced: bool,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    /// Total number of nodes in this subtree, including self
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SnapshotNode::subtree_len).sum::<usize>()
    }
}

/// Sentinel age for snapshots whose creation time is unknown
pub const UNKNOWN_AGE_DAYS: i64 = -1;

/// A snapshot node projected with derived age fields.
///
/// Recomputed on every run against wall-clock "now"; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedSnapshot {
    pub vm_name: String,
    pub name: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub state: String,
    pub id: String,
    pub quiesced: bool,
    /// Whole days since creation, or [`UNKNOWN_AGE_DAYS`]
    pub age_days: i64,
    /// Remainder hours past the whole days
    pub age_hours: i64,
}

impl FlattenedSnapshot {
    /// Project a node with ages computed relative to `now`.
    ///
    /// A missing creation time yields the [`UNKNOWN_AGE_DAYS`] sentinel
    /// rather than dropping the node.
    #[must_use]
    pub fn project(node: &SnapshotNode, now: DateTime<Utc>) -> Self {
        let (age_days, age_hours) = match node.created_at {
            Some(created) => {
                let elapsed = now.signed_duration_since(created);
                let days = elapsed.num_days();
                let hours = elapsed.num_hours() - days * 24;
                (days, hours)
            }
            None => (UNKNOWN_AGE_DAYS, 0),
        };
        Self {
            vm_name: node.vm_name.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            created_at: node.created_at,
            state: node.state.clone(),
            id: node.id.clone(),
            quiesced: node.quiesced,
            age_days,
            age_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn node(created_at: Option<DateTime<Utc>>) -> SnapshotNode {
        SnapshotNode {
            vm_name: "vm01".into(),
            name: "pre-upgrade".into(),
            description: String::new(),
            created_at,
            state: "poweredOff".into(),
            id: "snapshot-101".into(),
            quiesced: false,
            children: Vec::new(),
        }
    }

    #[test]
    fn age_splits_days_and_remainder_hours() {
        let now = Utc::now();
        let created = now - Duration::days(10) - Duration::hours(3);
        let flat = FlattenedSnapshot::project(&node(Some(created)), now);
        assert_eq!(flat.age_days, 10);
        assert_eq!(flat.age_hours, 3);
    }

    #[test]
    fn missing_creation_time_uses_sentinel() {
        let flat = FlattenedSnapshot::project(&node(None), Utc::now());
        assert_eq!(flat.age_days, UNKNOWN_AGE_DAYS);
        assert_eq!(flat.age_hours, 0);
    }

    #[test]
    fn subtree_len_counts_all_nodes() {
        let mut root = node(None);
        let mut child = node(None);
        child.children.push(node(None));
        root.children.push(child);
        root.children.push(node(None));
        assert_eq!(root.subtree_len(), 4);
    }
}
