#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Disk inventory reconciliation and snapshot aging engine
//!
//! The engine builds an index of disk files referenced by the VM
//! inventory, scans datastores for disk-image files physically present,
//! reconciles the two through an ordered heuristic chain, and flattens
//! snapshot trees into an age-annotated list. It is strictly read-only:
//! nothing here mutates the virtualization environment.
//!
//! Failure discipline: per-object errors (one VM, one datastore, one
//! probe) degrade that object to "skipped" and the pass continues.
//! Only loss of the inventory session itself aborts a pass, and then
//! with a single structured error naming the failed phase.

mod audit;
mod classify;
mod index;
mod orchestrator;
mod scan;
mod snapshots;

pub use audit::run_audit;
pub use classify::{classify, ClassifyStats};
pub use index::{build_index, IndexStats, RegisteredDiskIndex, RegisteredOwner};
pub use orchestrator::{collect_with_fallback, CollectionOutcome};
pub use scan::{scan_datastores, ScanStats};
pub use snapshots::{collect_snapshots, flatten};
