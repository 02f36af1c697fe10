#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the vsaudit storage auditor
//!
//! This crate provides the data model shared across the system: disk
//! references and discovered files, classification records, snapshot
//! trees and their flattened projection, datastore path normalization,
//! and the report types handed to downstream consumers.

pub mod cancel;
pub mod disk;
pub mod dspath;
pub mod report;
pub mod snapshot;

pub use cancel::CancellationFlag;
pub use disk::{
    Classification, ClassificationRecord, Confidence, DiscoveredFile, DiskReference, OrphanReason,
};
pub use report::{AuditReport, CollectionStrategy, Coverage};
pub use snapshot::{FlattenedSnapshot, SnapshotNode};
