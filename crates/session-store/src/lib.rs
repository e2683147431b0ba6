//! Persistent session snapshots.
//!
//! Snapshots live as JSON files under `<root>/<kind>/<id>.json`. Each kind
//! keeps a bounded number of entries; inserting past the limit evicts the
//! oldest first.

pub mod repository;
pub mod store;

pub use repository::SnapshotRepository;
pub use store::{RetentionLimits, SnapshotKind, SnapshotStore, SnapshotSummary, StoredSnapshot};
