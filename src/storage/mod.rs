//! Storage module for persisting the catalog snapshot
//!
//! This module handles:
//! - Reading the prior snapshot (current and legacy layouts)
//! - Merging a run's discoveries ahead of the prior records
//! - Replacing the snapshot file wholesale at the end of a run

mod json;
mod snapshot;
mod traits;

pub use json::JsonStorage;
pub use snapshot::{format_timestamp, merge_records, parse_timestamp, Snapshot};
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens the JSON snapshot store at `path`
pub fn open_storage(path: &Path) -> JsonStorage {
    JsonStorage::new(path)
}
