//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot backends and
//! associated error types.

use crate::state::CatalogRecord;
use crate::storage::Snapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for snapshot backends
///
/// A backend is read once at the start of a run and written once at the
/// end. There is no partial or append write.
pub trait Storage {
    /// Loads the prior snapshot
    ///
    /// Never fails: a missing or unreadable snapshot is reported as an empty
    /// one so the crawl can start fresh.
    fn load(&self) -> Snapshot;

    /// Merges this run's discoveries into the prior snapshot and persists it
    ///
    /// # Arguments
    ///
    /// * `new_records` - Novel records in discovery order
    /// * `new_bundle_ids` - Bundle ids scanned this run (empty unless tracked)
    /// * `prior` - The snapshot returned by `load` at the start of the run
    ///
    /// # Returns
    ///
    /// The snapshot that was written
    fn save(
        &mut self,
        new_records: &[CatalogRecord],
        new_bundle_ids: &[i64],
        prior: &Snapshot,
    ) -> StorageResult<Snapshot>;
}
