use crate::state::CatalogRecord;
use crate::storage::{Snapshot, Storage, StorageResult};
use chrono::Utc;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Snapshot backend backed by a single pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot, distinguishing a missing file from a corrupt one
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Snapshot))` - The file exists and parsed
    /// * `Ok(None)` - No snapshot file yet
    /// * `Err(StorageError)` - The file exists but could not be read or parsed
    pub fn read(&self) -> StorageResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        Snapshot::from_json(&content).map(Some)
    }

    /// Writes the snapshot through a sibling temp file and a rename
    fn write(&self, snapshot: &Snapshot) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = snapshot.to_json()?;
        let tmp_path = self.tmp_path();

        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        // Data must be on disk before the rename makes it visible
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> Snapshot {
        match self.read() {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    "Loaded {} existing records from {}",
                    snapshot.total_items,
                    self.path.display()
                );
                snapshot
            }
            Ok(None) => {
                tracing::info!(
                    "No snapshot at {}, starting fresh",
                    self.path.display()
                );
                Snapshot::default()
            }
            Err(e) => {
                tracing::warn!(
                    "Snapshot {} is unreadable ({}), treating as empty",
                    self.path.display(),
                    e
                );
                Snapshot::default()
            }
        }
    }

    fn save(
        &mut self,
        new_records: &[CatalogRecord],
        new_bundle_ids: &[i64],
        prior: &Snapshot,
    ) -> StorageResult<Snapshot> {
        let snapshot = Snapshot::merge(new_records, new_bundle_ids, prior, Utc::now());
        self.write(&snapshot)?;

        tracing::info!(
            "Saved {} records ({} new) to {}",
            snapshot.total_items,
            new_records.len(),
            self.path.display()
        );

        Ok(snapshot)
    }
}
