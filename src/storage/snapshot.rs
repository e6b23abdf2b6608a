//! Snapshot file format
//!
//! Current layout:
//!
//! ```json
//! {
//!   "keyword": null,
//!   "totalItems": 2,
//!   "lastUpdate": "2024-01-01T00:00:00.000Z",
//!   "data": [ { "id": 1, "name": "Wave" }, { "id": 2, "name": "Dance" } ]
//! }
//! ```
//!
//! Older files carry `lastUpdated` and `totalEmotes` instead; both layouts
//! are recognised by the presence of `data`. The counts are never trusted on
//! read and are recomputed from `data`.

use crate::state::CatalogRecord;
use crate::storage::StorageError;
use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// The full persisted record set plus metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub total_items: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub data: Vec<CatalogRecord>,

    /// Bundle ids scanned by earlier runs (only written when tracking is on)
    pub bundle_ids: Vec<i64>,
}

#[derive(Deserialize)]
struct SnapshotFileIn {
    data: Vec<CatalogRecord>,

    #[serde(rename = "lastUpdate", alias = "lastUpdated", default)]
    last_update: Option<String>,

    #[serde(rename = "bundleIds", default)]
    bundle_ids: Vec<i64>,
}

#[derive(Serialize)]
struct SnapshotFileOut<'a> {
    keyword: Option<&'a str>,

    #[serde(rename = "totalItems")]
    total_items: usize,

    #[serde(rename = "lastUpdate")]
    last_update: Option<String>,

    data: &'a [CatalogRecord],

    #[serde(rename = "bundleIds", skip_serializing_if = "<[i64]>::is_empty")]
    bundle_ids: &'a [i64],
}

impl Snapshot {
    /// Parses snapshot JSON in either the current or the legacy layout
    pub fn from_json(content: &str) -> Result<Self, StorageError> {
        let file: SnapshotFileIn = serde_json::from_str(content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            total_items: file.data.len(),
            last_update: file.last_update.as_deref().and_then(parse_timestamp),
            data: file.data,
            bundle_ids: file.bundle_ids,
        })
    }

    /// Serializes the snapshot in the current layout, pretty-printed
    pub fn to_json(&self) -> Result<String, StorageError> {
        let out = SnapshotFileOut {
            keyword: None,
            total_items: self.total_items,
            last_update: self.last_update.map(format_timestamp),
            data: &self.data,
            bundle_ids: &self.bundle_ids,
        };

        serde_json::to_string_pretty(&out).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Builds the next snapshot from this run's discoveries and the prior one
    ///
    /// New records come first, in discovery order, followed by the prior
    /// block in its existing order. Duplicate ids keep their first
    /// occurrence. `last_update` is stamped with `now` at millisecond
    /// precision.
    pub fn merge(
        new_records: &[CatalogRecord],
        new_bundle_ids: &[i64],
        prior: &Snapshot,
        now: DateTime<Utc>,
    ) -> Snapshot {
        let data = merge_records(new_records, &prior.data);
        let bundle_ids: BTreeSet<i64> = prior
            .bundle_ids
            .iter()
            .chain(new_bundle_ids.iter())
            .copied()
            .collect();

        Snapshot {
            total_items: data.len(),
            last_update: Some(now.trunc_subsecs(3)),
            data,
            bundle_ids: bundle_ids.into_iter().collect(),
        }
    }

    /// Ids that appear more than once in `data`
    pub fn duplicate_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut duplicates = BTreeSet::new();
        for record in &self.data {
            if !seen.insert(record.id) {
                duplicates.insert(record.id);
            }
        }
        duplicates.into_iter().collect()
    }
}

/// Concatenates `new ++ prior` and drops later duplicates by id
pub fn merge_records(new: &[CatalogRecord], prior: &[CatalogRecord]) -> Vec<CatalogRecord> {
    let mut seen = HashSet::with_capacity(new.len() + prior.len());
    new.iter()
        .chain(prior.iter())
        .filter(|record| seen.insert(record.id))
        .cloned()
        .collect()
}

/// Formats a UTC instant as `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses RFC 3339 stamps, or offset-less ISO stamps read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
