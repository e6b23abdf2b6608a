//! Ephemeral per-run state
//!
//! `RunState` owns everything that changes while a crawl is in progress: the
//! seen-sets used for deduplication, the records discovered so far, and the
//! run counters. It is owned by the coordinator and never persisted directly.

use crate::state::CatalogRecord;
use crate::storage::Snapshot;
use std::collections::{BTreeMap, HashSet};

/// Counters describing a single crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pages fetched successfully
    pub pages_scanned: u64,

    /// Page requests sent, including rate-limited retries
    pub api_calls: u64,

    /// Failed requests (transient errors and unavailable endpoints)
    pub errors: u64,

    /// Query configurations whose scan was started
    pub configs_scanned: u64,

    /// Records accepted as novel
    pub new_items: u64,

    /// Liveness probes sent
    pub probes: u64,

    /// 429 responses seen
    pub rate_limited: u64,

    /// Successful pages keyed by endpoint base URL
    pub pages_by_endpoint: BTreeMap<String, u64>,
}

impl RunStats {
    /// Records a successfully fetched page for an endpoint
    pub fn record_page(&mut self, base_url: &str) {
        self.pages_scanned += 1;
        *self
            .pages_by_endpoint
            .entry(base_url.to_string())
            .or_insert(0) += 1;
    }

    /// Successful pages attributed to an endpoint
    pub fn pages_for(&self, base_url: &str) -> u64 {
        self.pages_by_endpoint.get(base_url).copied().unwrap_or(0)
    }
}

/// Mutable state of one crawl run
#[derive(Debug, Default)]
pub struct RunState {
    /// Ids loaded from the prior snapshot; grows as novel items are confirmed
    pub existing_ids: HashSet<i64>,

    /// Ids emitted as new during this run
    pub fetched_this_run: HashSet<i64>,

    /// Bundle ids scanned in this or previous runs
    pub seen_bundles: HashSet<i64>,

    /// Novel records in discovery order
    pub new_records: Vec<CatalogRecord>,

    pub stats: RunStats,
}

impl RunState {
    /// Seeds the seen-sets from a previously persisted snapshot
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            existing_ids: snapshot.data.iter().map(|r| r.id).collect(),
            seen_bundles: snapshot.bundle_ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Whether an id was persisted before or already emitted this run
    pub fn is_known(&self, id: i64) -> bool {
        self.existing_ids.contains(&id) || self.fetched_this_run.contains(&id)
    }

    /// Marks an id as seen for the remainder of the run
    ///
    /// Returns `false` if the id was already known.
    pub fn mark_seen(&mut self, id: i64) -> bool {
        if self.is_known(id) {
            return false;
        }
        self.fetched_this_run.insert(id)
    }

    /// Appends a confirmed novel record
    pub fn push_record(&mut self, record: CatalogRecord) {
        self.existing_ids.insert(record.id);
        self.stats.new_items += 1;
        self.new_records.push(record);
    }
}
