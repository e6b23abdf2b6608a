//! Statistics over a persisted snapshot
//!
//! Backs the `--stats` mode: summarises the snapshot file without touching
//! the network.

use crate::storage::{format_timestamp, Snapshot};

/// Snapshot statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStatistics {
    /// Number of records in `data`
    pub total_items: usize,

    /// Formatted `lastUpdate`, if the snapshot has one
    pub last_update: Option<String>,

    /// Smallest and largest record id
    pub id_range: Option<(i64, i64)>,

    /// Records still carrying the `Emote_<id>` placeholder name
    pub placeholder_names: usize,

    /// Ids present more than once (should always be empty)
    pub duplicate_ids: Vec<i64>,

    /// Bundle ids tracked across runs
    pub tracked_bundles: usize,
}

/// Computes statistics for a snapshot
pub fn load_statistics(snapshot: &Snapshot) -> SnapshotStatistics {
    let id_range = snapshot
        .data
        .iter()
        .map(|r| r.id)
        .fold(None, |range, id| match range {
            None => Some((id, id)),
            Some((lo, hi)) => Some((lo.min(id), hi.max(id))),
        });

    SnapshotStatistics {
        total_items: snapshot.data.len(),
        last_update: snapshot.last_update.map(format_timestamp),
        id_range,
        placeholder_names: snapshot
            .data
            .iter()
            .filter(|r| r.has_placeholder_name())
            .count(),
        duplicate_ids: snapshot.duplicate_ids(),
        tracked_bundles: snapshot.bundle_ids.len(),
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &SnapshotStatistics) {
    println!("=== Snapshot Statistics ===\n");

    println!("Overview:");
    println!("  Total items: {}", stats.total_items);
    println!(
        "  Last update: {}",
        stats.last_update.as_deref().unwrap_or("never")
    );
    if let Some((lo, hi)) = stats.id_range {
        println!("  Id range: {} .. {}", lo, hi);
    }
    println!("  Placeholder names: {}", stats.placeholder_names);
    if stats.tracked_bundles > 0 {
        println!("  Tracked bundles: {}", stats.tracked_bundles);
    }
    println!();

    if stats.duplicate_ids.is_empty() {
        println!("Integrity: no duplicate ids");
    } else {
        println!("Integrity: {} duplicate ids", stats.duplicate_ids.len());
        for id in &stats.duplicate_ids {
            println!("  - {}", id);
        }
    }
}
