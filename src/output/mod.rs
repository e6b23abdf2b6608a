//! Output module for run reports and snapshot statistics
//!
//! This module handles:
//! - Printing the end-of-run report
//! - Summarising a persisted snapshot for `--stats`

mod report;
pub mod stats;

pub use report::print_run_report;
pub use stats::{load_statistics, print_statistics, SnapshotStatistics};
