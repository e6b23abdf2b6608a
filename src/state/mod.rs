//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CatalogRecord`: a persisted catalog entry (id and normalized name)
//! - `RunState`: seen-sets, discovered records and counters for one run
//! - `RunStats`: the counters reported at the end of a run

mod record;
mod run_state;

// Re-export main types
pub use record::CatalogRecord;
pub use run_state::{RunState, RunStats};
