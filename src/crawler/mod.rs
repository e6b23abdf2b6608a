//! Crawler module for catalog discovery
//!
//! This module contains the core crawling logic, including:
//! - Endpoint liveness probing and failover
//! - Page fetching with rate-limit retry
//! - Item normalization and deduplication
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod normalizer;
mod prober;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, ScanEnd};
pub use fetcher::{
    build_http_client, catalog_url, fetch_page, parse_page, FetchError, Page, PageRequest,
    ITEM_LIST_KEY,
};
pub use normalizer::{extract_id, extract_name, is_bundle, normalize_name, process_item};
pub use prober::{candidates_from_config, probe, probe_endpoint, EndpointCandidate, ProbeSettings};

use crate::config::Config;
use crate::SniperError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the prior snapshot
/// 2. Select a live endpoint
/// 3. Scan every query configuration
/// 4. Persist the merged snapshot
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed and the snapshot was written
/// * `Err(SniperError)` - No endpoint was live, or the snapshot could not be written
pub async fn crawl(config: Config) -> Result<CrawlReport, SniperError> {
    run_crawl(config).await
}
