//! Crawler coordinator - main crawl orchestration logic
//!
//! One run goes through these steps:
//! - Load the prior snapshot and seed the run state from it
//! - Probe the endpoint list and commit to the first live endpoint
//! - Scan every query configuration page by page, following cursors
//! - Merge the discoveries ahead of the prior records and persist once
//!
//! Everything is awaited sequentially; there is a single writer for the run
//! state and for the snapshot.

use crate::config::{Config, QueryConfig};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchError, PageRequest};
use crate::crawler::normalizer::{extract_id, is_bundle, process_item};
use crate::crawler::prober::{candidates_from_config, probe, EndpointCandidate, ProbeSettings};
use crate::resolver::Resolver;
use crate::state::{CatalogRecord, RunState, RunStats};
use crate::storage::{JsonStorage, Snapshot, Storage};
use crate::SniperError;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;

/// Why a configuration's page loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// Upstream returned no next cursor
    CursorExhausted,

    /// Too many consecutive pages without items
    EmptyPages,

    /// `max-pages-per-config` fetches were made
    PageLimit,

    /// A page fetch failed with a non-retryable error
    Failed,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Records discovered this run, in discovery order
    pub new_records: Vec<CatalogRecord>,

    pub stats: RunStats,

    /// Snapshot as written at the end of the run
    pub snapshot: Snapshot,

    /// Record count of the snapshot loaded at the start of the run
    pub prior_total: usize,

    /// Endpoint in use when the run finished
    pub endpoint: String,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    storage: JsonStorage,
    resolver: Option<Resolver>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SniperError)` - An HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, SniperError> {
        let storage = JsonStorage::new(Path::new(&config.output.snapshot_path));
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        let resolver = if config.resolver.is_active() {
            Some(Resolver::new(
                &config.resolver,
                &config.user_agent,
                config.crawler.request_timeout(),
            )?)
        } else {
            None
        };

        Ok(Self {
            config,
            client,
            storage,
            resolver,
        })
    }

    /// Runs one full crawl and persists the merged snapshot
    ///
    /// Fails only when no endpoint is live; in that case nothing is written.
    pub async fn run(&mut self) -> Result<CrawlReport, SniperError> {
        let prior = self.storage.load();
        let mut state = RunState::from_snapshot(&prior);

        let candidates = candidates_from_config(&self.config.endpoints);
        let probe_settings = self.probe_settings();

        let mut endpoint =
            match probe(&self.client, &candidates, &probe_settings, &mut state.stats).await {
                Some(endpoint) => endpoint,
                None => {
                    tracing::error!("No live endpoint among {} candidates", candidates.len());
                    return Err(SniperError::NoLiveEndpoint {
                        tried: candidates.len(),
                    });
                }
            };
        tracing::info!("Using endpoint {}", endpoint.base_url);

        for (index, query) in self.config.queries.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.crawler.config_delay()).await;
            }

            tracing::info!("Scanning configuration '{}'", query.label);
            let found_before = state.new_records.len();
            let end = self
                .scan_config(query, &candidates, &probe_settings, &mut endpoint, &mut state)
                .await;

            tracing::info!(
                "Configuration '{}' finished ({:?}): {} new, {} errors so far",
                query.label,
                end,
                state.new_records.len() - found_before,
                state.stats.errors
            );
        }

        let bundle_ids: Vec<i64> = if self.config.resolver.track_bundle_ids {
            state.seen_bundles.iter().copied().collect()
        } else {
            Vec::new()
        };

        let snapshot = self.storage.save(&state.new_records, &bundle_ids, &prior)?;

        Ok(CrawlReport {
            new_records: state.new_records,
            stats: state.stats,
            snapshot,
            prior_total: prior.total_items,
            endpoint: endpoint.base_url,
        })
    }

    /// Walks one configuration's pages until a stop condition triggers
    async fn scan_config(
        &self,
        query: &QueryConfig,
        candidates: &[EndpointCandidate],
        probe_settings: &ProbeSettings,
        endpoint: &mut EndpointCandidate,
        state: &mut RunState,
    ) -> ScanEnd {
        let crawler = &self.config.crawler;
        state.stats.configs_scanned += 1;

        let mut cursor: Option<String> = None;
        let mut empty_pages = 0;

        for page_index in 0..crawler.max_pages_per_config {
            if page_index > 0 {
                tokio::time::sleep(crawler.page_delay()).await;
            }

            let request = PageRequest {
                endpoint: &*endpoint,
                catalog_path: &crawler.catalog_path,
                params: &query.params,
                cursor: cursor.as_deref(),
            };

            match fetch_page(
                &self.client,
                &request,
                crawler.rate_limit_delay(),
                &mut state.stats,
            )
            .await
            {
                Ok(page) => {
                    state.stats.record_page(&endpoint.base_url);
                    tracing::debug!(
                        "'{}' page {}: {} items",
                        query.label,
                        page_index + 1,
                        page.items.len()
                    );

                    if page.items.is_empty() {
                        empty_pages += 1;
                        if empty_pages >= crawler.max_empty_pages {
                            return ScanEnd::EmptyPages;
                        }
                    } else {
                        empty_pages = 0;
                    }

                    for item in &page.items {
                        self.handle_item(item, state).await;
                    }

                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => return ScanEnd::CursorExhausted,
                    }
                }
                Err(FetchError::Unavailable { status }) => {
                    state.stats.errors += 1;
                    tracing::warn!(
                        "Endpoint {} unavailable (HTTP {}), looking for another",
                        endpoint.base_url,
                        status
                    );
                    self.fail_over(candidates, probe_settings, endpoint, state)
                        .await;
                }
                Err(FetchError::Transient(reason)) => {
                    tracing::warn!(
                        "Page fetch for '{}' failed: {} ({} errors so far)",
                        query.label,
                        reason,
                        state.stats.errors
                    );
                    return ScanEnd::Failed;
                }
            }
        }

        ScanEnd::PageLimit
    }

    /// Re-probes every candidate but the current one
    ///
    /// Keeps the current endpoint when nothing else is live.
    async fn fail_over(
        &self,
        candidates: &[EndpointCandidate],
        probe_settings: &ProbeSettings,
        endpoint: &mut EndpointCandidate,
        state: &mut RunState,
    ) {
        let remaining: Vec<EndpointCandidate> = candidates
            .iter()
            .filter(|c| c.base_url != endpoint.base_url)
            .cloned()
            .collect();

        match probe(&self.client, &remaining, probe_settings, &mut state.stats).await {
            Some(next) => {
                tracing::info!(
                    "Switching endpoint {} -> {}",
                    endpoint.base_url,
                    next.base_url
                );
                *endpoint = next;
            }
            None => {
                tracing::warn!(
                    "No alternative endpoint, continuing with {}",
                    endpoint.base_url
                );
            }
        }
    }

    /// Deduplicates one raw item and, if novel, enriches and records it
    async fn handle_item(&self, raw: &Value, state: &mut RunState) {
        let resolver_config = &self.config.resolver;
        let bundle = is_bundle(raw);

        if bundle && resolver_config.track_bundle_ids {
            if let Some(bundle_id) = extract_id(raw) {
                if !state.seen_bundles.insert(bundle_id) {
                    return;
                }
            }
        }

        let Some(mut record) = process_item(raw, state) else {
            return;
        };

        if let Some(resolver) = &self.resolver {
            if bundle && resolver_config.resolve_bundles {
                let animation_id = resolver.resolve_bundle(record.id).await;
                if animation_id != record.id {
                    if !state.mark_seen(animation_id) {
                        tracing::debug!(
                            "Bundle {} resolves to known animation {}",
                            record.id,
                            animation_id
                        );
                        return;
                    }
                    record = CatalogRecord::new(animation_id, record.name);
                }
            }

            if resolver_config.lookup_names && record.has_placeholder_name() {
                if let Some(name) = resolver.lookup_name(record.id).await {
                    record = CatalogRecord::new(record.id, name);
                }
            }
        }

        tracing::info!("NEW EMOTE: {} (ID: {})", record.name, record.id);
        state.push_record(record);
    }

    fn probe_settings(&self) -> ProbeSettings {
        let crawler = &self.config.crawler;
        ProbeSettings {
            catalog_path: crawler.catalog_path.clone(),
            params: self
                .config
                .queries
                .first()
                .map(|q| q.params.clone())
                .unwrap_or_default(),
            page_size: crawler.probe_page_size,
            timeout: crawler.probe_timeout(),
        }
    }
}

/// Runs a complete crawl with the given configuration
pub async fn run_crawl(config: Config) -> Result<CrawlReport, SniperError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
