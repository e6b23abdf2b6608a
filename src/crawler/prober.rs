//! Endpoint liveness probing
//!
//! The crawler commits to the first candidate that answers a minimal catalog
//! query with a parseable item list, and re-probes the others only when the
//! committed endpoint reports itself unavailable.

use crate::config::EndpointEntry;
use crate::crawler::fetcher::{catalog_url, ITEM_LIST_KEY};
use crate::state::RunStats;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A base URL the catalog may be reached through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub base_url: String,

    /// Position in the configured list (0 is tried first)
    pub priority: usize,
}

/// Builds the ordered candidate list from configuration
pub fn candidates_from_config(entries: &[EndpointEntry]) -> Vec<EndpointCandidate> {
    entries
        .iter()
        .enumerate()
        .map(|(priority, entry)| EndpointCandidate {
            base_url: entry.base_url.clone(),
            priority,
        })
        .collect()
}

/// Parameters of the minimal probe request
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub catalog_path: String,

    /// Static query parameters; `limit` is overridden with `page_size`
    pub params: BTreeMap<String, String>,

    pub page_size: u32,
    pub timeout: Duration,
}

/// Returns the first live candidate in priority order
///
/// Candidates are tried sequentially; `None` means nothing answered.
pub async fn probe(
    client: &Client,
    candidates: &[EndpointCandidate],
    settings: &ProbeSettings,
    stats: &mut RunStats,
) -> Option<EndpointCandidate> {
    let mut ordered: Vec<&EndpointCandidate> = candidates.iter().collect();
    ordered.sort_by_key(|c| c.priority);

    for candidate in ordered {
        stats.probes += 1;
        if probe_endpoint(client, candidate, settings).await {
            tracing::info!("Endpoint {} is live", candidate.base_url);
            return Some(candidate.clone());
        }
    }

    None
}

/// Checks a single candidate
///
/// Live means a success status and a JSON object body holding the item list.
pub async fn probe_endpoint(
    client: &Client,
    candidate: &EndpointCandidate,
    settings: &ProbeSettings,
) -> bool {
    let url = catalog_url(&candidate.base_url, &settings.catalog_path);
    let mut params = settings.params.clone();
    params.insert("limit".to_string(), settings.page_size.to_string());

    let response = match client
        .get(&url)
        .query(&params)
        .timeout(settings.timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Probe of {} failed: {}", candidate.base_url, e);
            return false;
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Probe of {} returned HTTP {}", candidate.base_url, status.as_u16());
        return false;
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Probe of {} lost its body: {}", candidate.base_url, e);
            return false;
        }
    };

    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) if map.contains_key(ITEM_LIST_KEY) => true,
        _ => {
            tracing::warn!(
                "Probe of {} did not return a catalog page",
                candidate.base_url
            );
            false
        }
    }
}
