//! Catalog page fetcher
//!
//! This module issues one paginated catalog request and applies the retry
//! policy:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Parse the page and return it |
//! | HTTP 429 | Sleep the rate-limit delay, resend the same request |
//! | HTTP 503 | Return `FetchError::Unavailable` so the caller can fail over |
//! | Other status, timeout, connection error | Count an error, return `FetchError::Transient` |
//!
//! The 429 loop has no attempt limit.

use crate::config::UserAgentConfig;
use crate::crawler::prober::EndpointCandidate;
use crate::state::RunStats;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Key of the item array in a catalog page
pub const ITEM_LIST_KEY: &str = "data";

/// Keys that may carry the continuation cursor, in lookup order
const CURSOR_KEYS: &[&str] = &["nextPageCursor", "nextCursor"];

/// One page of catalog results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw catalog items, in upstream order
    pub items: Vec<Value>,

    /// Opaque token for the following page; `None` ends the results
    pub next_cursor: Option<String>,
}

/// Why a page could not be fetched
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("endpoint unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("{0}")]
    Transient(String),
}

/// Everything needed to request one page
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub endpoint: &'a EndpointCandidate,
    pub catalog_path: &'a str,
    pub params: &'a BTreeMap<String, String>,

    /// Cursor echoed verbatim from the previous page
    pub cursor: Option<&'a str>,
}

/// Builds the HTTP client shared by probes and page fetches
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout; probes override it per request
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Joins a base URL and the catalog sub-path
pub fn catalog_url(base_url: &str, catalog_path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), catalog_path)
}

/// Fetches one page, retrying in place while the upstream answers 429
pub async fn fetch_page(
    client: &Client,
    request: &PageRequest<'_>,
    rate_limit_delay: Duration,
    stats: &mut RunStats,
) -> Result<Page, FetchError> {
    let url = catalog_url(&request.endpoint.base_url, request.catalog_path);

    let mut query: Vec<(&str, &str)> = request
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if let Some(cursor) = request.cursor {
        query.push(("cursor", cursor));
    }

    loop {
        stats.api_calls += 1;

        let response = match client.get(&url).query(&query).send().await {
            Ok(response) => response,
            Err(e) => {
                stats.errors += 1;
                return Err(FetchError::Transient(classify_request_error(&e)));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            stats.rate_limited += 1;
            tracing::warn!(
                "Rate limited by {}, retrying in {:?}",
                request.endpoint.base_url,
                rate_limit_delay
            );
            tokio::time::sleep(rate_limit_delay).await;
            continue;
        }

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(FetchError::Unavailable {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            stats.errors += 1;
            return Err(FetchError::Transient(format!("HTTP {}", status.as_u16())));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                stats.errors += 1;
                return Err(FetchError::Transient(classify_request_error(&e)));
            }
        };

        return parse_page(&body).map_err(|e| {
            stats.errors += 1;
            e
        });
    }
}

/// Parses a catalog response body
///
/// The body must be an object with an item array; the cursor is optional and
/// an empty string counts as absent.
pub fn parse_page(body: &str) -> Result<Page, FetchError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Transient(format!("invalid JSON: {}", e)))?;

    let items = match value.get(ITEM_LIST_KEY) {
        Some(Value::Array(items)) => items.clone(),
        _ => {
            return Err(FetchError::Transient(format!(
                "response has no '{}' array",
                ITEM_LIST_KEY
            )))
        }
    };

    let next_cursor = CURSOR_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|cursor| !cursor.is_empty())
        .map(str::to_string);

    Ok(Page { items, next_cursor })
}

fn classify_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    }
}
