use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Emote Sniper
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(rename = "endpoint", default = "default_endpoints")]
    pub endpoints: Vec<EndpointEntry>,
    #[serde(rename = "query", default = "default_queries")]
    pub queries: Vec<QueryConfig>,
}

/// Crawler pacing and pagination limits
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Sub-path of the search endpoint, appended to every base URL
    #[serde(rename = "catalog-path", default = "default_catalog_path")]
    pub catalog_path: String,

    /// Hard cap on page fetches per query configuration
    #[serde(rename = "max-pages-per-config", default = "default_max_pages")]
    pub max_pages_per_config: u32,

    /// Consecutive empty pages that end a configuration's scan
    #[serde(rename = "max-empty-pages", default = "default_max_empty_pages")]
    pub max_empty_pages: u32,

    /// Delay between page fetches within one configuration (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Delay between configurations (milliseconds)
    #[serde(rename = "config-delay-ms", default = "default_config_delay_ms")]
    pub config_delay_ms: u64,

    /// Sleep before retrying a rate-limited request (milliseconds)
    #[serde(rename = "rate-limit-delay-ms", default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Timeout for a liveness probe (seconds)
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Timeout for a page fetch (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Page size used by liveness probes
    #[serde(rename = "probe-page-size", default = "default_probe_page_size")]
    pub probe_page_size: u32,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn config_delay(&self) -> Duration {
        Duration::from_millis(self.config_delay_ms)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            max_pages_per_config: default_max_pages(),
            max_empty_pages: default_max_empty_pages(),
            page_delay_ms: default_page_delay_ms(),
            config_delay_ms: default_config_delay_ms(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            probe_timeout_secs: default_probe_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_page_size: default_probe_page_size(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "EmoteSniper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON snapshot file
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "EmoteSniper.json".to_string(),
        }
    }
}

/// Optional per-item lookups against neighbouring services
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Replace bundle ids with the animation id they contain
    #[serde(rename = "resolve-bundles", default)]
    pub resolve_bundles: bool,

    /// Ask the economy service for a name when the catalog omits one
    #[serde(rename = "lookup-names", default)]
    pub lookup_names: bool,

    /// Persist scanned bundle ids so later runs skip them
    #[serde(rename = "track-bundle-ids", default)]
    pub track_bundle_ids: bool,

    #[serde(rename = "catalog-base-url", default = "default_catalog_base_url")]
    pub catalog_base_url: String,

    #[serde(rename = "economy-base-url", default = "default_economy_base_url")]
    pub economy_base_url: String,

    #[serde(
        rename = "asset-delivery-base-url",
        default = "default_asset_delivery_base_url"
    )]
    pub asset_delivery_base_url: String,
}

impl ResolverConfig {
    /// Whether any lookup needs a resolver at all
    pub fn is_active(&self) -> bool {
        self.resolve_bundles || self.lookup_names
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolve_bundles: false,
            lookup_names: false,
            track_bundle_ids: false,
            catalog_base_url: default_catalog_base_url(),
            economy_base_url: default_economy_base_url(),
            asset_delivery_base_url: default_asset_delivery_base_url(),
        }
    }
}

/// One candidate base URL for the catalog service
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointEntry {
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// A named filter/sort view of the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Human-readable label used in logs and reports
    pub label: String,

    /// Static query string parameters sent with every page of this view
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl QueryConfig {
    pub fn new(label: &str, params: &[(&str, &str)]) -> Self {
        Self {
            label: label.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            resolver: ResolverConfig::default(),
            endpoints: default_endpoints(),
            queries: default_queries(),
        }
    }
}

fn default_endpoints() -> Vec<EndpointEntry> {
    ["https://catalog.roblox.com", "https://catalog.roproxy.com"]
        .iter()
        .map(|url| EndpointEntry {
            base_url: url.to_string(),
        })
        .collect()
}

/// Emote views of the catalog: one per sort order plus two price bands
fn default_queries() -> Vec<QueryConfig> {
    let base = [
        ("category", "12"),
        ("subcategory", "39"),
        ("limit", "120"),
        ("salesTypeFilter", "1"),
    ];
    let with = |extra: &[(&'static str, &'static str)]| {
        base.iter().chain(extra.iter()).copied().collect::<Vec<_>>()
    };

    vec![
        QueryConfig::new("recently-updated", &with(&[("sortType", "3")])),
        QueryConfig::new("bestselling", &with(&[("sortType", "2")])),
        QueryConfig::new("most-favorited", &with(&[("sortType", "1")])),
        QueryConfig::new(
            "price-low",
            &with(&[("sortType", "4"), ("minPrice", "0"), ("maxPrice", "100")]),
        ),
        QueryConfig::new(
            "price-high",
            &with(&[("sortType", "5"), ("minPrice", "101")]),
        ),
    ]
}

fn default_catalog_path() -> String {
    "/v1/search/items".to_string()
}

fn default_max_pages() -> u32 {
    100
}

fn default_max_empty_pages() -> u32 {
    3
}

fn default_page_delay_ms() -> u64 {
    300
}

fn default_config_delay_ms() -> u64 {
    1000
}

fn default_rate_limit_delay_ms() -> u64 {
    5000
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_page_size() -> u32 {
    10
}

fn default_catalog_base_url() -> String {
    "https://catalog.roblox.com".to_string()
}

fn default_economy_base_url() -> String {
    "https://economy.roblox.com".to_string()
}

fn default_asset_delivery_base_url() -> String {
    "https://assetdelivery.roblox.com".to_string()
}
