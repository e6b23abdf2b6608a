use crate::config::types::{
    Config, CrawlerConfig, EndpointEntry, OutputConfig, QueryConfig, ResolverConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_endpoints(&config.endpoints)?;
    validate_queries(&config.queries)?;
    validate_resolver_config(&config.resolver)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.catalog_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "catalog_path must start with '/', got '{}'",
            config.catalog_path
        )));
    }

    let positive = [
        ("max_pages_per_config", config.max_pages_per_config as u64),
        ("max_empty_pages", config.max_empty_pages as u64),
        ("probe_page_size", config.probe_page_size as u64),
        ("probe_timeout_secs", config.probe_timeout_secs),
        ("request_timeout_secs", config.request_timeout_secs),
    ];
    for (name, value) in positive {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.snapshot_path.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_endpoints(endpoints: &[EndpointEntry]) -> Result<(), ConfigError> {
    if endpoints.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[endpoint]] is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in endpoints {
        validate_base_url("endpoint base-url", &entry.base_url)?;

        // Fail-over tells candidates apart by base URL
        if !seen.insert(entry.base_url.trim_end_matches('/')) {
            return Err(ConfigError::Validation(format!(
                "duplicate endpoint '{}'",
                entry.base_url
            )));
        }
    }

    Ok(())
}

fn validate_queries(queries: &[QueryConfig]) -> Result<(), ConfigError> {
    if queries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[query]] is required".to_string(),
        ));
    }

    let mut labels = HashSet::new();
    for query in queries {
        if query.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "query label cannot be empty".to_string(),
            ));
        }

        if !labels.insert(query.label.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate query label '{}'",
                query.label
            )));
        }

        // The pager owns the cursor parameter
        if query.params.keys().any(|k| k.eq_ignore_ascii_case("cursor")) {
            return Err(ConfigError::Validation(format!(
                "query '{}' must not set a cursor parameter",
                query.label
            )));
        }
    }

    Ok(())
}

fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    validate_base_url("catalog-base-url", &config.catalog_base_url)?;
    validate_base_url("economy-base-url", &config.economy_base_url)?;
    validate_base_url("asset-delivery-base-url", &config.asset_delivery_base_url)?;
    Ok(())
}

/// Validates an absolute http(s) base URL
fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}
