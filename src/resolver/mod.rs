//! Best-effort per-item lookups
//!
//! Neither lookup keeps state or retries: each method gets one attempt, and
//! every failure falls through to the next method or to the input id.
//!
//! - Bundle → asset: bundle details list the contained items; the first of
//!   type `"Asset"` is taken.
//! - Asset → animation: the asset-delivery service is asked through each
//!   [`AnimationStrategy`] in turn; the asset id itself is the fallback.
//! - Asset → name: the economy details `Name` field.

mod strategy;

pub use strategy::{extract_embedded_id, AnimationStrategy, ANIMATION_STRATEGIES};

use crate::config::{ResolverConfig, UserAgentConfig};
use crate::crawler::normalize_name;
use reqwest::{redirect::Policy, Client};
use serde_json::Value;
use std::time::Duration;

/// Stateless resolver over the catalog, economy and asset-delivery services
#[derive(Debug, Clone)]
pub struct Resolver {
    client: Client,
    no_redirect: Client,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(
        config: &ResolverConfig,
        user_agent: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .build()?;

        let no_redirect = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect,
            config: config.clone(),
        })
    }

    /// Resolves a bundle to the animation id it ships
    ///
    /// Falls back to the bundle id when the bundle lists no asset.
    pub async fn resolve_bundle(&self, bundle_id: i64) -> i64 {
        match self.bundle_asset(bundle_id).await {
            Some(asset_id) => self.resolve_animation_id(asset_id).await,
            None => {
                tracing::debug!("Bundle {} lists no asset, keeping bundle id", bundle_id);
                bundle_id
            }
        }
    }

    /// Returns the id of the first item of type `"Asset"` in a bundle
    pub async fn bundle_asset(&self, bundle_id: i64) -> Option<i64> {
        let url = format!(
            "{}/v1/bundles/{}/details",
            self.config.catalog_base_url.trim_end_matches('/'),
            bundle_id
        );
        let details = self.get_json(&url).await?;

        details
            .get("items")?
            .as_array()?
            .iter()
            .find(|item| item.get("type").and_then(Value::as_str) == Some("Asset"))
            .and_then(|item| item.get("id"))
            .and_then(Value::as_i64)
            .filter(|id| *id > 0)
    }

    /// Runs every strategy in order and returns the first hit, else `asset_id`
    pub async fn resolve_animation_id(&self, asset_id: i64) -> i64 {
        for strategy in ANIMATION_STRATEGIES {
            if let Some(animation_id) = self.try_strategy(*strategy, asset_id).await {
                tracing::debug!(
                    "Asset {} resolved to animation {} via {:?}",
                    asset_id,
                    animation_id,
                    strategy
                );
                return animation_id;
            }
        }

        asset_id
    }

    /// Looks up an asset's display name
    pub async fn lookup_name(&self, asset_id: i64) -> Option<String> {
        let url = format!(
            "{}/v2/assets/{}/details",
            self.config.economy_base_url.trim_end_matches('/'),
            asset_id
        );
        let details = self.get_json(&url).await?;

        let name = normalize_name(details.get("Name")?.as_str()?);
        (!name.is_empty()).then_some(name)
    }

    async fn try_strategy(&self, strategy: AnimationStrategy, asset_id: i64) -> Option<i64> {
        let url = format!(
            "{}/v1/asset/?id={}",
            self.config.asset_delivery_base_url.trim_end_matches('/'),
            asset_id
        );

        match strategy {
            AnimationStrategy::RedirectLocation => {
                let response = self.no_redirect.get(&url).send().await.ok()?;
                if !response.status().is_redirection() {
                    return None;
                }
                let location = response.headers().get("location")?.to_str().ok()?;
                extract_embedded_id(location, asset_id)
            }
            AnimationStrategy::XmlPayload => {
                let response = self.client.get(&url).send().await.ok()?;
                if !response.status().is_success() {
                    return None;
                }
                let body = response.text().await.ok()?;
                extract_embedded_id(&body, asset_id)
            }
        }
    }

    async fn get_json(&self, url: &str) -> Option<Value> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Lookup {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Lookup {} returned HTTP {}", url, response.status().as_u16());
            return None;
        }

        let body = response.text().await.ok()?;
        serde_json::from_str(&body).ok()
    }
}
