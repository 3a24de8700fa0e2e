//! Rotating outbound proxy selection.
//!
//! Candidates come from explicit URLs and/or a plain-text proxy list fetched over HTTP.
//! Acquisition never fails hard: with no usable candidate the caller gets `None` and
//! goes out directly.

use crate::config::ProxyConfig;
use crate::error::{PubsyncError, Result};
use rand::seq::SliceRandom;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Proxy candidate source
pub struct ProxyPool {
    config: ProxyConfig,
    client: reqwest::Client,
}

impl ProxyPool {
    /// Pool over the configured candidates; nothing is fetched until [`ProxyPool::acquire`].
    pub fn new(config: ProxyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PubsyncError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Whether any proxy source is configured
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Pick a fresh proxy URL, or `None` to go direct.
    pub async fn acquire(&self) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }

        let mut candidates: Vec<String> = self.config.proxies.clone();
        if let Some(list_url) = &self.config.list_url {
            match self.fetch_list(list_url).await {
                Ok(listed) => {
                    debug!(count = listed.len(), url = %list_url, "Fetched proxy list");
                    candidates.extend(listed);
                }
                Err(e) => warn!(url = %list_url, error = %e, "Failed to fetch proxy list"),
            }
        }

        let valid: Vec<String> = candidates
            .into_iter()
            .filter(|c| match reqwest::Proxy::all(c.as_str()) {
                Ok(_) => true,
                Err(e) => {
                    debug!(proxy = %c, error = %e, "Discarding invalid proxy");
                    false
                }
            })
            .collect();

        match valid.choose(&mut rand::thread_rng()) {
            Some(proxy) => {
                info!(proxy = %proxy, "Using proxy");
                Some(proxy.clone())
            }
            None => {
                warn!("Could not get a proxy, falling back to direct requests");
                None
            }
        }
    }

    async fn fetch_list(&self, list_url: &str) -> Result<Vec<String>> {
        let response = self.client.get(list_url).send().await?;
        if !response.status().is_success() {
            return Err(PubsyncError::Api {
                code: response.status().as_u16() as i32,
                message: format!("Proxy list error: {}", response.status()),
            });
        }
        let body = response.text().await?;
        Ok(parse_proxy_list(&body))
    }
}

/// Parse one proxy per line, ignoring blanks and `#` comments; bare `host:port`
/// entries get an `http://` scheme.
pub fn parse_proxy_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.contains("://") {
                line.to_string()
            } else {
                format!("http://{}", line)
            }
        })
        .collect()
}
