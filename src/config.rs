//! Runtime configuration passed explicitly into the pipeline.
//!
//! Nothing here is global: the CLI builds these structs from its flags, tests build
//! them with [`FetchConfig::immediate`] so no wall-clock waits happen.

use std::path::PathBuf;
use std::time::Duration;

/// Default Google Scholar profile id
pub const DEFAULT_SCHOLAR_ID: &str = "dAAMOqgAAAAJ";

/// Name used on the placeholder record, in the same "Last, First" shape the source uses
pub const DEFAULT_AUTHOR_NAME: &str = "Skaza, Jonathan";

/// Abbreviated names rendered in bold
pub const DEFAULT_HIGHLIGHT: &[&str] = &["J Skaza", "JS Skaza"];

/// Response cache validity
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Fetch orchestrator settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Scholar profile id to query
    pub author_id: String,
    /// Author's own name, used only on the placeholder record
    pub author_name: String,
    /// Only process the first N stubs
    pub limit: Option<usize>,
    /// Fixed delay between successive detail requests
    pub throttle: Duration,
    /// Whole-run attempts before degrading to the placeholder
    pub max_attempts: u32,
    /// Backoff before attempt `n` is `backoff_unit * n`
    pub backoff_unit: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            author_id: DEFAULT_SCHOLAR_ID.to_string(),
            author_name: DEFAULT_AUTHOR_NAME.to_string(),
            limit: None,
            throttle: Duration::from_secs(2),
            max_attempts: 5,
            backoff_unit: Duration::from_secs(180),
        }
    }
}

impl FetchConfig {
    /// Configuration with throttle and backoff disabled.
    pub fn immediate(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            throttle: Duration::ZERO,
            backoff_unit: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Backoff slept before the given zero-based attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    /// Explicit proxy URLs to rotate through
    pub proxies: Vec<String>,
    /// Plain-text list of `host:port` lines to draw proxies from
    pub list_url: Option<String>,
}

impl ProxyConfig {
    /// Whether any proxy source is configured
    pub fn is_enabled(&self) -> bool {
        !self.proxies.is_empty() || self.list_url.is_some()
    }
}

/// Response cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Read and write the response cache at all
    pub enabled: bool,
    /// Cache file; `None` means the default location
    pub path: Option<PathBuf>,
    /// Maximum age of a reusable response
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl: CACHE_TTL,
        }
    }
}

impl CacheConfig {
    /// Settings that bypass the cache entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Citation rendering settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Exact abbreviated names to emphasize
    pub highlight: Vec<String>,
    /// Profile page linked from the "last updated" note
    pub profile_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            highlight: DEFAULT_HIGHLIGHT.iter().map(|s| s.to_string()).collect(),
            profile_url: crate::scholar::profile_url(crate::scholar::DEFAULT_SCHOLAR_URL, DEFAULT_SCHOLAR_ID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_linear() {
        let config = FetchConfig::default();
        assert_eq!(config.backoff_for(0), Duration::ZERO);
        assert_eq!(config.backoff_for(1), Duration::from_secs(180));
        assert_eq!(config.backoff_for(2), Duration::from_secs(360));
    }

    #[test]
    fn test_immediate_has_no_waits() {
        let config = FetchConfig::immediate("abc");
        assert_eq!(config.author_id, "abc");
        assert_eq!(config.throttle, Duration::ZERO);
        assert_eq!(config.backoff_for(4), Duration::ZERO);
        assert_eq!(config.max_attempts, 5);
    }
}
