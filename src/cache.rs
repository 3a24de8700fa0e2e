//! Persistent HTTP response cache.
//!
//! Successful response bodies are stored in a single JSON file keyed by request
//! signature (`METHOD URL`). Entries older than the configured TTL are ignored and
//! dropped on the next save.

use crate::config::CacheConfig;
use crate::error::{PubsyncError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cache file path: `<cache dir>/pubsync/http_cache.json`
pub fn default_cache_path() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|p| p.join("pubsync").join("http_cache.json"))
        .ok_or_else(|| PubsyncError::Config("Cannot determine cache directory".to_string()))
}

/// Build the cache key for a request.
pub fn signature(method: &str, url: &str) -> String {
    format!("{} {}", method.to_uppercase(), url)
}

/// A cached response body with its fetch time (unix seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub body: String,
    pub fetched_at: i64,
}

/// File-backed response cache
pub struct ResponseCache {
    path: PathBuf,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    /// Open the cache at `path`, loading any existing entries.
    pub fn open(path: PathBuf, ttl: Duration) -> Self {
        let entries = load_entries(&path);
        Self {
            path,
            ttl,
            entries: Mutex::new(entries),
        }
    }

    /// Open the cache described by `config`; `None` when caching is disabled or the
    /// location cannot be determined.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let path = match config.path.clone().map(Ok).unwrap_or_else(default_cache_path) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Response cache unavailable, continuing without it");
                return None;
            }
        };
        Some(Self::open(path, config.ttl))
    }

    /// Get the cache file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Fresh body for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if self.is_fresh(entry, chrono::Utc::now().timestamp()) {
            debug!(key, "Cache hit");
            Some(entry.body.clone())
        } else {
            debug!(key, "Cache entry expired");
            None
        }
    }

    /// Store a body under `key`.
    pub fn put(&self, key: &str, body: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CachedResponse {
                    body: body.to_string(),
                    fetched_at: chrono::Utc::now().timestamp(),
                },
            );
        }
    }

    /// Number of entries currently held (fresh or not)
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write fresh entries back to disk.
    pub fn save(&self) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let fresh: HashMap<String, CachedResponse> = {
            let entries = self
                .entries
                .lock()
                .map_err(|_| PubsyncError::Config("Response cache lock poisoned".to_string()))?;
            entries
                .iter()
                .filter(|(_, entry)| self.is_fresh(entry, now))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(&fresh)?;
        std::fs::write(&self.path, content)?;
        info!("Saved {} cached responses to {:?}", fresh.len(), self.path);
        Ok(())
    }

    /// Remove the cache file
    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
            info!("Cleared response cache at {:?}", path);
        }
        Ok(())
    }

    fn is_fresh(&self, entry: &CachedResponse, now: i64) -> bool {
        let age = now.saturating_sub(entry.fetched_at);
        age >= 0 && (age as u64) < self.ttl.as_secs()
    }
}

fn load_entries(path: &Path) -> HashMap<String, CachedResponse> {
    if !path.exists() {
        debug!("Cache file not found: {:?}", path);
        return HashMap::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<HashMap<String, CachedResponse>>(&content) {
            Ok(entries) => {
                info!("Loaded {} cached responses from {:?}", entries.len(), path);
                entries
            }
            Err(e) => {
                warn!("Failed to parse response cache: {}", e);
                HashMap::new()
            }
        },
        Err(e) => {
            warn!("Failed to read response cache: {}", e);
            HashMap::new()
        }
    }
}
