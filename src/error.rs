//! Custom error types for pubsync.
//!
//! Every fallible library function returns `Result<T, PubsyncError>`; the binary wraps
//! these in `anyhow` with context.

use thiserror::Error;

/// Main error type for pubsync operations.
#[derive(Debug, Error)]
pub enum PubsyncError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML or field parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by the upstream service
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// CAPTCHA or "unusual traffic" interstitial served instead of content
    #[error("CAPTCHA detected, automated access is being blocked")]
    Captcha,

    /// Hosting service has no such repository (or refused the lookup)
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML deserialization error
    #[error("TOML read error: {0}")]
    TomlRead(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `PubsyncError`
pub type Result<T> = std::result::Result<T, PubsyncError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PubsyncError::Parse(msg.to_string()))
    }
}
