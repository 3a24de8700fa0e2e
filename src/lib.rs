//! # pubsync
//!
//! Keeps a personal site's publication and talk listings in sync with Google Scholar.
//!
//! ## Modules
//!
//! - [`scholar`] - Google Scholar profile scraping (list + detail)
//! - [`fetch`] - Retrying, throttled fetch orchestration
//! - [`normalize`] - Source record → canonical publication
//! - [`matcher`] - Publication → GitHub repository matching
//! - [`citation`] - Author formatting and HTML/Markdown rendering
//! - [`store`] - TOML/YAML persistence
//! - [`github`] - GitHub REST client
//! - [`software`] - Software catalog enrichment
//! - [`proxy`] / [`cache`] - Rotating proxies and response cache
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubsync::{citation, config::{FetchConfig, RenderConfig}, fetch, scholar::ScholarClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScholarClient::new(Default::default())?;
//!     let outcome = fetch::fetch_publications(&client, &[], &FetchConfig::default()).await;
//!     let markdown = citation::render_publications_markdown(&outcome.publications, &RenderConfig::default());
//!     print!("{}", markdown);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod citation;
pub mod config;
pub mod error;
pub mod fetch;
pub mod github;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod proxy;
pub mod scholar;
pub mod software;
pub mod store;

pub use error::{PubsyncError, Result};
