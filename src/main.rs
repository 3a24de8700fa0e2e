//! pubsync - publication sync for a personal site
//!
//! Pulls publications from a Google Scholar profile, stores them as TOML and renders
//! HTML/Markdown citation fragments for the site and CV.
//!
//! ## Usage
//!
//! ```bash
//! pubsync fetch --scholar-id dAAMOqgAAAAJ --github-user jskaza
//! pubsync render --input data/publications.toml
//! pubsync conferences --input _data/conferences.yml
//! pubsync software --input data/software_raw.toml
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use pubsync::cache::{default_cache_path, ResponseCache};
use pubsync::citation;
use pubsync::config::{
    CacheConfig, FetchConfig, ProxyConfig, RenderConfig, CACHE_TTL, DEFAULT_AUTHOR_NAME,
    DEFAULT_SCHOLAR_ID,
};
use pubsync::fetch;
use pubsync::github::GitHubClient;
use pubsync::model::{Publication, PublicationFile};
use pubsync::scholar::{self, ScholarClient, ScholarOptions};
use pubsync::{software, store};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Google Scholar publication sync and citation rendering
#[derive(Parser)]
#[command(name = "pubsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch publications from Google Scholar, store them and render citations
    Fetch(FetchArgs),

    /// Render citations from a stored publication file
    Render {
        /// Stored publication file
        #[arg(short, long, default_value = "data/publications.toml")]
        input: PathBuf,

        #[command(flatten)]
        output: PublicationOutput,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Render curated conference talks and posters
    Conferences {
        /// Curated conference list (YAML)
        #[arg(short, long, default_value = "_data/conferences.yml")]
        input: PathBuf,

        /// HTML output
        #[arg(long, default_value = "_includes/conferences.html")]
        html: PathBuf,

        /// Markdown (CV) output
        #[arg(long, default_value = "_includes/cv_conferences.md")]
        markdown: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Enrich a list of GitHub repositories into the software catalog
    Software {
        /// List of repository URLs (TOML, `software = [...]`)
        #[arg(short, long, default_value = "data/software_raw.toml")]
        input: PathBuf,

        /// Enriched catalog output
        #[arg(short, long, default_value = "data/software.toml")]
        output: PathBuf,
    },

    /// Manage the HTTP response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        /// Cache file (defaults to the user cache directory)
        #[arg(long, global = true)]
        cache_path: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Google Scholar profile id
    #[arg(long, default_value = DEFAULT_SCHOLAR_ID)]
    scholar_id: String,

    /// Author name used on the placeholder record
    #[arg(long, default_value = DEFAULT_AUTHOR_NAME)]
    author_name: String,

    /// GitHub user whose repositories are matched against titles
    #[arg(long)]
    github_user: Option<String>,

    /// Only process the first N publications
    #[arg(long)]
    limit: Option<usize>,

    /// Seconds to wait between publication detail requests
    #[arg(long, default_value = "2")]
    throttle_secs: u64,

    /// Whole-run attempts before falling back to a placeholder
    #[arg(long, default_value = "5")]
    attempts: u32,

    /// Backoff unit in seconds (attempt n waits n units)
    #[arg(long, default_value = "180")]
    backoff_secs: u64,

    /// Proxy URL to rotate through (repeatable)
    #[arg(long = "proxy")]
    proxies: Vec<String>,

    /// URL of a plain-text proxy list (one host:port per line)
    #[arg(long)]
    proxy_list_url: Option<String>,

    /// Mirror site URL
    #[arg(long)]
    mirror: Option<String>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Cache file (defaults to the user cache directory)
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Stored publication file
    #[arg(short, long, default_value = "data/publications.toml")]
    out: PathBuf,

    #[command(flatten)]
    output: PublicationOutput,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args)]
struct PublicationOutput {
    /// HTML output
    #[arg(long, default_value = "_includes/publications.html")]
    html: PathBuf,

    /// Markdown (CV) output
    #[arg(long, default_value = "_includes/cv_publications.md")]
    markdown: PathBuf,
}

#[derive(Args)]
struct RenderArgs {
    /// Abbreviated name to emphasize (repeatable, default "J Skaza" and "JS Skaza")
    #[arg(long = "highlight")]
    highlight: Vec<String>,

    /// Profile page linked from the "last updated" note
    #[arg(long)]
    profile_url: Option<String>,
}

impl RenderArgs {
    fn config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if !self.highlight.is_empty() {
            config.highlight = self.highlight.clone();
        }
        if let Some(url) = &self.profile_url {
            config.profile_url = url.clone();
        }
        config
    }
}

#[derive(Subcommand)]
enum CacheAction {
    /// Clear the response cache
    Clear,
    /// Show cache file path
    Path,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Fetch(args) => run_fetch(args).await,
        Commands::Render {
            input,
            output,
            render,
        } => {
            let file = store::load_publications(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            write_publication_outputs(&file.publication, &output, &render.config())
        }
        Commands::Conferences {
            input,
            html,
            markdown,
            render,
        } => run_conferences(&input, &html, &markdown, &render.config()),
        Commands::Software { input, output } => run_software(&input, &output).await,
        Commands::Cache { action, cache_path } => handle_cache(action, cache_path),
    }
}

// ============================================================================
// Publications
// ============================================================================

async fn run_fetch(args: FetchArgs) -> Result<()> {
    println!("Starting publications update...");

    let fetch_config = FetchConfig {
        author_id: args.scholar_id.clone(),
        author_name: args.author_name.clone(),
        limit: args.limit,
        throttle: Duration::from_secs(args.throttle_secs),
        max_attempts: args.attempts,
        backoff_unit: Duration::from_secs(args.backoff_secs),
    };

    let cache = if args.no_cache {
        CacheConfig::disabled()
    } else {
        CacheConfig {
            path: args.cache_path.clone(),
            ..CacheConfig::default()
        }
    };

    let client = ScholarClient::new(ScholarOptions {
        base_url: args.mirror.clone(),
        proxy: ProxyConfig {
            proxies: args.proxies.clone(),
            list_url: args.proxy_list_url.clone(),
        },
        cache,
    })?;

    let repositories = match &args.github_user {
        Some(user) => {
            let github = GitHubClient::new(std::env::var("GITHUB_TOKEN").ok())?;
            github.list_repositories(user).await.unwrap_or_else(|e| {
                warn!(user = %user, error = %e, "Could not list repositories, skipping code links");
                Vec::new()
            })
        }
        None => Vec::new(),
    };

    let outcome = fetch::fetch_publications(&client, &repositories, &fetch_config).await;
    client.save_cache();

    let publications = if outcome.degraded {
        match prior_publications(&args.out) {
            Some(prior) => {
                warn!(
                    path = %args.out.display(),
                    count = prior.len(),
                    "Fetch failed, keeping previously stored publications"
                );
                prior
            }
            None => {
                store_publications(&args, outcome.publications.clone())?;
                outcome.publications
            }
        }
    } else {
        store_publications(&args, outcome.publications.clone())?;
        outcome.publications
    };

    println!("Successfully fetched {} publications", publications.len());

    let mut render = args.render.config();
    if args.render.profile_url.is_none() {
        render.profile_url = scholar::profile_url(
            args.mirror.as_deref().unwrap_or(scholar::DEFAULT_SCHOLAR_URL),
            &args.scholar_id,
        );
    }
    write_publication_outputs(&publications, &args.output, &render)?;
    println!("Update completed successfully");
    Ok(())
}

/// Real publications from an earlier run, if any.
fn prior_publications(path: &Path) -> Option<Vec<Publication>> {
    if !path.exists() {
        return None;
    }
    match store::load_publications(path) {
        Ok(file) if store::has_real_publications(&file.publication) => Some(file.publication),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable publication file");
            None
        }
    }
}

fn store_publications(args: &FetchArgs, publications: Vec<Publication>) -> Result<()> {
    let file = PublicationFile {
        metadata: store::publication_metadata(&args.scholar_id, args.github_user.as_deref()),
        publication: publications,
    };
    store::save_publications(&args.out, &file)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Wrote {} entries to {}", file.publication.len(), args.out.display());
    Ok(())
}

fn write_publication_outputs(
    publications: &[Publication],
    output: &PublicationOutput,
    render: &RenderConfig,
) -> Result<()> {
    println!("Generating HTML output...");
    let html = citation::render_publications_html(publications, render, Local::now().date_naive());
    store::write_atomic(&output.html, &html)
        .with_context(|| format!("Failed to write {}", output.html.display()))?;

    println!("Generating Markdown output...");
    let markdown = citation::render_publications_markdown(publications, render);
    store::write_atomic(&output.markdown, &markdown)
        .with_context(|| format!("Failed to write {}", output.markdown.display()))?;

    info!(
        html = %output.html.display(),
        markdown = %output.markdown.display(),
        "Rendered publications"
    );
    Ok(())
}

// ============================================================================
// Conferences & Software
// ============================================================================

fn run_conferences(input: &Path, html: &Path, markdown: &Path, render: &RenderConfig) -> Result<()> {
    let conferences = store::load_conferences(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    store::write_atomic(html, &citation::render_conferences_html(&conferences, render))
        .with_context(|| format!("Failed to write {}", html.display()))?;
    store::write_atomic(markdown, &citation::render_conferences_markdown(&conferences, render))
        .with_context(|| format!("Failed to write {}", markdown.display()))?;

    println!("Rendered {} conference entries", conferences.len());
    Ok(())
}

async fn run_software(input: &Path, output: &Path) -> Result<()> {
    let list = store::load_software_list(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let github = GitHubClient::new(std::env::var("GITHUB_TOKEN").ok())?;
    let catalog = software::build_catalog(&github, &list.software).await;

    store::save_software(output, &catalog)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Data saved to {}", output.display());
    Ok(())
}

// ============================================================================
// Cache Management
// ============================================================================

fn handle_cache(action: CacheAction, cache_path: Option<PathBuf>) -> Result<()> {
    let path = match cache_path {
        Some(path) => path,
        None => default_cache_path()?,
    };

    match action {
        CacheAction::Clear => {
            ResponseCache::clear(&path)?;
            println!("Response cache cleared");
        }
        CacheAction::Path => {
            let cache = ResponseCache::open(path, CACHE_TTL);
            println!("{} ({} entries)", cache.path().display(), cache.len());
        }
    }
    Ok(())
}
