//! Fetch orchestration.
//!
//! One run lists the profile's stubs, fills each one in order with a fixed throttle in
//! between, normalizes it and attaches a matching repository. Per-item failures are
//! skipped. An attempt that yields nothing is retried after a linearly growing
//! backoff; when every attempt fails the caller gets a single placeholder record, so
//! rendering always has something to show.

use crate::config::FetchConfig;
use crate::error::{PubsyncError, Result};
use crate::matcher::match_repository;
use crate::model::{Publication, Repository};
use crate::normalize::normalize;
use crate::scholar::PublicationSource;
use chrono::Datelike;
use tracing::{error, info, warn};

/// Title of the record returned when every attempt failed
pub const PLACEHOLDER_TITLE: &str = "Publications temporarily unavailable";

/// Result of a fetch run
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Never empty
    pub publications: Vec<Publication>,
    /// True when `publications` is the placeholder record
    pub degraded: bool,
    /// Attempts used (1-based)
    pub attempts: u32,
    /// Stubs skipped in the successful attempt
    pub skipped: usize,
}

/// Fetch, normalize and match the author's publications with retries.
pub async fn fetch_publications<S>(
    source: &S,
    repositories: &[Repository],
    config: &FetchConfig,
) -> FetchOutcome
where
    S: PublicationSource + ?Sized,
{
    for attempt in 0..config.max_attempts {
        source.refresh_proxy().await;

        if attempt > 0 {
            let backoff = config.backoff_for(attempt);
            info!(
                backoff_secs = backoff.as_secs(),
                next_attempt = attempt + 1,
                "Waiting before retry"
            );
            tokio::time::sleep(backoff).await;
        }

        info!(
            attempt = attempt + 1,
            max_attempts = config.max_attempts,
            "Fetching publications"
        );

        match run_attempt(source, repositories, config).await {
            Ok((publications, skipped)) => {
                info!(
                    count = publications.len(),
                    skipped,
                    "Successfully fetched publications"
                );
                return FetchOutcome {
                    publications,
                    degraded: false,
                    attempts: attempt + 1,
                    skipped,
                };
            }
            Err(e) => warn!(attempt = attempt + 1, error = %e, "Attempt failed"),
        }
    }

    error!(
        attempts = config.max_attempts,
        "Failed to fetch publications, using placeholder record"
    );
    FetchOutcome {
        publications: vec![placeholder(source, config)],
        degraded: true,
        attempts: config.max_attempts,
        skipped: 0,
    }
}

/// The record shown when the source could not be reached at all.
pub fn placeholder<S>(source: &S, config: &FetchConfig) -> Publication
where
    S: PublicationSource + ?Sized,
{
    Publication {
        title: PLACEHOLDER_TITLE.to_string(),
        year: chrono::Local::now().year(),
        authors: vec![config.author_name.clone()],
        journal: None,
        volume: None,
        number: None,
        abstract_text: None,
        url: source.profile_url(&config.author_id),
        cites: None,
        github_repo: None,
    }
}

async fn run_attempt<S>(
    source: &S,
    repositories: &[Repository],
    config: &FetchConfig,
) -> Result<(Vec<Publication>, usize)>
where
    S: PublicationSource + ?Sized,
{
    let mut stubs = source.list_stubs(&config.author_id).await?;
    if let Some(limit) = config.limit {
        stubs.truncate(limit);
    }

    let total = stubs.len();
    info!(total, "Found publications, fetching details");

    let mut publications = Vec::with_capacity(total);
    let mut skipped = 0;

    for (i, stub) in stubs.iter().enumerate() {
        if i > 0 && !config.throttle.is_zero() {
            tokio::time::sleep(config.throttle).await;
        }

        info!(index = i + 1, total, title = %stub.title, "Processing publication");

        let publication = source.fill(stub).await.and_then(|record| normalize(&record));
        match publication {
            Ok(mut publication) => {
                if publication.github_repo.is_none() {
                    publication.github_repo =
                        match_repository(&publication.title, repositories).map(str::to_string);
                }
                publications.push(publication);
            }
            Err(e) => {
                warn!(index = i + 1, error = %e, "Error processing publication");
                skipped += 1;
            }
        }
    }

    if publications.is_empty() {
        return Err(PubsyncError::Validation(
            "No publications were successfully processed".to_string(),
        ));
    }

    Ok((publications, skipped))
}
