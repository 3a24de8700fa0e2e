//! Software catalog enrichment.
//!
//! Turns a hand-maintained list of GitHub URLs into entries with the repository
//! description and a language breakdown.

use crate::github::{parse_repo_url, GitHubClient};
use crate::model::{LanguageShare, Languages, SoftwareEntry, SoftwareFile};
use crate::store::software_metadata;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Percent share per language, largest first, rounded to two decimals.
///
/// `None` for an empty map or one with zero total bytes.
pub fn language_percentages(bytes: &BTreeMap<String, u64>) -> Option<Vec<LanguageShare>> {
    let total: u64 = bytes.values().sum();
    if total == 0 {
        return None;
    }

    let mut shares: Vec<LanguageShare> = bytes
        .iter()
        .map(|(lang, count)| LanguageShare {
            lang: lang.clone(),
            percent: round2(*count as f64 / total as f64 * 100.0),
        })
        .collect();
    shares.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    Some(shares)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Enrich one repository URL; `None` when the repository cannot be described.
pub async fn enrich(client: &GitHubClient, url: &str) -> Option<SoftwareEntry> {
    let (owner, name) = match parse_repo_url(url) {
        Ok(parts) => parts,
        Err(e) => {
            warn!(url, error = %e, "Skipping repository");
            return None;
        }
    };

    info!(repo = %name, "Processing repository");

    let description = match client.repository(&owner, &name).await {
        Ok(info) => info.description.unwrap_or_default(),
        Err(e) => {
            warn!(repo = %name, error = %e, "Failed to fetch description");
            return None;
        }
    };

    let languages = match client.languages(&owner, &name).await {
        Ok(bytes) => language_percentages(&bytes).map(|ordered| Languages { bytes, ordered }),
        Err(e) => {
            warn!(repo = %name, error = %e, "Failed to fetch languages");
            None
        }
    };

    Some(SoftwareEntry {
        name,
        url: url.to_string(),
        description,
        languages,
    })
}

/// Enrich every URL in order, dropping the ones that fail.
pub async fn build_catalog(client: &GitHubClient, urls: &[String]) -> SoftwareFile {
    let mut software = Vec::with_capacity(urls.len());
    for url in urls {
        if let Some(entry) = enrich(client, url).await {
            software.push(entry);
        }
    }

    info!(enriched = software.len(), total = urls.len(), "Software catalog built");
    SoftwareFile {
        metadata: software_metadata(),
        software,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_percentages_sorted_and_rounded() {
        let mut bytes = BTreeMap::new();
        bytes.insert("Python".to_string(), 1);
        bytes.insert("Rust".to_string(), 2);
        let shares = language_percentages(&bytes).unwrap_or_default();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].lang, "Rust");
        assert_eq!(shares[0].percent, 66.67);
        assert_eq!(shares[1].lang, "Python");
        assert_eq!(shares[1].percent, 33.33);
    }

    #[test]
    fn test_language_percentages_empty() {
        assert!(language_percentages(&BTreeMap::new()).is_none());
        let mut zero = BTreeMap::new();
        zero.insert("Rust".to_string(), 0);
        assert!(language_percentages(&zero).is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_skipped() -> crate::Result<()> {
        let client = GitHubClient::with_base_url("http://127.0.0.1:9", None)?;
        assert!(enrich(&client, "not a url").await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_repository_is_dropped() -> crate::Result<()> {
        let base = crate::github::serve_status("404 Not Found").await?;
        let client = GitHubClient::with_base_url(&base, None)?;
        assert!(enrich(&client, "https://github.com/jskaza/gone").await.is_none());
        Ok(())
    }
}
