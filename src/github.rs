//! GitHub REST API client.
//!
//! Used for two things: listing an owner's repositories so publications can be matched
//! to code, and enriching the software catalog with descriptions and language bytes.
//! Any non-success status is reported as [`PubsyncError::NotFound`].

use crate::error::{PubsyncError, Result};
use crate::model::Repository;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// GitHub API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Repositories requested per page
const PER_PAGE: usize = 100;

/// Repository metadata as returned by `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Client against the public GitHub API
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(GITHUB_API_URL, token)
    }

    /// Client against a custom API root (GitHub Enterprise or a test server)
    pub fn with_base_url(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pubsync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| PubsyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Repository metadata, including its (possibly absent) description.
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let path = format!(
            "/repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.get_json(&path).await
    }

    /// Per-language byte counts for a repository.
    pub async fn languages(&self, owner: &str, repo: &str) -> Result<BTreeMap<String, u64>> {
        let path = format!(
            "/repos/{}/{}/languages",
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        );
        self.get_json(&path).await
    }

    /// All public repositories of `owner`, in the order the API returns them.
    pub async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();
        for page in 1.. {
            let path = format!(
                "/users/{}/repos?per_page={}&page={}",
                urlencoding::encode(owner),
                PER_PAGE,
                page
            );
            let batch: Vec<RepoInfo> = self.get_json(&path).await?;
            let count = batch.len();
            repositories.extend(batch.into_iter().map(|r| Repository {
                url: r.html_url,
                description: r.description,
            }));
            if count < PER_PAGE {
                break;
            }
        }

        info!(owner, count = repositories.len(), "Fetched repositories");
        Ok(repositories)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GitHub request");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(PubsyncError::NotFound(format!(
                "{} returned {}",
                path,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

/// Split a GitHub URL into `(owner, repo)`: first and last path segments.
pub fn parse_repo_url(repo_url: &str) -> Result<(String, String)> {
    let url = Url::parse(repo_url)
        .map_err(|e| PubsyncError::Validation(format!("Invalid repository URL '{}': {}", repo_url, e)))?;

    let segments: Vec<&str> = url
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (segments.first(), segments.last()) {
        (Some(owner), Some(repo)) if segments.len() >= 2 => Ok((owner.to_string(), repo.to_string())),
        _ => Err(PubsyncError::Validation(format!(
            "Repository URL '{}' has no owner/name path",
            repo_url
        ))),
    }
}

/// Minimal HTTP server answering every request with a fixed status line.
#[cfg(test)]
pub(crate) async fn serve_status(status: &'static str) -> std::io::Result<String> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    Ok(format!("http://{}", addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url() -> Result<()> {
        assert_eq!(
            parse_repo_url("https://github.com/jskaza/widgets")?,
            ("jskaza".to_string(), "widgets".to_string())
        );
        assert_eq!(
            parse_repo_url("https://github.com/jskaza/widgets/")?,
            ("jskaza".to_string(), "widgets".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_parse_repo_url_rejects_bad_input() {
        assert!(parse_repo_url("not a url").is_err());
        assert!(parse_repo_url("https://github.com/jskaza").is_err());
    }

    #[test]
    fn test_repo_info_without_description() -> Result<()> {
        let info: RepoInfo = serde_json::from_str(r#"{"html_url":"https://github.com/a/b","description":null}"#)?;
        assert_eq!(info.html_url, "https://github.com/a/b");
        assert!(info.description.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_not_found() -> Result<()> {
        let base = serve_status("404 Not Found").await?;
        let client = GitHubClient::with_base_url(&base, None)?;

        let result = client.repository("jskaza", "widgets").await;
        assert!(matches!(result, Err(PubsyncError::NotFound(_))));
        assert!(matches!(
            client.languages("jskaza", "widgets").await,
            Err(PubsyncError::NotFound(_))
        ));
        Ok(())
    }
}
