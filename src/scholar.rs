//! Google Scholar profile adapter.
//!
//! Listing a profile returns lightweight stubs; each stub needs a second round trip to
//! its "view citation" page for the detailed fields. Requests go through an optional
//! rotating proxy and an optional day-long response cache.

use crate::cache::{signature, ResponseCache};
use crate::config::{CacheConfig, ProxyConfig};
use crate::error::{OptionExt, PubsyncError, Result};
use crate::proxy::ProxyPool;
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Rows requested per profile page (Scholar's maximum)
const PAGE_SIZE: usize = 100;

/// Hard stop for profile pagination
const MAX_PAGES: usize = 20;

/// A publication as listed on a profile page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PublicationStub {
    /// `citation_for_view` id, e.g. `dAAMOqgAAAAJ:u5HHmVD_uO8C`
    pub author_pub_id: String,
    pub title: String,
    /// Short author list as shown in the listing
    pub authors: String,
    pub venue: String,
    pub year: Option<String>,
    pub num_citations: Option<u32>,
}

/// Fully populated source payload for one publication.
///
/// `bib` uses BibTeX-ish keys (`title`, `author`, `pub_year`, `journal`, `booktitle`,
/// `venue`, `conference`, `volume`, `number`, `abstract`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourceRecord {
    pub bib: BTreeMap<String, String>,
    pub pub_url: Option<String>,
    pub eprint_url: Option<String>,
    pub num_citations: Option<u32>,
    pub author_pub_id: Option<String>,
}

impl SourceRecord {
    /// Non-blank bib value for `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.bib
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// The scholarly-profile service contract used by the fetch orchestrator.
#[async_trait]
pub trait PublicationSource: Send + Sync {
    /// All publication stubs for a profile, in profile order.
    async fn list_stubs(&self, author_id: &str) -> Result<Vec<PublicationStub>>;

    /// Detailed record for one stub (separate round trip).
    async fn fill(&self, stub: &PublicationStub) -> Result<SourceRecord>;

    /// Pick a fresh outbound proxy; falls back to direct access on failure.
    async fn refresh_proxy(&self);

    /// Public profile page for `author_id`.
    fn profile_url(&self, author_id: &str) -> String;
}

/// Options for [`ScholarClient`]
#[derive(Debug, Clone, Default)]
pub struct ScholarOptions {
    /// Custom base URL for mirror sites
    pub base_url: Option<String>,
    pub proxy: ProxyConfig,
    pub cache: CacheConfig,
}

/// HTTP-backed Google Scholar client
pub struct ScholarClient {
    base_url: String,
    client: Mutex<reqwest::Client>,
    proxies: Option<ProxyPool>,
    cache: Option<ResponseCache>,
}

impl ScholarClient {
    /// Build a client; proxies are only acquired on [`PublicationSource::refresh_proxy`].
    pub fn new(options: ScholarOptions) -> Result<Self> {
        let base_url = options
            .base_url
            .as_ref()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string());

        let proxies = if options.proxy.is_enabled() {
            Some(ProxyPool::new(options.proxy)?)
        } else {
            None
        };

        Ok(Self {
            base_url,
            client: Mutex::new(build_http_client(None)?),
            proxies,
            cache: ResponseCache::from_config(&options.cache),
        })
    }

    /// Persist the response cache, if one is in use.
    pub fn save_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save() {
                warn!(error = %e, "Failed to save response cache");
            }
        }
    }

    fn current_client(&self) -> Result<reqwest::Client> {
        self.client
            .lock()
            .map(|c| c.clone())
            .map_err(|_| PubsyncError::Config("HTTP client lock poisoned".to_string()))
    }

    async fn get_html(&self, url: &Url) -> Result<String> {
        let key = signature("GET", url.as_str());
        if let Some(body) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return Ok(body);
        }

        let client = self.current_client()?;
        let html = fetch_page(&client, url).await?;
        if is_blocked(&html) {
            warn!(url = %url, "CAPTCHA detected");
            return Err(PubsyncError::Captcha);
        }

        if let Some(cache) = &self.cache {
            cache.put(&key, &html);
        }
        Ok(html)
    }
}

#[async_trait]
impl PublicationSource for ScholarClient {
    async fn list_stubs(&self, author_id: &str) -> Result<Vec<PublicationStub>> {
        info!(author_id, url = %self.base_url, "Listing profile publications");

        let mut stubs = Vec::new();
        for page in 0..MAX_PAGES {
            let url = build_profile_url(&self.base_url, author_id, page * PAGE_SIZE)?;
            debug!(page, url = %url, "Fetching profile page");

            let html = self.get_html(&url).await?;
            let page_stubs = parse_profile_page(&html, &self.base_url)?;
            let count = page_stubs.len();
            stubs.extend(page_stubs);

            if count < PAGE_SIZE {
                break;
            }
        }

        info!(total = stubs.len(), "Profile listing complete");
        Ok(stubs)
    }

    async fn fill(&self, stub: &PublicationStub) -> Result<SourceRecord> {
        let url = build_citation_url(&self.base_url, &stub.author_pub_id)?;
        let html = self.get_html(&url).await?;
        let mut record = parse_citation_page(&html)?;

        record.author_pub_id = Some(stub.author_pub_id.clone());
        if record.num_citations.is_none() {
            record.num_citations = stub.num_citations;
        }
        if let Some(year) = stub.year.as_ref().filter(|y| !y.is_empty()) {
            record.bib.entry("year".to_string()).or_insert_with(|| year.clone());
        }
        if !record.bib.contains_key("title") && !stub.title.is_empty() {
            record.bib.insert("title".to_string(), stub.title.clone());
        }
        Ok(record)
    }

    async fn refresh_proxy(&self) {
        let Some(pool) = &self.proxies else {
            return;
        };

        let proxy = pool.acquire().await;
        let client = match build_http_client(proxy.as_deref()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Proxy setup failed, using direct requests");
                match build_http_client(None) {
                    Ok(client) => client,
                    Err(e) => {
                        warn!(error = %e, "Keeping previous HTTP client");
                        return;
                    }
                }
            }
        };

        if let Ok(mut current) = self.client.lock() {
            *current = client;
        }
    }

    fn profile_url(&self, author_id: &str) -> String {
        profile_url(&self.base_url, author_id)
    }
}

/// Public profile page link.
pub fn profile_url(base_url: &str, author_id: &str) -> String {
    format!("{}/citations?hl=en&user={}", base_url.trim_end_matches('/'), author_id)
}

/// Scholar search link for a title; the guaranteed fallback link of a publication.
///
/// Always points at the canonical host, even when fetching through a mirror, so stored
/// links stay stable across runs.
pub fn search_url(title: &str) -> String {
    let query: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
    format!("{}/scholar?q={}", DEFAULT_SCHOLAR_URL, query)
}

/// Build HTTP client with optional proxy
fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            PubsyncError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| PubsyncError::Config(format!("Failed to build HTTP client: {}", e)))
}

fn build_profile_url(base_url: &str, author_id: &str, cstart: usize) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/citations", base_url))
        .map_err(|e| PubsyncError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("user", author_id)
        .append_pair("hl", "en")
        .append_pair("cstart", &cstart.to_string())
        .append_pair("pagesize", &PAGE_SIZE.to_string());

    Ok(url)
}

fn build_citation_url(base_url: &str, author_pub_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/citations", base_url))
        .map_err(|e| PubsyncError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("view_op", "view_citation")
        .append_pair("hl", "en")
        .append_pair("citation_for_view", author_pub_id);

    Ok(url)
}

/// Fetch page content using HTTP client
async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.as_str())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(PubsyncError::RateLimited(60));
    }

    if !status.is_success() {
        return Err(PubsyncError::Api {
            code: status.as_u16() as i32,
            message: format!("HTTP error: {}", status),
        });
    }

    response.text().await.map_err(PubsyncError::Network)
}

fn is_blocked(html: &str) -> bool {
    html.contains("Solving the above CAPTCHA") || html.contains("unusual traffic")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PubsyncError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_count(text: &str) -> Option<u32> {
    text.trim().replace(',', "").parse().ok()
}

/// Parse the publication table of a profile page.
pub fn parse_profile_page(html: &str, base_url: &str) -> Result<Vec<PublicationStub>> {
    let document = Html::parse_document(html);

    let row_selector = selector("tr.gsc_a_tr")?;
    let title_selector = selector("a.gsc_a_at")?;
    let gray_selector = selector("div.gs_gray")?;
    let cites_selector = selector("a.gsc_a_ac")?;
    let year_selector = selector("span.gsc_a_h")?;

    let base = Url::parse(base_url).map_err(|e| PubsyncError::Config(format!("Invalid base URL: {}", e)))?;
    let mut stubs = Vec::new();

    for row in document.select(&row_selector) {
        let Some(link) = row.select(&title_selector).next() else {
            continue;
        };

        let href = link.value().attr("href").unwrap_or("");
        let author_pub_id = match base.join(href) {
            Ok(url) => url
                .query_pairs()
                .find(|(k, _)| k == "citation_for_view")
                .map(|(_, v)| v.into_owned()),
            Err(_) => None,
        };
        let Some(author_pub_id) = author_pub_id else {
            debug!(href, "Skipping row without citation id");
            continue;
        };

        let mut gray = row.select(&gray_selector).map(text_of);
        let authors = gray.next().unwrap_or_default();
        let venue = gray.next().unwrap_or_default();

        let year = row
            .select(&year_selector)
            .next()
            .map(text_of)
            .filter(|y| !y.is_empty());
        let num_citations = row
            .select(&cites_selector)
            .next()
            .and_then(|a| parse_count(&text_of(a)));

        stubs.push(PublicationStub {
            author_pub_id,
            title: text_of(link),
            authors,
            venue,
            year,
            num_citations,
        });
    }

    Ok(stubs)
}

/// Parse a "view citation" page into a source record.
pub fn parse_citation_page(html: &str) -> Result<SourceRecord> {
    let document = Html::parse_document(html);

    let title_selector = selector("#gsc_oci_title")?;
    let title_link_selector = selector("a.gsc_oci_title_link")?;
    let eprint_selector = selector("#gsc_oci_title_gg a")?;
    let row_selector = selector("#gsc_oci_table div.gs_scl")?;
    let field_selector = selector("div.gsc_oci_field")?;
    let value_selector = selector("div.gsc_oci_value")?;

    let year_regex = Regex::new(r"\b(1[89]|20)\d{2}\b").map_err(|e| PubsyncError::Parse(e.to_string()))?;
    let cite_regex = Regex::new(r"Cited by\s*(\d+)").map_err(|e| PubsyncError::Parse(e.to_string()))?;

    let title_elem = document
        .select(&title_selector)
        .next()
        .ok_or_parse("citation page has no title")?;

    let mut record = SourceRecord::default();
    record.bib.insert("title".to_string(), text_of(title_elem));
    record.pub_url = document
        .select(&title_link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);
    record.eprint_url = document
        .select(&eprint_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    for row in document.select(&row_selector) {
        let (Some(field), Some(value)) = (
            row.select(&field_selector).next(),
            row.select(&value_selector).next(),
        ) else {
            continue;
        };
        let label = text_of(field).to_lowercase();
        let value_text = text_of(value);

        match label.as_str() {
            "authors" | "inventors" => {
                let joined = value_text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" and ");
                record.bib.insert("author".to_string(), joined);
            }
            "publication date" => {
                if let Some(year) = year_regex.find(&value_text) {
                    record.bib.insert("pub_year".to_string(), year.as_str().to_string());
                }
            }
            "total citations" => {
                record.num_citations = cite_regex
                    .captures(&value_text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| parse_count(m.as_str()));
            }
            other => {
                let key = match other {
                    "journal" => "journal",
                    "conference" => "conference",
                    "book" => "booktitle",
                    "source" => "venue",
                    "volume" => "volume",
                    "issue" => "number",
                    "pages" => "pages",
                    "publisher" => "publisher",
                    "description" => "abstract",
                    _ => continue,
                };
                record.bib.insert(key.to_string(), value_text);
            }
        }
    }

    Ok(record)
}
