//! End-to-end pipeline tests against an in-memory publication source.

use async_trait::async_trait;
use pubsync::citation::{render_publications_html, render_publications_markdown};
use pubsync::config::{FetchConfig, RenderConfig};
use pubsync::fetch::{fetch_publications, PLACEHOLDER_TITLE};
use pubsync::model::{PublicationFile, Repository};
use pubsync::scholar::{PublicationSource, PublicationStub, SourceRecord};
use pubsync::{store, PubsyncError, Result};
use std::collections::BTreeMap;

struct MemorySource {
    records: Vec<SourceRecord>,
}

#[async_trait]
impl PublicationSource for MemorySource {
    async fn list_stubs(&self, _author_id: &str) -> Result<Vec<PublicationStub>> {
        Ok((0..self.records.len())
            .map(|i| PublicationStub {
                author_pub_id: i.to_string(),
                ..PublicationStub::default()
            })
            .collect())
    }

    async fn fill(&self, stub: &PublicationStub) -> Result<SourceRecord> {
        let index: usize = stub
            .author_pub_id
            .parse()
            .map_err(|_| PubsyncError::Parse(stub.author_pub_id.clone()))?;
        self.records
            .get(index)
            .cloned()
            .ok_or_else(|| PubsyncError::NotFound(stub.author_pub_id.clone()))
    }

    async fn refresh_proxy(&self) {}

    fn profile_url(&self, author_id: &str) -> String {
        format!("https://scholar.google.com/citations?hl=en&user={}", author_id)
    }
}

struct DownSource;

#[async_trait]
impl PublicationSource for DownSource {
    async fn list_stubs(&self, _author_id: &str) -> Result<Vec<PublicationStub>> {
        Err(PubsyncError::Captcha)
    }

    async fn fill(&self, _stub: &PublicationStub) -> Result<SourceRecord> {
        Err(PubsyncError::Captcha)
    }

    async fn refresh_proxy(&self) {}

    fn profile_url(&self, author_id: &str) -> String {
        format!("https://scholar.google.com/citations?hl=en&user={}", author_id)
    }
}

fn record(fields: &[(&str, &str)]) -> SourceRecord {
    SourceRecord {
        bib: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        ..SourceRecord::default()
    }
}

#[tokio::test]
async fn widget_analysis_renders_in_both_formats() -> Result<()> {
    let source = MemorySource {
        records: vec![
            record(&[
                ("title", "Widget Analysis"),
                ("pub_year", "2023"),
                ("author", "Skaza, Jonathan, and Doe, Jane M"),
                ("journal", "Journal of Widgets"),
            ]),
            record(&[
                ("title", "Earlier Work"),
                ("year", "2021"),
                ("author", "Jonathan S Skaza and Ann Roe"),
            ]),
        ],
    };
    let repositories = vec![Repository {
        url: "https://github.com/jskaza/widgets".to_string(),
        description: Some("Replication code for \"Widget Analysis\"".to_string()),
    }];

    let outcome = fetch_publications(&source, &repositories, &FetchConfig::immediate("dAAMOqgAAAAJ")).await;
    assert!(!outcome.degraded);
    assert_eq!(outcome.publications.len(), 2);
    assert_eq!(
        outcome.publications[0].github_repo.as_deref(),
        Some("https://github.com/jskaza/widgets")
    );

    let config = RenderConfig::default();
    let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap_or_default();
    let html = render_publications_html(&outcome.publications, &config, date);
    assert!(html.contains("<b>J Skaza</b>, JM Doe (2023)"));
    assert!(html.contains("<b>JS Skaza</b>, A Roe (2021)"));
    assert!(html.find("<h3>2023</h3>") < html.find("<h3>2021</h3>"));

    let markdown = render_publications_markdown(&outcome.publications, &config);
    assert!(markdown.starts_with("**J Skaza**, JM Doe (2023). Widget Analysis. *Journal of Widgets*\n\n"));
    assert!(markdown.ends_with("Earlier Work.\n"));
    assert!(!markdown.ends_with("\n\n"));
    Ok(())
}

#[tokio::test]
async fn stored_set_renders_identically_after_reload() -> Result<()> {
    let source = MemorySource {
        records: vec![record(&[
            ("title", "Widget Analysis"),
            ("pub_year", "2023"),
            ("author", "Skaza, Jonathan, and Doe, Jane M"),
        ])],
    };
    let outcome = fetch_publications(&source, &[], &FetchConfig::immediate("dAAMOqgAAAAJ")).await;

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("publications.toml");
    let file = PublicationFile {
        metadata: store::publication_metadata("dAAMOqgAAAAJ", None),
        publication: outcome.publications.clone(),
    };
    store::save_publications(&path, &file)?;
    let reloaded = store::load_publications(&path)?;

    let config = RenderConfig::default();
    assert_eq!(
        render_publications_markdown(&reloaded.publication, &config),
        render_publications_markdown(&outcome.publications, &config)
    );
    assert_eq!(reloaded.metadata.scholar_id.as_deref(), Some("dAAMOqgAAAAJ"));
    Ok(())
}

#[tokio::test]
async fn unreachable_source_still_renders_a_placeholder() {
    let config = FetchConfig {
        author_name: "Skaza, Jonathan".to_string(),
        ..FetchConfig::immediate("dAAMOqgAAAAJ")
    };
    let outcome = fetch_publications(&DownSource, &[], &config).await;

    assert!(outcome.degraded);
    assert_eq!(outcome.publications.len(), 1);
    assert_eq!(outcome.publications[0].title, PLACEHOLDER_TITLE);

    let markdown = render_publications_markdown(&outcome.publications, &RenderConfig::default());
    assert!(markdown.starts_with("**J Skaza** ("));
    assert!(markdown.contains("Publications temporarily unavailable."));
}
