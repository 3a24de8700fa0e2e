//! Reading and writing the structured data files.
//!
//! Publication and software catalogs are TOML with a `[metadata]` envelope; curated
//! conferences are a YAML list. Writes go through a temporary sibling file and a
//! rename so readers never observe a half-written file.

use crate::error::Result;
use crate::fetch::PLACEHOLDER_TITLE;
use crate::model::{Conference, Metadata, PublicationFile, Publication, SoftwareFile, SoftwareList};
use std::path::Path;
use tracing::info;

/// Source label recorded in publication metadata
pub const SCHOLAR_SOURCE: &str = "Google Scholar";

/// Current local time in ISO-8601
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Metadata envelope for a freshly fetched publication set.
pub fn publication_metadata(scholar_id: &str, github_user: Option<&str>) -> Metadata {
    Metadata {
        last_updated: timestamp(),
        source: Some(SCHOLAR_SOURCE.to_string()),
        scholar_id: Some(scholar_id.to_string()),
        github_user: github_user.map(str::to_string),
        note: "Publications automatically fetched from Google Scholar profile".to_string(),
    }
}

/// Metadata envelope for the software catalog.
pub fn software_metadata() -> Metadata {
    Metadata {
        last_updated: timestamp(),
        source: Some("GitHub".to_string()),
        scholar_id: None,
        github_user: None,
        note: "Software data automatically fetched from GitHub repositories".to_string(),
    }
}

/// Write `contents` to `path`, replacing it in one step.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Write the publication file atomically.
pub fn save_publications(path: &Path, file: &PublicationFile) -> Result<()> {
    let content = toml::to_string(file)?;
    write_atomic(path, &content)?;
    info!(count = file.publication.len(), path = %path.display(), "Wrote publications");
    Ok(())
}

/// Read a stored publication file; legacy `pub_year`/`author` keys are accepted.
pub fn load_publications(path: &Path) -> Result<PublicationFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// True when the file holds at least one real (non-placeholder) publication.
pub fn has_real_publications(publications: &[Publication]) -> bool {
    publications.iter().any(|p| p.title != PLACEHOLDER_TITLE)
}

/// Read the hand-maintained conference list; an empty file is an empty list.
pub fn load_conferences(path: &Path) -> Result<Vec<Conference>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Read the list of repository URLs to catalog.
pub fn load_software_list(path: &Path) -> Result<SoftwareList> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write the enriched software catalog atomically.
pub fn save_software(path: &Path, file: &SoftwareFile) -> Result<()> {
    let content = toml::to_string(file)?;
    write_atomic(path, &content)?;
    info!(count = file.software.len(), path = %path.display(), "Wrote software catalog");
    Ok(())
}
