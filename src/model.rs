//! Canonical record types.
//!
//! Optional fields are `Option<T>` and skipped when serializing, so absent values never
//! show up in the persisted files as empty strings or nulls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One discovered work, in its canonical (persisted) form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    #[serde(alias = "pub_year")]
    pub year: i32,
    /// Raw author names as the source returned them, one entry per person
    #[serde(alias = "author", default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cites: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,
}

impl Publication {
    /// Citation count, zero when the source did not report one.
    pub fn cites(&self) -> u32 {
        self.cites.unwrap_or(0)
    }

    /// Volume, falling back to the issue number.
    pub fn volume_or_number(&self) -> Option<&str> {
        self.volume.as_deref().or(self.number.as_deref())
    }
}

/// One author of a curated conference record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConferenceAuthor {
    #[serde(default)]
    pub first: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,
    #[serde(default)]
    pub last: String,
}

/// A manually curated talk or poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    /// Year of the event
    pub date: i32,
    pub authors: Vec<ConferenceAuthor>,
    pub title: String,
    pub venue: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_link: Option<String>,
}

/// A source-code repository used for matching publications to code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Repository {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Run-level metadata written alongside each persisted record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scholar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_user: Option<String>,
    pub note: String,
}

/// Persisted publication file: `[metadata]` plus `[[publication]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationFile {
    pub metadata: Metadata,
    #[serde(default)]
    pub publication: Vec<Publication>,
}

/// Percentage share of one language in a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub lang: String,
    pub percent: f64,
}

/// Language breakdown for a software entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Languages {
    pub bytes: BTreeMap<String, u64>,
    pub ordered: Vec<LanguageShare>,
}

/// One enriched entry in the software catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareEntry {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Languages>,
}

/// Hand-maintained list of repository URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareList {
    #[serde(default)]
    pub software: Vec<String>,
}

/// Enriched software catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareFile {
    pub metadata: Metadata,
    #[serde(default)]
    pub software: Vec<SoftwareEntry>,
}
