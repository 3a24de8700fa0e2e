//! Source record → canonical [`Publication`].
//!
//! Only present, non-blank values are copied into the output; everything else stays
//! `None` and is omitted when persisted.

use crate::error::{PubsyncError, Result};
use crate::model::Publication;
use crate::scholar::{search_url, SourceRecord};
use chrono::Datelike;

/// Conjunction separating authors in source author strings
const AUTHOR_CONJUNCTION: &str = " and ";

/// Venue keys in priority order
const JOURNAL_KEYS: &[&str] = &["journal", "booktitle", "venue", "conference"];

/// Normalize a filled source record using the current year as the fallback year.
pub fn normalize(record: &SourceRecord) -> Result<Publication> {
    normalize_with_year(record, chrono::Local::now().year())
}

/// Normalize a filled source record; `fallback_year` is used when the record has none.
pub fn normalize_with_year(record: &SourceRecord, fallback_year: i32) -> Result<Publication> {
    let title = record
        .field("title")
        .ok_or_else(|| PubsyncError::Validation("record has no title".to_string()))?
        .to_string();

    let year = record
        .field("pub_year")
        .or_else(|| record.field("year"))
        .and_then(|y| y.parse::<i32>().ok())
        .unwrap_or(fallback_year);

    let authors = record.field("author").map(split_authors).unwrap_or_default();

    let journal = JOURNAL_KEYS
        .iter()
        .find_map(|key| record.field(key))
        .map(str::to_string);

    let url = present(record.pub_url.as_deref())
        .or_else(|| present(record.eprint_url.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| search_url(&title));

    Ok(Publication {
        year,
        authors,
        journal,
        volume: record.field("volume").map(str::to_string),
        number: record.field("number").map(str::to_string),
        abstract_text: record.field("abstract").map(str::to_string),
        url,
        cites: record.num_citations,
        github_repo: record.field("github_repo").map(str::to_string),
        title,
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split a source author string into individual names.
///
/// Splits on the " and " conjunction, then on commas. A single-word piece followed by
/// another piece is taken as a surname and re-joined with it, so "Skaza, Jonathan"
/// stays one name while "J Skaza, JM Doe" becomes two.
pub fn split_authors(raw: &str) -> Vec<String> {
    let mut names = Vec::new();

    for segment in raw.split(AUTHOR_CONJUNCTION) {
        let pieces: Vec<&str> = segment
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let mut i = 0;
        while i < pieces.len() {
            let piece = pieces[i];
            let is_surname = !piece.contains(char::is_whitespace);
            match pieces.get(i + 1) {
                Some(given) if is_surname => {
                    names.push(format!("{}, {}", piece, given));
                    i += 2;
                }
                _ => {
                    names.push(piece.to_string());
                    i += 1;
                }
            }
        }
    }

    names
}

impl From<&Publication> for SourceRecord {
    /// Source-shaped view of a canonical record; normalizing it gives the record back.
    fn from(publication: &Publication) -> Self {
        let mut record = SourceRecord {
            pub_url: Some(publication.url.clone()),
            num_citations: publication.cites,
            ..SourceRecord::default()
        };

        let bib = &mut record.bib;
        bib.insert("title".to_string(), publication.title.clone());
        bib.insert("pub_year".to_string(), publication.year.to_string());
        if !publication.authors.is_empty() {
            bib.insert("author".to_string(), publication.authors.join(AUTHOR_CONJUNCTION));
        }
        let optional = [
            ("journal", &publication.journal),
            ("volume", &publication.volume),
            ("number", &publication.number),
            ("abstract", &publication.abstract_text),
            ("github_repo", &publication.github_repo),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                bib.insert(key.to_string(), value.clone());
            }
        }

        record
    }
}
