//! Publication → repository matching.
//!
//! A repository matches when its description contains the whole normalized title.
//! Partial word overlap never matches.

use crate::model::Repository;

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL of the first repository whose description contains `title`.
pub fn match_repository<'a>(title: &str, repositories: &'a [Repository]) -> Option<&'a str> {
    let needle = normalize_text(title);
    if needle.is_empty() || repositories.is_empty() {
        return None;
    }

    repositories
        .iter()
        .find(|repo| {
            repo.description
                .as_deref()
                .map(|d| normalize_text(d).contains(&needle))
                .unwrap_or(false)
        })
        .map(|repo| repo.url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(url: &str, description: Option<&str>) -> Repository {
        Repository {
            url: url.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Deep-Learning:  for X! "), "deeplearning for x");
        assert_eq!(normalize_text("..."), "");
    }

    #[test]
    fn test_full_title_match() {
        let repos = vec![repo("https://github.com/a/x", Some("a tool for deep learning for x analysis"))];
        assert_eq!(
            match_repository("Deep Learning for X", &repos),
            Some("https://github.com/a/x")
        );
    }

    #[test]
    fn test_partial_overlap_is_not_a_match() {
        let repos = vec![repo("https://github.com/a/x", Some("deep learning tools"))];
        assert_eq!(match_repository("Deep Learning for X", &repos), None);
    }

    #[test]
    fn test_first_matching_repository_wins() {
        let repos = vec![
            repo("https://github.com/a/none", None),
            repo("https://github.com/a/first", Some("Code for: Widget Analysis.")),
            repo("https://github.com/a/second", Some("widget analysis, again")),
        ];
        assert_eq!(
            match_repository("Widget Analysis", &repos),
            Some("https://github.com/a/first")
        );
    }

    #[test]
    fn test_empty_inputs() {
        let repos = vec![repo("https://github.com/a/x", Some("anything"))];
        assert_eq!(match_repository("", &repos), None);
        assert_eq!(match_repository("?!", &repos), None);
        assert_eq!(match_repository("Widget Analysis", &[]), None);
    }
}
