//! Citation formatting and rendering.
//!
//! Author names are abbreviated to initials + surname ("J Skaza", "JM Doe") and the
//! site owner's name is emphasized. Records render as an HTML fragment grouped under
//! year headings, or as flat Markdown paragraphs for the CV.

use crate::config::RenderConfig;
use crate::model::{Conference, ConferenceAuthor, Publication};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Target markup for emphasis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Html,
    Markdown,
}

impl Markup {
    /// Wrap `text` in bold markup
    pub fn bold(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<b>{}</b>", text),
            Markup::Markdown => format!("**{}**", text),
        }
    }

    /// Wrap `text` in italic markup
    pub fn italic(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<em>{}</em>", text),
            Markup::Markdown => format!("*{}*", text),
        }
    }
}

/// Abbreviate a raw name to `<initials> <Last>`.
///
/// "Last, First Middle" is split on the first comma; anything without a comma is read
/// as "First Middle Last". Single-token names come back unchanged.
pub fn abbreviate(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let (given, last) = match raw.split_once(',') {
        Some((last, given)) => (given.trim(), last.trim()),
        None => match raw.rsplit_once(char::is_whitespace) {
            Some((given, last)) => (given.trim(), last.trim()),
            None => return raw.to_string(),
        },
    };

    let initials: String = given
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .collect();

    format!("{} {}", initials, last).trim().to_string()
}

/// Abbreviate a structured name.
pub fn abbreviate_parts(first: &str, middle: Option<&str>, last: &str) -> String {
    let mut initials: String = first.trim().chars().next().into_iter().collect();
    if let Some(m) = middle.and_then(|m| m.trim().chars().next()) {
        initials.push(m);
    }
    format!("{} {}", initials, last.trim()).trim().to_string()
}

/// Wrap `abbreviated` in bold when it exactly matches a highlight literal.
pub fn emphasize(abbreviated: String, markup: Markup, highlight: &[String]) -> String {
    if highlight.iter().any(|h| *h == abbreviated) {
        markup.bold(&abbreviated)
    } else {
        abbreviated
    }
}

/// Abbreviate and, for the site owner, emphasize one raw name.
pub fn format_name(raw: &str, markup: Markup, highlight: &[String]) -> String {
    emphasize(abbreviate(raw), markup, highlight)
}

/// Format an author list joined with ", ".
pub fn format_authors(names: &[String], markup: Markup, highlight: &[String]) -> String {
    names
        .iter()
        .map(|name| format_name(name, markup, highlight))
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format structured conference authors joined with ", ".
pub fn format_conference_authors(
    authors: &[ConferenceAuthor],
    markup: Markup,
    highlight: &[String],
) -> String {
    authors
        .iter()
        .map(|a| emphasize(abbreviate_parts(&a.first, a.middle.as_deref(), &a.last), markup, highlight))
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Group items by year, newest year first, keeping input order within a year.
pub fn group_by_year<T>(items: &[T], year: impl Fn(&T) -> i32) -> Vec<(i32, Vec<&T>)> {
    let mut groups: BTreeMap<i32, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(year(item)).or_default().push(item);
    }
    groups.into_iter().rev().collect()
}

/// Items sorted by year descending; ties keep input order.
pub fn sort_by_year_desc<T>(items: &[T], year: impl Fn(&T) -> i32) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(year(item)));
    sorted
}

/// One rendered citation, independent of record type.
struct Row<'a> {
    authors: String,
    year: i32,
    title: &'a str,
    link: Option<&'a str>,
    venue: Option<&'a str>,
    detail: Option<&'a str>,
}

impl Row<'_> {
    /// `AUTHORS (YEAR)`, or just `(YEAR)` with no authors
    fn lead(&self) -> String {
        if self.authors.is_empty() {
            format!("({})", self.year)
        } else {
            format!("{} ({})", self.authors, self.year)
        }
    }

    fn html(&self) -> String {
        let mut citation = self.lead();
        match self.link {
            Some(link) => citation.push_str(&format!(" <a href=\"{}\">{}</a>", link, self.title)),
            None => citation.push_str(&format!(" {}", self.title)),
        }
        if let Some(venue) = self.venue {
            citation.push_str(&format!(", {}", Markup::Html.italic(venue)));
            if let Some(detail) = self.detail {
                citation.push_str(&format!(", {}", detail));
            }
        }
        format!("<tr><td>{}</td></tr>", citation)
    }

    fn markdown(&self) -> String {
        let mut citation = format!("{}. {}.", self.lead(), self.title);
        if let Some(venue) = self.venue {
            citation.push_str(&format!(" {}", Markup::Markdown.italic(venue)));
            if let Some(detail) = self.detail {
                citation.push_str(&format!(", {}", detail));
            }
        }
        citation
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn publication_row<'a>(publication: &'a Publication, markup: Markup, config: &RenderConfig) -> Row<'a> {
    Row {
        authors: format_authors(&publication.authors, markup, &config.highlight),
        year: publication.year,
        title: &publication.title,
        link: non_empty(Some(publication.url.as_str())),
        venue: non_empty(publication.journal.as_deref()),
        detail: non_empty(publication.volume_or_number()),
    }
}

fn conference_row<'a>(conference: &'a Conference, markup: Markup, config: &RenderConfig) -> Row<'a> {
    Row {
        authors: format_conference_authors(&conference.authors, markup, &config.highlight),
        year: conference.date,
        title: &conference.title,
        link: non_empty(conference.poster_link.as_deref()),
        venue: non_empty(Some(conference.venue.as_str())),
        detail: non_empty(Some(conference.location.as_str())),
    }
}

fn render_html_groups(groups: Vec<(i32, Vec<Row<'_>>)>, table_class: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for (year, rows) in groups {
        parts.push(format!("<h3>{}</h3>", year));
        parts.push(format!("<table class=\"{}\"><tbody>", table_class));
        parts.extend(rows.iter().map(Row::html));
        parts.push("</tbody></table>".to_string());
    }
    parts
}

fn render_markdown_rows(rows: Vec<Row<'_>>) -> String {
    let paragraphs: Vec<String> = rows.iter().map(Row::markdown).collect();
    format!("{}\n", paragraphs.join("\n\n"))
}

/// HTML fragment for the publications page, ending with a "last updated" note.
pub fn render_publications_html(
    publications: &[Publication],
    config: &RenderConfig,
    generated_on: NaiveDate,
) -> String {
    let groups: Vec<(i32, Vec<Row<'_>>)> = group_by_year(publications, |p| p.year)
        .into_iter()
        .map(|(year, pubs)| {
            let rows: Vec<Row<'_>> = pubs
                .into_iter()
                .map(|p| publication_row(p, Markup::Html, config))
                .collect();
            (year, rows)
        })
        .collect();

    let mut parts = render_html_groups(groups, "publication-table");
    parts.push(format!(
        "<p style=\"text-align: right; margin-top: 40px;\"><small>Last updated <i>{}</i> &ndash; Pulled automatically from my <a href=\"{}\">Google Scholar profile</a>.</small></p>",
        generated_on.format("%B %d, %Y"),
        config.profile_url
    ));
    parts.join("\n")
}

/// Markdown fragment for the CV publications section.
pub fn render_publications_markdown(publications: &[Publication], config: &RenderConfig) -> String {
    let rows: Vec<Row<'_>> = sort_by_year_desc(publications, |p| p.year)
        .into_iter()
        .map(|p| publication_row(p, Markup::Markdown, config))
        .collect();
    render_markdown_rows(rows)
}

/// HTML fragment for the conferences page.
pub fn render_conferences_html(conferences: &[Conference], config: &RenderConfig) -> String {
    let groups: Vec<(i32, Vec<Row<'_>>)> = group_by_year(conferences, |c| c.date)
        .into_iter()
        .map(|(year, confs)| {
            let rows: Vec<Row<'_>> = confs
                .into_iter()
                .map(|c| conference_row(c, Markup::Html, config))
                .collect();
            (year, rows)
        })
        .collect();

    render_html_groups(groups, "conference-table").join("\n")
}

/// Markdown fragment for the CV conferences section.
pub fn render_conferences_markdown(conferences: &[Conference], config: &RenderConfig) -> String {
    let rows: Vec<Row<'_>> = sort_by_year_desc(conferences, |c| c.date)
        .into_iter()
        .map(|c| conference_row(c, Markup::Markdown, config))
        .collect();
    render_markdown_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight() -> Vec<String> {
        RenderConfig::default().highlight
    }

    fn publication(title: &str, year: i32, authors: &[&str]) -> Publication {
        Publication {
            title: title.to_string(),
            year,
            authors: authors.iter().map(|a| a.to_string()).collect(),
            journal: None,
            volume: None,
            number: None,
            abstract_text: None,
            url: format!("https://example.org/{}", year),
            cites: None,
            github_repo: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap_or_default()
    }

    #[test]
    fn test_abbreviate_both_orders() {
        assert_eq!(abbreviate("Skaza, Jonathan"), "J Skaza");
        assert_eq!(abbreviate("Jonathan Skaza"), "J Skaza");
        assert_eq!(abbreviate("Doe, Jane M"), "JM Doe");
        assert_eq!(abbreviate("Jane M Doe"), "JM Doe");
        assert_eq!(abbreviate("Jane Mary Doe"), "JM Doe");
        assert_eq!(abbreviate("  Jonathan   Skaza "), "J Skaza");
    }

    #[test]
    fn test_abbreviate_degenerate_names() {
        assert_eq!(abbreviate(""), "");
        assert_eq!(abbreviate("Plato"), "Plato");
        assert_eq!(abbreviate("Skaza,"), "Skaza");
        assert_eq!(abbreviate("Élodie Durand"), "É Durand");
    }

    #[test]
    fn test_highlight_is_exact_and_case_sensitive() {
        let h = highlight();
        assert_eq!(format_name("Skaza, Jonathan", Markup::Html, &h), "<b>J Skaza</b>");
        assert_eq!(format_name("Jonathan S Skaza", Markup::Markdown, &h), "**JS Skaza**");
        assert_eq!(format_name("Jonathan Q Skaza", Markup::Html, &h), "JQ Skaza");
        assert_eq!(format_name("jonathan skaza", Markup::Html, &h), "j skaza");
        assert_eq!(format_name("Mark Skaza", Markup::Html, &h), "M Skaza");
    }

    #[test]
    fn test_authors_join_without_conjunction() {
        let names = vec!["Skaza, Jonathan".to_string(), "Doe, Jane M".to_string(), "Ann Roe".to_string()];
        assert_eq!(
            format_authors(&names, Markup::Html, &highlight()),
            "<b>J Skaza</b>, JM Doe, A Roe"
        );
    }

    #[test]
    fn test_conference_authors() {
        let authors = vec![
            ConferenceAuthor {
                first: "Jonathan".to_string(),
                middle: None,
                last: "Skaza".to_string(),
            },
            ConferenceAuthor {
                first: "Jane".to_string(),
                middle: Some("Marie".to_string()),
                last: "Doe".to_string(),
            },
        ];
        assert_eq!(
            format_conference_authors(&authors, Markup::Markdown, &highlight()),
            "**J Skaza**, JM Doe"
        );
    }

    #[test]
    fn test_group_by_year_descending_and_stable() {
        let pubs = vec![
            publication("a", 2021, &[]),
            publication("b", 2023, &[]),
            publication("c", 2021, &[]),
            publication("d", 2022, &[]),
        ];
        let groups = group_by_year(&pubs, |p| p.year);
        let years: Vec<i32> = groups.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, vec![2023, 2022, 2021]);
        let titles_2021: Vec<&str> = groups[2].1.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles_2021, vec!["a", "c"]);
    }

    #[test]
    fn test_html_headings_cover_every_record_once() {
        let pubs = vec![
            publication("a", 2019, &[]),
            publication("b", 2024, &[]),
            publication("c", 2019, &[]),
        ];
        let html = render_publications_html(&pubs, &RenderConfig::default(), date());
        let headings: Vec<&str> = html.lines().filter(|l| l.starts_with("<h3>")).collect();
        assert_eq!(headings, vec!["<h3>2024</h3>", "<h3>2019</h3>"]);
        assert_eq!(html.matches("<tr><td>").count(), pubs.len());
        let b = html.find(">b</a>").unwrap_or(usize::MAX);
        let a = html.find(">a</a>").unwrap_or(0);
        assert!(b < a);
    }

    #[test]
    fn test_publication_html_row() {
        let mut p = publication("Widget Analysis", 2023, &["Skaza, Jonathan", "Doe, Jane M"]);
        p.journal = Some("Journal of Widgets".to_string());
        p.volume = Some("4".to_string());
        let html = render_publications_html(&[p], &RenderConfig::default(), date());
        assert!(html.contains(
            "<tr><td><b>J Skaza</b>, JM Doe (2023) <a href=\"https://example.org/2023\">Widget Analysis</a>, <em>Journal of Widgets</em>, 4</td></tr>"
        ));
        assert!(html.contains("<table class=\"publication-table\"><tbody>"));
        assert!(html.ends_with("</small></p>"));
        assert!(html.contains("Last updated <i>October 19, 2026</i>"));
        assert!(html.contains("https://scholar.google.com/citations?hl=en&user=dAAMOqgAAAAJ"));
    }

    #[test]
    fn test_volume_without_journal_is_not_rendered() {
        let mut p = publication("T", 2023, &["J Skaza"]);
        p.volume = Some("4".to_string());
        let md = render_publications_markdown(&[p], &RenderConfig::default());
        assert_eq!(md, "**J Skaza** (2023). T.\n");
    }

    #[test]
    fn test_publication_markdown_sorted_flat() {
        let mut newer = publication("Newer", 2024, &["Jane Doe"]);
        newer.journal = Some("J".to_string());
        newer.number = Some("7".to_string());
        let pubs = vec![
            publication("Older", 2020, &["Skaza, Jonathan"]),
            newer,
            publication("Also Older", 2020, &["A Roe"]),
        ];
        let md = render_publications_markdown(&pubs, &RenderConfig::default());
        assert_eq!(
            md,
            "J Doe (2024). Newer. *J*, 7\n\n**J Skaza** (2020). Older.\n\nA Roe (2020). Also Older.\n"
        );
    }

    #[test]
    fn test_empty_markdown_is_single_newline() {
        assert_eq!(render_publications_markdown(&[], &RenderConfig::default()), "\n");
        assert_eq!(render_conferences_markdown(&[], &RenderConfig::default()), "\n");
    }

    #[test]
    fn test_conference_rendering() {
        let conferences = vec![
            Conference {
                date: 2022,
                authors: vec![ConferenceAuthor {
                    first: "Jonathan".to_string(),
                    middle: None,
                    last: "Skaza".to_string(),
                }],
                title: "Widgets at Scale".to_string(),
                venue: "WidgetConf".to_string(),
                location: "Boston, MA".to_string(),
                poster_link: Some("https://example.org/poster.pdf".to_string()),
            },
            Conference {
                date: 2023,
                authors: vec![],
                title: "Widgets Revisited".to_string(),
                venue: "WidgetConf".to_string(),
                location: "Denver, CO".to_string(),
                poster_link: None,
            },
        ];
        let config = RenderConfig::default();

        let html = render_conferences_html(&conferences, &config);
        assert!(html.starts_with("<h3>2023</h3>\n<table class=\"conference-table\"><tbody>"));
        assert!(html.contains(
            "<tr><td><b>J Skaza</b> (2022) <a href=\"https://example.org/poster.pdf\">Widgets at Scale</a>, <em>WidgetConf</em>, Boston, MA</td></tr>"
        ));
        assert!(html.contains("<tr><td>(2023) Widgets Revisited, <em>WidgetConf</em>, Denver, CO</td></tr>"));
        assert!(!html.contains("Last updated"));

        let md = render_conferences_markdown(&conferences, &config);
        assert_eq!(
            md,
            "(2023). Widgets Revisited. *WidgetConf*, Denver, CO\n\n**J Skaza** (2022). Widgets at Scale. *WidgetConf*, Boston, MA\n"
        );
    }
}
