use crate::model::TitleUrlPair;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static DATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2}").expect("valid regex"));
static TIME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}").expect("valid regex"));

const URL_SCHEMES: [&str; 2] = ["https://", "http://"];

pub fn is_url(line: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| line.starts_with(scheme))
}

/// Split fragments into trimmed, non-empty lines.
pub fn fragment_lines(fragments: &[String]) -> Vec<String> {
    fragments
        .iter()
        .flat_map(|fragment| fragment.split(['\n', '\r']))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// What a single line is, as far as pairing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// A running footer label or a "page N" marker
    PageMarker,
    /// A print date or time stamp
    Timestamp,
    Url,
    Text,
}

/// Rebuilds (title, link) pairs from the text lines of a printed list of
/// bookmarks.
///
/// A title is the last plain line before a link. Links that wrapped onto
/// several lines are glued back together.
#[derive(Debug, Clone)]
pub struct Pairer {
    footer_labels: Vec<String>,
}

impl Default for Pairer {
    fn default() -> Self {
        Self::new(vec!["recipes".to_string(), "recipies".to_string()])
    }
}

impl Pairer {
    pub fn new(footer_labels: Vec<String>) -> Self {
        Self {
            footer_labels: footer_labels
                .into_iter()
                .map(|label| label.to_lowercase())
                .collect(),
        }
    }

    fn classify(&self, line: &str) -> LineKind {
        let lower = line.to_lowercase();
        if self.footer_labels.contains(&lower) || lower.starts_with("page ") {
            LineKind::PageMarker
        } else if DATE_LINE.is_match(line) || TIME_LINE.is_match(line) {
            LineKind::Timestamp
        } else if is_url(line) {
            LineKind::Url
        } else {
            LineKind::Text
        }
    }

    /// Whether `lines[i]` continues a wrapped link: no whitespace, nothing
    /// that would be recognized as a marker or a new link, and not directly
    /// followed by a link (then it is that link's title).
    fn continues_url(&self, lines: &[String], i: usize) -> bool {
        let line = lines[i].as_str();
        !line.chars().any(char::is_whitespace)
            && self.classify(line) == LineKind::Text
            && !lines.get(i + 1).is_some_and(|next| is_url(next))
    }

    pub fn pair(&self, lines: &[String]) -> Vec<TitleUrlPair> {
        let mut pairs = Vec::new();
        let mut title: Option<&str> = None;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].as_str();
            match self.classify(line) {
                LineKind::PageMarker => {
                    title = None;
                    i += 1;
                }
                LineKind::Timestamp => i += 1,
                LineKind::Text => {
                    title = Some(line);
                    i += 1;
                }
                LineKind::Url => {
                    let mut url = line.to_string();
                    i += 1;
                    while i < lines.len() && self.continues_url(lines, i) {
                        url.push_str(&lines[i]);
                        i += 1;
                    }

                    match title.take() {
                        Some(title) => pairs.push(TitleUrlPair::new(title, url)),
                        None => debug!("Dropping link without a title: {}", url),
                    }
                }
            }
        }

        pairs
    }
}
