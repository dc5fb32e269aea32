use log::debug;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Only this many characters of a page are inspected.
pub const SNIPPET_LIMIT: usize = 200_000;

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("valid selector"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel]").expect("valid selector"));

const IMAGE_LINK_RELS: [&str; 2] = ["image_src", "thumbnail"];

/// A `<meta>` tag identified by one of its attributes, e.g. `property="og:image"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaCandidate {
    pub attribute: &'static str,
    pub value: &'static str,
}

impl MetaCandidate {
    pub const fn property(value: &'static str) -> Self {
        Self {
            attribute: "property",
            value,
        }
    }

    pub const fn name(value: &'static str) -> Self {
        Self {
            attribute: "name",
            value,
        }
    }

    pub const fn itemprop(value: &'static str) -> Self {
        Self {
            attribute: "itemprop",
            value,
        }
    }
}

pub const DESCRIPTION_CANDIDATES: &[MetaCandidate] = &[MetaCandidate::property("og:description")];

pub const CANONICAL_URL_CANDIDATES: &[MetaCandidate] = &[MetaCandidate::property("og:url")];

/// Image tags consulted when harvesting a recipe page.
pub const RECIPE_IMAGE_CANDIDATES: &[MetaCandidate] = &[
    MetaCandidate::property("og:image"),
    MetaCandidate::property("og:image:secure_url"),
];

/// Image tags consulted, in order, when looking for a page preview image.
pub const PREVIEW_IMAGE_CANDIDATES: &[MetaCandidate] = &[
    MetaCandidate::property("og:image:secure_url"),
    MetaCandidate::property("og:image:url"),
    MetaCandidate::property("og:image"),
    MetaCandidate::name("og:image"),
    MetaCandidate::property("twitter:image"),
    MetaCandidate::name("twitter:image"),
    MetaCandidate::property("twitter:image:src"),
    MetaCandidate::name("twitter:image:src"),
    MetaCandidate::itemprop("image"),
    MetaCandidate::name("thumbnail"),
];

/// The head metadata of a fetched page.
///
/// Lookups return `None` when nothing matches; pages without metadata are
/// common and not an error.
pub struct MetaDocument {
    document: Html,
    base_url: String,
}

impl MetaDocument {
    pub fn parse(html: &str, base_url: impl Into<String>) -> Self {
        Self {
            document: Html::parse_document(snippet(html)),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Content of the first candidate, in priority order, that is present and non-empty.
    pub fn meta_content(&self, candidates: &[MetaCandidate]) -> Option<String> {
        candidates.iter().find_map(|candidate| {
            let content = self.first_meta(candidate)?;
            debug!("Matched meta {}={}", candidate.attribute, candidate.value);
            Some(content)
        })
    }

    /// Like [`meta_content`](Self::meta_content), resolved against the base URL.
    pub fn meta_url(&self, candidates: &[MetaCandidate]) -> Option<String> {
        self.meta_content(candidates)
            .map(|reference| resolve_reference(&self.base_url, &reference))
    }

    /// Image URL from the candidates, falling back to `<link rel="image_src">`
    /// or `<link rel="thumbnail">`.
    pub fn image_url(&self, candidates: &[MetaCandidate]) -> Option<String> {
        self.meta_url(candidates).or_else(|| self.link_image())
    }

    fn first_meta(&self, candidate: &MetaCandidate) -> Option<String> {
        let element = self.document.select(&META_SELECTOR).find(|el| {
            el.value()
                .attr(candidate.attribute)
                .is_some_and(|value| value.trim().eq_ignore_ascii_case(candidate.value))
        })?;

        let content = element.value().attr("content")?.trim();
        (!content.is_empty()).then(|| content.to_string())
    }

    fn link_image(&self) -> Option<String> {
        let element = self.document.select(&LINK_SELECTOR).find(|el| {
            el.value().attr("rel").is_some_and(|rel| {
                IMAGE_LINK_RELS
                    .iter()
                    .any(|wanted| rel.trim().eq_ignore_ascii_case(wanted))
            })
        })?;

        let href = element.value().attr("href")?.trim();
        (!href.is_empty()).then(|| resolve_reference(&self.base_url, href))
    }
}

/// Resolve a possibly relative reference against a base URL.
///
/// Absolute references are returned unchanged.
pub fn resolve_reference(base_url: &str, reference: &str) -> String {
    if Url::parse(reference).is_ok() {
        return reference.to_string();
    }

    Url::parse(base_url)
        .and_then(|base| base.join(reference))
        .map(String::from)
        .unwrap_or_else(|_| reference.to_string())
}

fn snippet(html: &str) -> &str {
    match html.char_indices().nth(SNIPPET_LIMIT) {
        Some((idx, _)) => &html[..idx],
        None => html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str) -> String {
        format!("<!DOCTYPE html><html><head>{head}</head><body><p>Hello</p></body></html>")
    }

    #[test]
    fn test_priority_beats_document_order() {
        let html = page(
            r#"<meta name="twitter:image" content="https://cdn.example/twitter.jpg">
               <meta property="og:image:secure_url" content="https://cdn.example/og.jpg">"#,
        );
        let doc = MetaDocument::parse(&html, "https://example.com/recipe");

        assert_eq!(
            doc.image_url(PREVIEW_IMAGE_CANDIDATES).as_deref(),
            Some("https://cdn.example/og.jpg")
        );
    }

    #[test]
    fn test_attribute_matching_ignores_case_and_quotes() {
        let html = page(r#"<META PROPERTY='OG:Description' CONTENT='Hearty stew'>"#);
        let doc = MetaDocument::parse(&html, "https://example.com/");

        assert_eq!(
            doc.meta_content(DESCRIPTION_CANDIDATES).as_deref(),
            Some("Hearty stew")
        );
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = page(
            r#"<meta property="og:description" content="Mac &amp; cheese &#8211; 2 cups">"#,
        );
        let doc = MetaDocument::parse(&html, "https://example.com/");

        assert_eq!(
            doc.meta_content(DESCRIPTION_CANDIDATES).as_deref(),
            Some("Mac & cheese \u{2013} 2 cups")
        );
    }

    #[test]
    fn test_relative_reference_is_resolved() {
        let html = page(r#"<meta property="og:image" content="/img/soup.png">"#);
        let doc = MetaDocument::parse(&html, "https://example.com/recipes/soup");

        assert_eq!(
            doc.image_url(RECIPE_IMAGE_CANDIDATES).as_deref(),
            Some("https://example.com/img/soup.png")
        );
    }

    #[test]
    fn test_empty_content_falls_through_to_next_candidate() {
        let html = page(
            r#"<meta property="og:image" content="  ">
               <meta property="og:image:secure_url" content="https://cdn.example/b.jpg">"#,
        );
        let doc = MetaDocument::parse(&html, "https://example.com/");

        assert_eq!(
            doc.image_url(RECIPE_IMAGE_CANDIDATES).as_deref(),
            Some("https://cdn.example/b.jpg")
        );
    }

    #[test]
    fn test_link_fallback() {
        let html = page(r#"<link rel="image_src" href="thumb.jpg">"#);
        let doc = MetaDocument::parse(&html, "https://example.com/recipes/");

        assert_eq!(
            doc.image_url(RECIPE_IMAGE_CANDIDATES).as_deref(),
            Some("https://example.com/recipes/thumb.jpg")
        );
        assert!(doc.meta_url(RECIPE_IMAGE_CANDIDATES).is_none());
    }

    #[test]
    fn test_missing_tags_return_none() {
        let doc = MetaDocument::parse(&page("<title>Nothing</title>"), "https://example.com/");
        assert!(doc.meta_content(DESCRIPTION_CANDIDATES).is_none());
        assert!(doc.image_url(PREVIEW_IMAGE_CANDIDATES).is_none());
    }

    #[test]
    fn test_tags_past_the_scan_limit_are_ignored() {
        let padding = "a".repeat(SNIPPET_LIMIT);
        let html = format!(
            "<html><body><p>{padding}</p><meta property=\"og:description\" content=\"late\"></body></html>"
        );
        let doc = MetaDocument::parse(&html, "https://example.com/");
        assert!(doc.meta_content(DESCRIPTION_CANDIDATES).is_none());
    }

    #[test]
    fn test_absolute_reference_passes_through_unchanged() {
        assert_eq!(
            resolve_reference("https://example.com/a/", "https://cdn.example/x.jpg?w=1"),
            "https://cdn.example/x.jpg?w=1"
        );
        assert_eq!(
            resolve_reference("not a url", "img/x.jpg"),
            "img/x.jpg"
        );
    }
}
