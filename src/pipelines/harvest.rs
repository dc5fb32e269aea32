use crate::config::HarvestConfig;
use crate::model::{FailureReason, FailureRecord, RecipeDraft, TitleUrlPair};
use crate::text_to_recipe::{to_ascii, Classifier, Segmenter};
use crate::url_to_text::fetchers::{FetchedPage, Fetcher};
use crate::url_to_text::html::meta::{
    CANONICAL_URL_CANDIDATES, DESCRIPTION_CANDIDATES, RECIPE_IMAGE_CANDIDATES,
};
use crate::url_to_text::html::MetaDocument;
use log::{info, warn};
use url::Url;

pub const MISSING_INGREDIENTS_NOTE: &str = "Ingredients not detected automatically.";
pub const PREVIEW_LINES: usize = 4;
pub const PREVIEW_CHARS: usize = 280;

const INSTAGRAM_HOSTS: [&str; 2] = ["instagram.com", "instagr.am"];

/// Outcome of one harvest run.
///
/// Every input item ends up in exactly one of `recipes` or `failures`.
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub recipes: Vec<RecipeDraft>,
    pub failures: Vec<FailureRecord>,
    pub total_items: usize,
}

/// Turns (title, link) pairs into recipe records, one item at a time.
pub struct Harvester<F: Fetcher> {
    fetcher: F,
    segmenter: Segmenter,
    classifier: Classifier,
}

impl<F: Fetcher> Harvester<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            segmenter: Segmenter::default(),
            classifier: Classifier::default(),
        }
    }

    pub fn from_config(fetcher: F, config: &HarvestConfig) -> Self {
        let segmenter = Segmenter::default()
            .with_max_continuation(config.segmenter.max_continuation_chars);
        Self::new(fetcher).with_segmenter(segmenter)
    }

    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Harvest every pair in input order.
    ///
    /// Per-item problems are recorded as failures; nothing here aborts the run.
    pub async fn harvest(&self, pairs: &[TitleUrlPair]) -> HarvestReport {
        let mut report = HarvestReport {
            total_items: pairs.len(),
            ..Default::default()
        };

        for (index, pair) in pairs.iter().enumerate() {
            info!("[{}/{}] {}", index + 1, pairs.len(), pair.title);
            match self.harvest_item(pair).await {
                Ok(recipe) => report.recipes.push(recipe),
                Err(reason) => {
                    warn!("Skipping '{}' ({}): {}", pair.title, pair.url, reason);
                    report.failures.push(FailureRecord {
                        title: pair.title.clone(),
                        url: pair.url.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Harvested {} recipes, {} failures out of {} items",
            report.recipes.len(),
            report.failures.len(),
            report.total_items
        );
        report
    }

    /// Fetch one item's page and assemble its record.
    pub async fn harvest_item(&self, pair: &TitleUrlPair) -> Result<RecipeDraft, FailureReason> {
        let page = self.fetcher.fetch_text(&pair.url).await.map_err(|err| {
            warn!("Fetching {} failed: {}", pair.url, err);
            FailureReason::FetchFailed
        })?;

        self.assemble(pair, &page)
    }

    /// Build a record from an already fetched page.
    pub fn assemble(&self, pair: &TitleUrlPair, page: &FetchedPage) -> Result<RecipeDraft, FailureReason> {
        let document = MetaDocument::parse(&page.body, page.url.as_str());

        let description = document
            .meta_content(DESCRIPTION_CANDIDATES)
            .ok_or(FailureReason::NoDescription)?;
        let image_url = document
            .image_url(RECIPE_IMAGE_CANDIDATES)
            .ok_or(FailureReason::NoImage)?;
        let source_url = canonicalize_source_url(
            &document
                .meta_url(CANONICAL_URL_CANDIDATES)
                .unwrap_or_else(|| pair.url.clone()),
        );

        let segmented = self.segmenter.segment(&description);
        let classification = self.classifier.classify(&pair.title, &segmented.ingredients);

        let mut recipe = RecipeDraft {
            title: to_ascii(&pair.title),
            source_url: to_ascii(&source_url),
            image_url: to_ascii(&image_url),
            ingredients: ascii_all(&segmented.ingredients),
            steps: non_empty(ascii_all(&segmented.steps)),
            tags: non_empty(ascii_all(&classification.tags)),
            meal_types: non_empty(ascii_all(&classification.meal_types)),
            ..Default::default()
        };

        if recipe.is_degraded() {
            info!("No ingredients detected for '{}'", pair.title);
            recipe.notes = Some(MISSING_INGREDIENTS_NOTE.to_string());
            recipe.description_preview = Some(description_preview(&description));
        }

        Ok(recipe)
    }
}

/// The first few lines of a description, flattened onto one line.
/// `\r\n`, `\n` and a lone `\r` all end a line.
pub fn description_preview(description: &str) -> String {
    let head = description
        .replace("\r\n", "\n")
        .split(['\r', '\n'])
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join(" ");
    to_ascii(&head).chars().take(PREVIEW_CHARS).collect()
}

/// Normalize a source link.
///
/// Instagram post and reel links are rebuilt from their shortcode; any other
/// link loses its query string and fragment.
pub fn canonicalize_source_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    if url.host_str().is_some_and(is_instagram_host) {
        if let Some(canonical) = instagram_permalink(&url) {
            return canonical;
        }
    }

    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

fn is_instagram_host(host: &str) -> bool {
    INSTAGRAM_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

fn instagram_permalink(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    let kind = ["reel", "p"]
        .into_iter()
        .find(|kind| segments.contains(kind))?;
    let position = segments.iter().position(|s| *s == kind)?;
    let shortcode = segments.get(position + 1)?;

    Some(format!("https://www.instagram.com/{kind}/{shortcode}/"))
}

fn ascii_all(items: &[String]) -> Vec<String> {
    items.iter().map(|item| to_ascii(item)).collect()
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::url_to_text::fetchers::FetchedBytes;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages; any other URL answers 404.
    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl StubFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch_text(&self, url: &str) -> Result<FetchedPage, TransportError> {
            match self.pages.get(url) {
                Some(body) => Ok(FetchedPage {
                    url: url.to_string(),
                    body: body.clone(),
                }),
                None => Err(TransportError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }

        async fn fetch_bytes(
            &self,
            url: &str,
            _referer: Option<&str>,
        ) -> Result<FetchedBytes, TransportError> {
            Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn page(metas: &[(&str, &str)]) -> String {
        let tags: String = metas
            .iter()
            .map(|(property, content)| {
                format!(r#"<meta property="{property}" content="{content}">"#)
            })
            .collect();
        format!("<html><head>{tags}</head><body></body></html>")
    }

    fn pair(title: &str, url: &str) -> TitleUrlPair {
        TitleUrlPair::new(title, url)
    }

    #[tokio::test]
    async fn test_full_record() {
        let description = "Ingredients:&#10;- 2 cups flour&#10;- 1 egg&#10;Method&#10;1. Mix flour and egg&#10;2. Bake at 350";
        let fetcher = StubFetcher::new(&[(
            "https://cook.example/cake?utm=1",
            page(&[
                ("og:description", description),
                ("og:image", "/img/cake.jpg"),
            ]),
        )]);

        let report = Harvester::new(fetcher)
            .harvest(&[pair("Caf\u{e9} Cake", "https://cook.example/cake?utm=1")])
            .await;

        assert_eq!(report.total_items, 1);
        assert!(report.failures.is_empty());
        let recipe = &report.recipes[0];
        assert_eq!(recipe.title, "Cafe Cake");
        assert_eq!(recipe.source_url, "https://cook.example/cake");
        assert_eq!(recipe.image_url, "https://cook.example/img/cake.jpg");
        assert_eq!(recipe.ingredients, vec!["2 cups flour", "1 egg"]);
        assert_eq!(
            recipe.steps.as_deref(),
            Some(&["Mix flour and egg".to_string(), "Bake at 350".to_string()][..])
        );
        assert!(recipe.has_tags());
        assert_eq!(recipe.meal_types.as_deref(), Some(&["dessert".to_string()][..]));
        assert!(recipe.notes.is_none());
    }

    #[tokio::test]
    async fn test_failure_reasons() {
        let fetcher = StubFetcher::new(&[
            ("https://a.example/no-desc", page(&[("og:image", "https://a.example/x.jpg")])),
            ("https://a.example/no-image", page(&[("og:description", "Tasty")])),
        ]);
        let harvester = Harvester::new(fetcher);

        let report = harvester
            .harvest(&[
                pair("Gone", "https://a.example/gone"),
                pair("No Desc", "https://a.example/no-desc"),
                pair("No Image", "https://a.example/no-image"),
            ])
            .await;

        let reasons: Vec<FailureReason> = report.failures.iter().map(|f| f.reason).collect();
        assert_eq!(
            reasons,
            vec![
                FailureReason::FetchFailed,
                FailureReason::NoDescription,
                FailureReason::NoImage
            ]
        );
        assert!(report.recipes.is_empty());
        assert_eq!(report.failures[0].url, "https://a.example/gone");
    }

    #[tokio::test]
    async fn test_degraded_record_has_notes_and_preview() {
        let long_line = "word ".repeat(100);
        let description = format!("Line one&#10;Line two&#10;{long_line}&#10;four&#10;five");
        let fetcher = StubFetcher::new(&[(
            "https://a.example/r",
            page(&[
                ("og:description", description.as_str()),
                ("og:image", "https://a.example/r.jpg"),
            ]),
        )]);

        let report = Harvester::new(fetcher)
            .harvest(&[pair("Mystery", "https://a.example/r")])
            .await;

        let recipe = &report.recipes[0];
        assert!(recipe.is_degraded());
        assert_eq!(recipe.notes.as_deref(), Some(MISSING_INGREDIENTS_NOTE));
        let preview = recipe.description_preview.as_deref().unwrap();
        assert!(preview.starts_with("Line one Line two word"));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
        assert!(!preview.contains("five"));
    }

    #[tokio::test]
    async fn test_counts_always_add_up() {
        let fetcher = StubFetcher::new(&[(
            "https://a.example/ok",
            page(&[
                ("og:description", "Ingredients: salt, pepper"),
                ("og:image", "https://a.example/ok.jpg"),
            ]),
        )]);

        let pairs = vec![
            pair("Ok", "https://a.example/ok"),
            pair("Missing", "https://a.example/missing"),
            pair("Ok again", "https://a.example/ok"),
        ];
        let report = Harvester::new(fetcher).harvest(&pairs).await;

        assert_eq!(report.recipes.len() + report.failures.len(), pairs.len());
        assert_eq!(report.recipes[0].ingredients, vec!["salt", "pepper"]);
    }

    #[test]
    fn test_og_url_is_preferred_and_canonicalized() {
        let harvester = Harvester::new(StubFetcher::new(&[]));
        let fetched = FetchedPage {
            url: "https://www.instagram.com/p/ABC123/?img_index=1".to_string(),
            body: page(&[
                ("og:description", "Ingredients: rice"),
                ("og:image", "https://cdn.example/a.jpg"),
                ("og:url", "https://www.instagram.com/chef/reel/XYZ789/?igsh=abc"),
            ]),
        };

        let recipe = harvester
            .assemble(&pair("Rice", "https://instagr.am/p/ABC123"), &fetched)
            .unwrap();
        assert_eq!(recipe.source_url, "https://www.instagram.com/reel/XYZ789/");
    }

    #[test]
    fn test_canonicalize_source_url() {
        assert_eq!(
            canonicalize_source_url("https://instagram.com/p/Cx1/?utm_source=ig"),
            "https://www.instagram.com/p/Cx1/"
        );
        assert_eq!(
            canonicalize_source_url("https://www.instagram.com/chef/"),
            "https://www.instagram.com/chef/"
        );
        assert_eq!(
            canonicalize_source_url("https://blog.example/p/stew/?ref=pdf#top"),
            "https://blog.example/p/stew/"
        );
        assert_eq!(canonicalize_source_url("not a url"), "not a url");
    }

    #[test]
    fn test_description_preview_normalizes_text() {
        assert_eq!(
            description_preview("Cr\u{e8}me br\u{fb}l\u{e9}e\nso good \u{1f60b}"),
            "Creme brulee so good "
        );
    }

    #[test]
    fn test_description_preview_splits_on_carriage_returns() {
        assert_eq!(description_preview("a\rb\rc\rd\re"), "a b c d");
        assert_eq!(description_preview("a\r\nb\nc\r\nd\r\ne"), "a b c d");
    }
}
