use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A recipe title paired with the link printed beneath it in the source PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleUrlPair {
    pub title: String,
    pub url: String,
}

impl TitleUrlPair {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// One harvested recipe.
///
/// When `ingredients` is empty the record is degraded and carries `notes`
/// and `description_preview` instead. Fields this crate does not know about
/// are kept in `extra` so rewriting a dataset preserves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub source_url: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_preview: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeDraft {
    pub fn is_degraded(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn has_steps(&self) -> bool {
        self.steps.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_tags(&self) -> bool {
        self.tags.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_meal_types(&self) -> bool {
        self.meal_types.as_ref().is_some_and(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    FetchFailed,
    NoDescription,
    NoImage,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::FetchFailed => "fetch_failed",
            FailureReason::NoDescription => "no_description",
            FailureReason::NoImage => "no_image",
        };
        f.write_str(label)
    }
}

/// An item that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub title: String,
    pub url: String,
    pub reason: FailureReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let recipe = RecipeDraft {
            title: "Soup".to_string(),
            source_url: "https://example.com/soup".to_string(),
            image_url: "https://example.com/soup.jpg".to_string(),
            ingredients: vec!["1 onion".to_string()],
            ..Default::default()
        };

        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["sourceUrl"], "https://example.com/soup");
        assert_eq!(json["imageUrl"], "https://example.com/soup.jpg");
        assert!(json.get("steps").is_none());
        assert!(json.get("mealTypes").is_none());
        assert!(json.get("descriptionPreview").is_none());
    }

    #[test]
    fn test_unknown_fields_survive_a_round_trip() {
        let json = r#"{"id":"r-7","title":"Soup","imageUrl":"https://example.com/a.jpg","servings":4}"#;
        let recipe: RecipeDraft = serde_json::from_str(json).unwrap();

        assert_eq!(recipe.title, "Soup");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.extra["id"], "r-7");

        let back = serde_json::to_value(&recipe).unwrap();
        assert_eq!(back["id"], "r-7");
        assert_eq!(back["servings"], 4);
        assert_eq!(back["imageUrl"], "https://example.com/a.jpg");
    }

    #[test]
    fn test_failure_reason_serializes_snake_case() {
        let failure = FailureRecord {
            title: "Stew".to_string(),
            url: "https://example.com/stew".to_string(),
            reason: FailureReason::NoDescription,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["reason"], "no_description");
        assert_eq!(FailureReason::FetchFailed.to_string(), "fetch_failed");
    }
}
