use crate::error::HarvestError;
use crate::model::{FailureRecord, RecipeDraft};
use crate::pipelines::HarvestReport;
use crate::text_to_recipe::to_ascii;
use chrono::{SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const FAILURES_FILE_NAME: &str = "recipes_fetch_failures.json";

/// Summary counts written alongside the recipes.
///
/// Missing counts read as zero; unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatasetMeta {
    pub source: String,
    /// RFC 3339 UTC timestamp
    pub generated_at: String,
    pub total_recipes_detected: usize,
    pub total_recipes_in_pdf: usize,
    pub recipes_with_missing_ingredients: usize,
    pub recipes_with_missing_steps: usize,
    pub recipes_with_tags: usize,
    pub recipes_with_meal_types: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted recipe dataset.
///
/// Reading is lenient so that datasets edited by hand, or produced by other
/// tools, survive a rewrite by `cache-images` unchanged apart from image URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeDataset {
    pub meta: DatasetMeta,
    pub recipes: Vec<RecipeDraft>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeDataset {
    pub fn from_report(source: &str, report: HarvestReport) -> Self {
        let recipes = report.recipes;
        let meta = DatasetMeta {
            source: to_ascii(source),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            total_recipes_detected: recipes.len(),
            total_recipes_in_pdf: report.total_items,
            recipes_with_missing_ingredients: recipes.iter().filter(|r| r.is_degraded()).count(),
            recipes_with_missing_steps: recipes.iter().filter(|r| !r.has_steps()).count(),
            recipes_with_tags: recipes.iter().filter(|r| r.has_tags()).count(),
            recipes_with_meal_types: recipes.iter().filter(|r| r.has_meal_types()).count(),
            extra: Map::new(),
        };
        Self {
            meta,
            recipes,
            extra: Map::new(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, HarvestError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), HarvestError> {
        write_json(path, self)?;
        info!("Wrote {} recipes to {}", self.recipes.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureMeta {
    pub total_failures: usize,
}

/// Items that produced no record, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDocument {
    pub meta: FailureMeta,
    pub failures: Vec<FailureRecord>,
}

impl FailureDocument {
    pub fn new(failures: Vec<FailureRecord>) -> Self {
        Self {
            meta: FailureMeta {
                total_failures: failures.len(),
            },
            failures,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), HarvestError> {
        write_json(path, self)?;
        info!("Wrote {} failures to {}", self.failures.len(), path.display());
        Ok(())
    }
}

/// Path of the failures document that sits next to a dataset file.
pub fn failures_path(dataset_path: &Path) -> PathBuf {
    dataset_path.with_file_name(FAILURES_FILE_NAME)
}

/// Write the dataset and, when there are any, the failures next to it.
///
/// Returns the failures path if that file was written.
pub fn write_documents(
    dataset: &RecipeDataset,
    failures: Vec<FailureRecord>,
    dataset_path: &Path,
) -> Result<Option<PathBuf>, HarvestError> {
    dataset.write(dataset_path)?;
    if failures.is_empty() {
        return Ok(None);
    }

    let path = failures_path(dataset_path);
    FailureDocument::new(failures).write(&path)?;
    Ok(Some(path))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), HarvestError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}
