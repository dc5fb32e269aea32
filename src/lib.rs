//! Harvest structured recipe records from a PDF list of recipe links.
//!
//! The PDF yields (title, link) pairs, each linked page's metadata yields a
//! description and an image, and the description is split into ingredients
//! and steps and tagged.

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pdf_to_links;
pub mod pipelines;
pub mod text_to_recipe;
pub mod url_to_text;

pub use config::HarvestConfig;
pub use error::{DecodeError, HarvestError, TransportError};
pub use model::{FailureReason, FailureRecord, RecipeDraft, TitleUrlPair};
pub use output::{FailureDocument, RecipeDataset};
pub use pipelines::{HarvestReport, Harvester, ImageCache, ImageCacheOptions};
pub use url_to_text::fetchers::{Fetcher, RequestFetcher};

use log::info;
use pdf_to_links::Pairer;
use std::path::Path;

/// Read a PDF and recover its (title, link) pairs.
pub fn pairs_from_pdf(path: &Path, config: &HarvestConfig) -> Result<Vec<TitleUrlPair>, HarvestError> {
    let document = std::fs::read(path)?;
    info!("Read {} bytes from {}", document.len(), path.display());

    let pairer = Pairer::new(config.pairer.footer_labels.clone());
    pdf_to_links::extract_pairs(&document, &pairer)
}

/// Run the whole pipeline over a PDF with the given fetcher.
pub async fn harvest_pdf_with<F: Fetcher>(
    path: &Path,
    config: &HarvestConfig,
    fetcher: F,
) -> Result<HarvestReport, HarvestError> {
    let pairs = pairs_from_pdf(path, config)?;
    let harvester = Harvester::from_config(fetcher, config);
    Ok(harvester.harvest(&pairs).await)
}

/// Run the whole pipeline over a PDF using plain HTTP requests.
pub async fn harvest_pdf(path: &Path, config: &HarvestConfig) -> Result<HarvestReport, HarvestError> {
    let fetcher = RequestFetcher::new(Some(config.request_timeout()), &config.user_agent)?;
    harvest_pdf_with(path, config, fetcher).await
}
