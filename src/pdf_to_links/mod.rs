//! Recover (title, link) pairs from a PDF export of a bookmark list.
//!
//! The PDF carries no structure beyond shown text, so the pipeline is:
//! content streams -> shown text fragments -> lines -> pairs.

pub mod content;
pub mod literal;
pub mod pairer;

pub use content::{content_streams, extract_fragments, text_fragments, ContentStream, StreamEncoding};
pub use literal::decode_literal;
pub use pairer::{fragment_lines, Pairer};

use crate::error::HarvestError;
use crate::model::TitleUrlPair;
use log::info;

/// Extract every (title, link) pair from raw PDF bytes.
///
/// Only a document without a single content stream is an error; a readable
/// document without any pairs yields an empty list.
pub fn extract_pairs(document: &[u8], pairer: &Pairer) -> Result<Vec<TitleUrlPair>, HarvestError> {
    let streams = content_streams(document);
    if streams.is_empty() {
        return Err(HarvestError::UnreadableDocument(
            "no content streams found".to_string(),
        ));
    }

    let fragments: Vec<String> = streams
        .iter()
        .flat_map(|stream| text_fragments(&stream.text))
        .collect();
    let lines = fragment_lines(&fragments);
    let pairs = pairer.pair(&lines);

    info!(
        "Recovered {} title/link pairs from {} lines in {} streams",
        pairs.len(),
        lines.len(),
        streams.len()
    );
    Ok(pairs)
}
