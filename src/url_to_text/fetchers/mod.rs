mod request;

pub use request::RequestFetcher;

use crate::error::TransportError;
use async_trait::async_trait;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub body: String,
}

/// Fetched binary content, e.g. an image.
#[derive(Debug, Clone)]
pub struct FetchedBytes {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Network collaborator used by the pipelines.
///
/// Implementations must bound every call with a timeout; a timeout is
/// reported like any other [`TransportError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, TransportError>;

    async fn fetch_bytes(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchedBytes, TransportError>;
}
