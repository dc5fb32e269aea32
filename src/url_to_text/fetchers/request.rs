use super::{FetchedBytes, FetchedPage, Fetcher};
use crate::error::TransportError;
use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, PRAGMA, REFERER};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/*,*/*;q=0.8";

pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>, user_agent: &str) -> Result<Self, TransportError> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(PRAGMA, "no-cache")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for RequestFetcher {
    async fn fetch_text(&self, url: &str) -> Result<FetchedPage, TransportError> {
        let request = self.client.get(url).header(ACCEPT, PAGE_ACCEPT);
        let response = self.send(url, request).await?;
        let final_url = response.url().to_string();
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(TransportError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    async fn fetch_bytes(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchedBytes, TransportError> {
        let mut request = self.client.get(url).header(ACCEPT, IMAGE_ACCEPT);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = self.send(url, request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();

        Ok(FetchedBytes {
            bytes,
            content_type,
        })
    }
}
