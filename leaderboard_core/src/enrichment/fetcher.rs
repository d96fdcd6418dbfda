use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::ImageAsset;

/// Async image transport. Every failure kind collapses to `None`.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<ImageAsset>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Option<ImageAsset> {
        let response = match self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%url, error = %err, "avatar request failed");
                return None;
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        match response.bytes().await {
            Ok(bytes) => Some(ImageAsset::new(bytes.to_vec(), content_type)),
            Err(err) => {
                tracing::debug!(%url, error = %err, "avatar body read failed");
                None
            }
        }
    }
}

/// Resolves every request to "no image". Used when avatars are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageFetcher;

#[async_trait]
impl ImageFetcher for NoImageFetcher {
    async fn fetch(&self, _url: &str) -> Option<ImageAsset> {
        None
    }
}
