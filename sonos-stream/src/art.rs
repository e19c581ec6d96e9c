//! Album art retrieval
//!
//! Sonos players serve cover art from `/getaa` on their own HTTP port. The
//! image is sometimes not ready the instant a track starts, so a 404 is
//! retried a few times before giving up.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use sonos_discovery::Device;
use tracing::debug;

use crate::display::AlbumArt;
use crate::error::{Result, StreamError};

const SNIPPET_LIMIT: usize = 256;

/// Fetches album art for a device.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtFetcher: Send + Sync {
    /// Download the image at `url`, an absolute URL already resolved
    /// against `device`
    async fn fetch(&self, device: &Device, url: &str) -> Result<AlbumArt>;
}

/// [`ArtFetcher`] over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpArtFetcher {
    client: reqwest::Client,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpArtFetcher {
    /// Per-request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StreamError::Art(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            attempts: 3,
            retry_delay: Duration::from_millis(200),
        })
    }

    /// Try up to `attempts` times on network errors and 404s, waiting
    /// `retry_delay` in between
    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }
}

#[async_trait]
impl ArtFetcher for HttpArtFetcher {
    async fn fetch(&self, device: &Device, url: &str) -> Result<AlbumArt> {
        let mut last_failure = String::new();

        for attempt in 1..=self.attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!(ip = %device.ip, url, attempt, error = %e, "album art request failed");
                    last_failure = format!("fetch album art failed: {}", e);
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| StreamError::Art(format!("read album art body: {}", e)))?;
                    return Ok(AlbumArt { bytes, content_type });
                }
                StatusCode::NOT_FOUND => {
                    debug!(ip = %device.ip, url, attempt, "album art not ready yet");
                    last_failure = "album art http status 404 after retries".to_string();
                }
                status => {
                    let body = response.bytes().await.unwrap_or_default();
                    let end = body.len().min(SNIPPET_LIMIT);
                    let snippet = String::from_utf8_lossy(&body[..end]).trim().to_string();
                    return Err(StreamError::Art(format!(
                        "album art http status {}: {}",
                        status, snippet
                    )));
                }
            }
        }

        Err(StreamError::Art(last_failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(ip: &str) -> Device {
        Device {
            ip: ip.to_string(),
            ..Default::default()
        }
    }

    fn fetcher() -> HttpArtFetcher {
        HttpArtFetcher::new()
            .unwrap()
            .with_retry(3, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_fetch_returns_bytes_and_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/getaa/42.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89, b'P', b'N', b'G'])
            .create_async()
            .await;

        let url = format!("{}/getaa/42.png", server.url());
        let art = fetcher().fetch(&device("127.0.0.1"), &url).await.unwrap();

        assert_eq!(art.content_type, "image/png");
        assert_eq!(art.bytes.as_ref(), &[0x89, b'P', b'N', b'G']);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/getaa/7.png")
            .with_status(404)
            .expect(3)
            .create_async()
            .await;

        let url = format!("{}/getaa/7.png", server.url());
        let err = fetcher().fetch(&device("127.0.0.1"), &url).await.unwrap_err();

        assert!(err.to_string().contains("404 after retries"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_status_fails_immediately() {
        let mut server = mockito::Server::new_async().await;
        let long_body = format!("  denied{}", "x".repeat(400));
        let mock = server
            .mock("GET", "/getaa/9.png")
            .with_status(403)
            .with_body(long_body)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/getaa/9.png", server.url());
        let err = fetcher().fetch(&device("127.0.0.1"), &url).await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains(": denied"));
        assert!(message.contains(&"x".repeat(240)));
        assert!(!message.contains(&"x".repeat(260)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let err = fetcher()
            .fetch(&device("127.0.0.1"), "http://127.0.0.1:1/getaa")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fetch album art failed"));
    }
}
