//! Image acquisition and text recognition.
//!
//! Defines the `OcrProvider` trait consumed by the service and a
//! Tesseract-backed implementation. Recognition failure is an absent
//! result, never an error: callers report "no text" and do not invoke
//! the analyzer.

pub mod preprocess;
pub mod tesseract;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub use tesseract::TesseractOcr;

/// Abstraction over OCR engines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Recognize text in an encoded image. `None` if nothing usable was read.
    /// Returned text is lower-cased.
    async fn recognize(&self, image: &[u8]) -> Option<String>;

    /// Engine identifier for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Image download
// ---------------------------------------------------------------------------

/// Images larger than this are refused.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// HTTP downloader for images referenced by URL.
pub struct ImageFetcher {
    http: Client,
}

impl ImageFetcher {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("ODDSIGHT/0.1.0")
            .build()
            .context("Failed to build image HTTP client")?;
        Ok(Self { http })
    }

    /// Download the image at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download image: {url}"))?
            .error_for_status()
            .with_context(|| format!("Image request rejected: {url}"))?;

        if let Some(len) = resp.content_length() {
            if len as usize > MAX_IMAGE_BYTES {
                anyhow::bail!("Image too large: {len} bytes");
            }
        }

        let bytes = resp.bytes().await.context("Failed to read image body")?;
        if bytes.len() > MAX_IMAGE_BYTES {
            anyhow::bail!("Image too large: {} bytes", bytes.len());
        }

        debug!(url, bytes = bytes.len(), "Image downloaded");
        Ok(bytes.to_vec())
    }
}
