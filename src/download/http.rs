//! Network-backed downloader.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use super::error::DownloadError;
use super::SmileyDownloader;

/// Fetches image data over HTTP with a shared [`reqwest::Client`].
///
/// Smiley images are small, so the whole payload is buffered in memory;
/// the body is still consumed chunk-by-chunk so a broken transfer surfaces
/// as an error instead of a truncated payload.
#[derive(Debug, Clone)]
pub struct HttpSmileyDownloader {
    client: Client,
}

impl HttpSmileyDownloader {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use an existing client, e.g. one already configured with the host
    /// application's user agent and proxy settings.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpSmileyDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmileyDownloader for HttpSmileyDownloader {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Http {
                source: e,
                url: url.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut data = match response.content_length() {
            Some(len) => Vec::with_capacity(len as usize),
            None => Vec::new(),
        };
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Http {
                source: e,
                url: url.to_string(),
            })?;
            data.extend_from_slice(&chunk);
        }

        Ok(data)
    }
}
