//! Download capability — how the sync engine gets image bytes for a URL.
//!
//! Two implementations: [`HttpSmileyDownloader`] issues real network
//! requests; [`ArchiveSmileyDownloader`] resolves against a packaged
//! snapshot for deterministic, offline runs. The engine only sees the
//! [`SmileyDownloader`] trait.

pub mod archive;
pub mod error;
pub mod http;

use async_trait::async_trait;

pub use archive::{ArchiveError, ArchiveSmileyDownloader};
pub use error::DownloadError;
pub use http::HttpSmileyDownloader;

/// Asynchronously retrieve the binary image data behind a URL.
///
/// Implementations must tolerate concurrent calls for different URLs; no
/// ordering is guaranteed between independent fetches.
#[async_trait]
pub trait SmileyDownloader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}
