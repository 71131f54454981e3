use thiserror::Error;

/// Typed download errors.
///
/// A failed download is terminal for that one record's sync attempt: the
/// coordinator logs it and moves on, and the record stays pending until
/// the next sync pass or insert notification picks it up again.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error fetching {url}: {source}")]
    Http { source: reqwest::Error, url: String },

    /// The archive snapshot has no resource for this URL.
    #[error("No archived image data for {url}")]
    NotFound { url: String },
}
