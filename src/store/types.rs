//! Types for the smiley store.

use chrono::{DateTime, Utc};

/// Primary key of a smiley: the text shortcut typed into a post, e.g. `:v:`.
pub type SmileyKey = String;

/// A persisted smiley record.
///
/// `text` is the stable identifier; it is unique across the store and must
/// be non-empty once persisted. `image_url` points at the remote source of
/// the binary payload; `image_data` is the cached payload, absent until a
/// sync pass fetches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmileyRecord {
    pub text: SmileyKey,
    pub image_url: Option<String>,
    pub image_data: Option<Vec<u8>>,
    /// Forum section the smiley is listed under (descriptive metadata).
    pub section: Option<String>,
    /// Human-readable description (descriptive metadata).
    pub summary: Option<String>,
    /// When the payload was fetched; set by the store on a successful
    /// `set_image_data` commit.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl SmileyRecord {
    /// A record that still needs its remote payload fetched.
    pub fn new(text: impl Into<SmileyKey>, image_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: Some(image_url.into()),
            image_data: None,
            section: None,
            summary: None,
            fetched_at: None,
        }
    }

    /// Payload absent, source URL present: the target set for a sync pass.
    pub fn is_pending(&self) -> bool {
        self.image_data.is_none() && self.image_url.is_some()
    }
}
