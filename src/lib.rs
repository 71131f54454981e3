//! smiley-sync — incremental fetch-and-persist engine for forum smiley
//! image assets.
//!
//! Smiley records live in a keyed store: the text shortcut is the primary
//! key, with an optional remote image URL and an optional cached payload.
//! A record with a URL but no payload is *pending*; [`sync::SmileyUpdater`]
//! finds pending records, downloads their images concurrently, and writes
//! each payload back through one serialized commit path. In auto-sync
//! mode, store commit notifications drive the same pipeline for freshly
//! inserted records.
//!
//! ```no_run
//! use std::sync::Arc;
//! use smiley_sync::{SmileyRecord, SmileyStore, SmileyUpdater, SqliteSmileyStore};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn SmileyStore> =
//!     Arc::new(SqliteSmileyStore::open(std::path::Path::new("smileys.sqlite")).await?);
//! let updater = SmileyUpdater::with_http_downloader(store.clone());
//!
//! // Keep newly inserted smileys fed with image data…
//! updater.set_automatically_fetch_new_image_data(true);
//!
//! // …and work off whatever backlog already exists.
//! let progress = updater.download_missing_image_data().await;
//! progress.settled().await;
//! println!(
//!     "{} of {} smiley images fetched",
//!     progress.completed_unit_count(),
//!     progress.total_unit_count()
//! );
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod download;
pub mod store;
pub mod sync;

pub use download::{
    ArchiveError, ArchiveSmileyDownloader, DownloadError, HttpSmileyDownloader, SmileyDownloader,
};
pub use store::{CommitEvent, SmileyKey, SmileyRecord, SmileyStore, SqliteSmileyStore, StoreError};
pub use sync::{SmileyUpdater, SyncProgress};
