//! Sync coordinator — keeps cached smiley images in step with the store.
//!
//! A sync pass queries the store for its backlog (records with a source
//! URL but no cached payload), issues one concurrent download per record,
//! and persists each result back through the store's serialized commit
//! path. With auto-sync enabled, commit notifications drive the same
//! per-record pipeline for freshly inserted records without an explicit
//! backlog query.
//!
//! Failures are isolated per record: a download error, a vanished record,
//! or a rejected commit skips that one unit, gets logged, and leaves the
//! record pending for a future pass. Nothing is retried and nothing
//! propagates to the caller, which only observes aggregate progress.

pub mod observer;
pub mod progress;

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;

use crate::download::{HttpSmileyDownloader, SmileyDownloader};
use crate::store::{SmileyRecord, SmileyStore};

use observer::NewSmileyObserver;
pub use progress::SyncProgress;

/// A (key, URL) pair extracted from a pending record at dispatch time.
/// One task per outstanding download; nothing about it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownloadTask {
    pub(crate) text: String,
    pub(crate) url: String,
}

/// Build download tasks from records, keeping only pending records whose
/// URL actually parses. A malformed URL is a reported condition, never a
/// fatal one; the record simply stays out of this pass.
pub(crate) fn tasks_from_records(records: &[SmileyRecord]) -> Vec<DownloadTask> {
    let mut tasks = Vec::with_capacity(records.len());
    for record in records {
        if !record.is_pending() {
            continue;
        }
        let Some(url) = record.image_url.as_deref() else {
            continue;
        };
        if let Err(e) = Url::parse(url) {
            tracing::warn!(
                text = %record.text,
                url = %url,
                error = %e,
                "Skipping smiley with malformed image URL"
            );
            continue;
        }
        tasks.push(DownloadTask {
            text: record.text.clone(),
            // Keep the stored string: re-serializing a parsed URL could
            // change it, and the downloader keys on the exact text.
            url: url.to_string(),
        });
    }
    tasks
}

/// Spawn one download per task. Each completion independently re-resolves
/// its record by key and commits, so interleaved mutations and deletions
/// only ever affect their own unit.
fn dispatch_downloads(
    store: &Arc<dyn SmileyStore>,
    downloader: &Arc<dyn SmileyDownloader>,
    tasks: Vec<DownloadTask>,
    progress: &SyncProgress,
) {
    for task in tasks {
        progress.begin_unit();
        let store = Arc::clone(store);
        let downloader = Arc::clone(downloader);
        let progress = progress.clone();
        tokio::spawn(async move {
            match downloader.fetch(&task.url).await {
                Ok(data) => match store.set_image_data(&task.text, &data).await {
                    Ok(true) => progress.complete_unit(),
                    Ok(false) => {
                        // Expected race: the record was deleted between
                        // dispatch and completion. The download is dropped.
                        tracing::debug!(
                            text = %task.text,
                            "Smiley vanished before its image data arrived"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            text = %task.text,
                            error = %e,
                            "Error saving image data for smiley"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        text = %task.text,
                        url = %task.url,
                        error = %e,
                        "Error downloading image for smiley"
                    );
                }
            }
            progress.finish_unit();
        });
    }
}

/// Orchestrates download-and-persist sync passes over a smiley store.
///
/// Holds its store and downloader for its whole life; both are supplied
/// at construction and never reassigned. All methods take `&self` — the
/// updater is safe to share behind an `Arc`.
pub struct SmileyUpdater {
    store: Arc<dyn SmileyStore>,
    downloader: Arc<dyn SmileyDownloader>,
    observer: Mutex<Option<NewSmileyObserver>>,
}

impl SmileyUpdater {
    pub fn new(store: Arc<dyn SmileyStore>, downloader: Arc<dyn SmileyDownloader>) -> Self {
        Self {
            store,
            downloader,
            observer: Mutex::new(None),
        }
    }

    /// Construct with the live network downloader.
    pub fn with_http_downloader(store: Arc<dyn SmileyStore>) -> Self {
        Self::new(store, Arc::new(HttpSmileyDownloader::new()))
    }

    /// Run one sync pass: fetch image data for every record that has a
    /// source URL but no cached payload.
    ///
    /// Returns immediately after dispatch with a [`SyncProgress`] handle;
    /// the downloads run concurrently in the background with no upper
    /// bound beyond the backlog size. An empty backlog yields a progress
    /// of zero units, already settled.
    pub async fn download_missing_image_data(&self) -> SyncProgress {
        let progress = SyncProgress::new();
        match self.store.missing_image_data().await {
            Ok(records) => {
                let tasks = tasks_from_records(&records);
                progress.set_total(tasks.len() as i64);
                dispatch_downloads(&self.store, &self.downloader, tasks, &progress);
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching smileys missing image data");
                // Resolve the pass as settled-empty so callers awaiting it
                // cannot hang on a failed backlog query.
                progress.set_total(0);
            }
        }
        progress
    }

    /// Enable or disable auto-sync.
    ///
    /// Enabling attaches a fresh observer to the store's commit
    /// notifications: any commit that inserts records still needing image
    /// data triggers the per-record download pipeline. Enabling while
    /// already enabled replaces the observer. Disabling tears the
    /// subscription down; insertions during a disabled interval are not
    /// buffered. The flag is not persisted across restarts.
    pub fn set_automatically_fetch_new_image_data(&self, automatic: bool) {
        let observer = if automatic {
            // Subscribe before the observer task starts so no commit
            // between this call and the first poll is missed.
            let events = self.store.subscribe();
            let store = Arc::clone(&self.store);
            let downloader = Arc::clone(&self.downloader);
            Some(NewSmileyObserver::new(events, move |tasks| {
                let progress = SyncProgress::new();
                progress.set_total(tasks.len() as i64);
                dispatch_downloads(&store, &downloader, tasks, &progress);
            }))
        } else {
            None
        };

        *self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = observer;
    }

    /// Whether auto-sync is currently enabled.
    pub fn automatically_fetches_new_image_data(&self) -> bool {
        self.observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl std::fmt::Debug for SmileyUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmileyUpdater")
            .field(
                "automatically_fetches_new_image_data",
                &self.automatically_fetches_new_image_data(),
            )
            .finish_non_exhaustive()
    }
}
