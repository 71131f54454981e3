//! Change observer driving auto-sync.
//!
//! Watches a store's commit notifications from its own task and hands
//! each commit's pending insertions to a dispatch callback. The callback
//! therefore always runs on the observer's task, never on whichever
//! context produced the commit. Dropping the observer cancels the task,
//! so an enabled-then-disabled interval can never leak a subscription.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::store::CommitEvent;

use super::{tasks_from_records, DownloadTask};

/// Watches for freshly inserted smileys that still need image data.
///
/// Holds only the cancellation token; the subscription receiver and the
/// callback live inside the spawned task and are dropped when it exits.
pub(crate) struct NewSmileyObserver {
    cancel: CancellationToken,
}

impl NewSmileyObserver {
    /// Start observing. The receiver must already be subscribed by the
    /// caller so no commit between construction and the first poll is
    /// missed.
    pub(crate) fn new<F>(mut events: broadcast::Receiver<CommitEvent>, on_new_smileys: F) -> Self
    where
        F: Fn(Vec<DownloadTask>) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            let tasks = tasks_from_records(&event.inserted);
                            if !tasks.is_empty() {
                                on_new_smileys(tasks);
                            }
                        }
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(
                                missed,
                                "Smiley commit events lagged; run a manual sync pass to catch up"
                            );
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Self { cancel }
    }
}

impl Drop for NewSmileyObserver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
