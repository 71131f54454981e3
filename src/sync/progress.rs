//! Progress reporting for a sync pass.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Sentinel total before the backlog query has resolved.
const INDETERMINATE: i64 = -1;

/// Counter handle for one sync pass.
///
/// Cheap to clone; all clones share the same counters. The total starts
/// indeterminate and is fixed once the backlog is known; the completed
/// count only ever grows, by one per successfully persisted download, and
/// never exceeds the total. Progress reporting is fire-and-forget — the
/// caller may drop the handle without affecting the pass.
#[derive(Debug, Clone)]
pub struct SyncProgress {
    inner: Arc<ProgressInner>,
}

#[derive(Debug)]
struct ProgressInner {
    total: AtomicI64,
    completed: AtomicI64,
    /// Downloads dispatched but not yet finished (either way).
    outstanding: AtomicUsize,
    idle: Notify,
}

impl SyncProgress {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                total: AtomicI64::new(INDETERMINATE),
                completed: AtomicI64::new(0),
                outstanding: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Number of pending records at pass start, or -1 while the backlog
    /// query is still outstanding.
    pub fn total_unit_count(&self) -> i64 {
        self.inner.total.load(Ordering::SeqCst)
    }

    /// Number of downloads persisted so far in this pass.
    pub fn completed_unit_count(&self) -> i64 {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Whether the backlog size is known yet.
    pub fn is_indeterminate(&self) -> bool {
        self.total_unit_count() == INDETERMINATE
    }

    /// Wait until the pass has settled: the total is known and every
    /// dispatched download has finished, successfully or not. Returns
    /// immediately for an empty pass.
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    fn is_settled(&self) -> bool {
        self.total_unit_count() >= 0 && self.inner.outstanding.load(Ordering::SeqCst) == 0
    }

    pub(crate) fn set_total(&self, total: i64) {
        self.inner.total.store(total, Ordering::SeqCst);
        if self.is_settled() {
            self.inner.idle.notify_waiters();
        }
    }

    /// Register a dispatched download. Must happen before the unit's task
    /// is spawned so `settled` cannot observe a half-dispatched pass.
    pub(crate) fn begin_unit(&self) {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a unit as completed: its payload was persisted.
    pub(crate) fn complete_unit(&self) {
        self.inner.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// A dispatched download finished, whether or not it completed.
    pub(crate) fn finish_unit(&self) {
        self.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
        if self.is_settled() {
            self.inner.idle.notify_waiters();
        }
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_indeterminate() {
        let progress = SyncProgress::new();
        assert!(progress.is_indeterminate());
        assert_eq!(progress.total_unit_count(), -1);
        assert_eq!(progress.completed_unit_count(), 0);
    }

    #[test]
    fn test_set_total_fixes_count() {
        let progress = SyncProgress::new();
        progress.set_total(3);
        assert!(!progress.is_indeterminate());
        assert_eq!(progress.total_unit_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_pass_settles_immediately() {
        let progress = SyncProgress::new();
        progress.set_total(0);
        tokio::time::timeout(Duration::from_secs(1), progress.settled())
            .await
            .expect("empty pass should settle immediately");
    }

    #[tokio::test]
    async fn test_settled_waits_for_outstanding_units() {
        let progress = SyncProgress::new();
        progress.begin_unit();
        progress.set_total(1);

        let waiter = {
            let progress = progress.clone();
            tokio::spawn(async move {
                progress.settled().await;
                progress.completed_unit_count()
            })
        };

        tokio::task::yield_now().await;
        progress.complete_unit();
        progress.finish_unit();

        let completed = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("pass should settle once units finish")
            .unwrap();
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn test_failed_unit_still_settles() {
        let progress = SyncProgress::new();
        progress.begin_unit();
        progress.set_total(1);

        // Finished without completing: a failed download.
        progress.finish_unit();

        tokio::time::timeout(Duration::from_secs(1), progress.settled())
            .await
            .expect("pass should settle even when units fail");
        assert_eq!(progress.completed_unit_count(), 0);
    }
}
