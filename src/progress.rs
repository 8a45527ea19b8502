//! Progress-callback trait for per-card resolution events.
//!
//! Inject an [`Arc<dyn JobProgressCallback>`] via
//! [`crate::config::JobConfigBuilder::progress_callback`] to receive
//! real-time events as the resolver works through the decklist.
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a progress bar, a WebSocket, or a log sink without
//! the library knowing anything about how the host application communicates.
//! Resolution is strictly sequential within a job, but jobs may run
//! concurrently with each other, so the trait is `Send + Sync`.

use std::sync::Arc;

/// Called by the pipeline as it resolves each distinct card identifier.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait JobProgressCallback: Send + Sync {
    /// Called once after normalization, before any resolution work.
    ///
    /// # Arguments
    /// * `total_cards` — deck entries (duplicates included)
    /// * `distinct` — distinct identifiers that will be resolved
    fn on_job_start(&self, total_cards: usize, distinct: usize) {
        let _ = (total_cards, distinct);
    }

    /// Called just before an identifier is checked against the cache.
    fn on_card_start(&self, id: &str, index: usize, distinct: usize) {
        let _ = (id, index, distinct);
    }

    /// Called when an identifier has a usable local image.
    ///
    /// `from_cache` is true when no network fetch was needed.
    fn on_card_resolved(&self, id: &str, index: usize, distinct: usize, from_cache: bool) {
        let _ = (id, index, distinct, from_cache);
    }

    /// Called when an identifier fails to resolve.
    fn on_card_failed(&self, id: &str, index: usize, distinct: usize, error: &str) {
        let _ = (id, index, distinct, error);
    }

    /// Called once after the PDF has been written (or the job failed).
    ///
    /// # Arguments
    /// * `placed` — images rendered onto the sheet
    /// * `failed` — distinct identifiers that failed to resolve
    fn on_job_complete(&self, placed: usize, failed: usize) {
        let _ = (placed, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl JobProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::JobConfig`].
pub type ProgressCallback = Arc<dyn JobProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        resolved: AtomicUsize,
        failed: AtomicUsize,
        cache_hits: AtomicUsize,
    }

    impl JobProgressCallback for TrackingCallback {
        fn on_card_start(&self, _id: &str, _index: usize, _distinct: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_card_resolved(&self, _id: &str, _index: usize, _distinct: usize, from_cache: bool) {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            if from_cache {
                self.cache_hits.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_card_failed(&self, _id: &str, _index: usize, _distinct: usize, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_job_start(5, 3);
        cb.on_card_start("111", 0, 3);
        cb.on_card_resolved("111", 0, 3, true);
        cb.on_card_failed("222", 1, 3, "HTTP 404");
        cb.on_job_complete(4, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let t = TrackingCallback {
            starts: AtomicUsize::new(0),
            resolved: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
        };

        t.on_card_start("111", 0, 2);
        t.on_card_resolved("111", 0, 2, true);
        t.on_card_start("222", 1, 2);
        t.on_card_failed("222", 1, 2, "timeout");

        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.resolved.load(Ordering::SeqCst), 1);
        assert_eq!(t.failed.load(Ordering::SeqCst), 1);
        assert_eq!(t.cache_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn JobProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_job_start(10, 10);
        cb.on_card_resolved("123", 0, 10, false);
    }
}
