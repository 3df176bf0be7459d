//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the dispatcher works through the queue.
//!
//! Files are converted one at a time, so per-file events never interleave.
//! [`ConversionProgressCallback::on_page_progress`] is the exception to the
//! "called from the batch task" rule: it fires from the blocking thread that
//! rasterises PDF pages, which is why the trait is `Send + Sync`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_fileconv::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_progress(&self, completed: usize, total: usize) {
//!         self.completed.store(completed, Ordering::SeqCst);
//!         eprintln!("{completed}/{total} files");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the dispatcher as it processes each queued file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first file is attempted.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file's routine runs.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the queue
    /// * `total`: queue length
    /// * `name`: the file's display name
    fn on_file_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after a file's artifact has been saved.
    fn on_file_complete(&self, index: usize, total: usize, output_name: &str) {
        let _ = (index, total, output_name);
    }

    /// Called when a file fails; the batch continues afterwards.
    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Fractional batch progress, fired after every attempted file
    /// (success or failure) as `completed / total`.
    fn on_progress(&self, completed: usize, total: usize) {
        let _ = (completed, total);
    }

    /// Per-page progress while a PDF is rasterised into an archive.
    ///
    /// Independent of [`Self::on_progress`]; `page` is 1-indexed.
    fn on_page_progress(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        last_progress: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_file_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _output_name: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_progress(&self, completed: usize, _total: usize) {
            self.last_progress.store(completed, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, "a.png");
        cb.on_file_complete(1, 2, "a.jpg");
        cb.on_file_error(2, 2, "bad");
        cb.on_progress(2, 2);
        cb.on_page_progress(1, 1);
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_file_start(1, 2, "a.png");
        tracker.on_file_complete(1, 2, "a.jpg");
        tracker.on_progress(1, 2);
        tracker.on_file_start(2, 2, "b.bin");
        tracker.on_file_error(2, 2, "unsupported");
        tracker.on_progress(2, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.last_progress.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_page_progress(3, 12);
    }
}
