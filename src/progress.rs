//! Progress-callback trait for per-attachment generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as the pipeline normalises each attachment.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a form widget, a status line, or a terminal progress bar
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so a shared config can cross
//! thread boundaries even though a single generation runs synchronously.

use std::sync::Arc;

/// Called by the generation pipeline as it normalises each attachment.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before any attachment is normalised.
    ///
    /// # Arguments
    /// * `total_attachments` — number of records that will be processed
    fn on_generation_start(&self, total_attachments: usize) {
        let _ = total_attachments;
    }

    /// Called just before an attachment is normalised.
    fn on_attachment_start(&self, placeholder: &str, name: &str) {
        let _ = (placeholder, name);
    }

    /// Called when an attachment normalised successfully.
    ///
    /// # Arguments
    /// * `images_produced` — how many embeddable images the item expanded to
    ///   (one per PDF page; one for bitmaps, buffers, and spreadsheets)
    fn on_attachment_done(&self, placeholder: &str, name: &str, images_produced: usize) {
        let _ = (placeholder, name, images_produced);
    }

    /// Called when an attachment failed to normalise. The item contributes
    /// zero images; generation continues.
    fn on_attachment_error(&self, placeholder: &str, name: &str, error: &str) {
        let _ = (placeholder, name, error);
    }

    /// Called once after every attachment has been attempted.
    fn on_generation_complete(&self, total_attachments: usize, failed: usize) {
        let _ = (total_attachments, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        dones: AtomicUsize,
        errors: AtomicUsize,
        completed_failed: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_attachment_start(&self, _placeholder: &str, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attachment_done(&self, _placeholder: &str, _name: &str, _images: usize) {
            self.dones.fetch_add(1, Ordering::SeqCst);
        }

        fn on_attachment_error(&self, _placeholder: &str, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, _total: usize, failed: usize) {
            self.completed_failed.store(failed, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(5);
        cb.on_attachment_start("SLOT", "a.png");
        cb.on_attachment_done("SLOT", "a.png", 1);
        cb.on_attachment_error("SLOT", "b.pdf", "corrupt");
        cb.on_generation_complete(5, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            dones: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            completed_failed: AtomicUsize::new(0),
        };

        tracker.on_generation_start(3);
        tracker.on_attachment_start("A", "1.png");
        tracker.on_attachment_done("A", "1.png", 1);
        tracker.on_attachment_start("A", "2.pdf");
        tracker.on_attachment_done("A", "2.pdf", 4);
        tracker.on_attachment_start("B", "3.pdf");
        tracker.on_attachment_error("B", "3.pdf", "corrupt");
        tracker.on_generation_complete(3, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.dones.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed_failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn GenerationProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_generation_start(10);
        cb.on_attachment_done("SLOT", "x.png", 1);
    }
}
