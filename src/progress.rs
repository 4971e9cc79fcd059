//! Progress-callback trait for per-chunk generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through each chunk. Callers can forward them
//! to a progress bar, a channel, or a log without the library knowing how the
//! host application communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2cards::{GenerationConfig, GenerationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CardCounter {
//!     cards: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CardCounter {
//!     fn on_chunk_complete(&self, _chunk: usize, _total: usize, cards: usize) {
//!         self.cards.fetch_add(cards, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CardCounter { cards: AtomicUsize::new(0) });
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the generation pipeline as it processes each chunk.
///
/// All methods have no-op defaults. With `concurrency > 1` the per-chunk
/// methods may be called concurrently and out of chunk order, so shared
/// state must be synchronised (`Mutex`, atomics).
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once chunking is done, before any generator call.
    fn on_generation_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before the generator is invoked for a chunk (1-indexed).
    fn on_chunk_start(&self, chunk_num: usize, total_chunks: usize) {
        let _ = (chunk_num, total_chunks);
    }

    /// Called when a chunk's response has been parsed.
    ///
    /// `cards` is the number of records the extractor accepted.
    fn on_chunk_complete(&self, chunk_num: usize, total_chunks: usize, cards: usize) {
        let _ = (chunk_num, total_chunks, cards);
    }

    /// Called when a chunk fails after all retries are exhausted.
    fn on_chunk_error(&self, chunk_num: usize, total_chunks: usize, error: &str) {
        let _ = (chunk_num, total_chunks, error);
    }

    /// Called once after aggregation and truncation.
    fn on_generation_complete(&self, produced: usize, requested: usize) {
        let _ = (produced, requested);
    }
}

/// No-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        cards: AtomicUsize,
    }

    impl GenerationProgressCallback for Tracking {
        fn on_chunk_start(&self, _chunk: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _chunk: usize, _total: usize, cards: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.cards.fetch_add(cards, Ordering::SeqCst);
        }

        fn on_chunk_error(&self, _chunk: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(2);
        cb.on_chunk_start(1, 2);
        cb.on_chunk_complete(1, 2, 3);
        cb.on_chunk_error(2, 2, "timeout");
        cb.on_generation_complete(3, 5);
    }

    #[test]
    fn tracking_callback_through_arc_dyn() {
        let tracker = Arc::new(Tracking::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_chunk_start(1, 2);
        cb.on_chunk_complete(1, 2, 3);
        cb.on_chunk_start(2, 2);
        cb.on_chunk_error(2, 2, "503");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.cards.load(Ordering::SeqCst), 3);
    }
}
