//! Progress-callback trait for per-card acquisition events.
//!
//! Inject an [`Arc<dyn AcquisitionProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress`] to receive real-time
//! events as the pipeline works through the deck.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal progress bar, without the library knowing anything about how
//! the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use cardnews::{AcquisitionProgressCallback, DeckConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl AcquisitionProgressCallback for CountingCallback {
//!     fn on_card_complete(&self, card_id: u32, total: usize, image_set: bool) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Card {}/{} done (image: {})", card_id, total, image_set);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = DeckConfig::builder()
//!     .progress(counter as Arc<dyn AcquisitionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the acquisition pipeline as it works through the deck.
///
/// The pipeline is strictly sequential, so events for card N+1 never arrive
/// before card N's terminal event. The trait is still `Send + Sync` because
/// the callback crosses await points on a multi-threaded runtime. All
/// methods have default no-op implementations so callers only override what
/// they care about.
pub trait AcquisitionProgressCallback: Send + Sync {
    /// Called once before any card is attempted.
    ///
    /// # Arguments
    /// * `total` - number of cards that will be processed
    fn on_acquisition_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a card's image request is sent.
    ///
    /// # Arguments
    /// * `card_id` - 1-based card id
    /// * `total`   - total cards in the deck
    fn on_card_start(&self, card_id: u32, total: usize) {
        let _ = (card_id, total);
    }

    /// Called when a card finishes without error.
    ///
    /// # Arguments
    /// * `card_id`   - 1-based card id
    /// * `total`     - total cards in the deck
    /// * `image_set` - false when the source deliberately produced no
    ///   image (e.g. a manual slot left blank)
    fn on_card_complete(&self, card_id: u32, total: usize, image_set: bool) {
        let _ = (card_id, total, image_set);
    }

    /// Called when a card fails. The pipeline records the error and moves
    /// on to the next card.
    ///
    /// # Arguments
    /// * `card_id` - 1-based card id
    /// * `total`   - total cards in the deck
    /// * `error`   - human-readable error description
    fn on_card_error(&self, card_id: u32, total: usize, error: &str) {
        let _ = (card_id, total, error);
    }

    /// Called once after every card has been attempted.
    ///
    /// # Arguments
    /// * `total`    - total cards in the deck
    /// * `acquired` - cards that ended the run with an image set
    fn on_acquisition_complete(&self, total: usize, acquired: usize) {
        let _ = (total, acquired);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl AcquisitionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn AcquisitionProgressCallback>;
