//! Acquisition: attach one image reference per card, strictly in order.
//!
//! ## Why sequential?
//!
//! One card at a time, each awaited to completion before the next begins,
//! with a fixed pacing delay in between. The providers behind the sources
//! rate-limit aggressively and the decks are small (5–8 cards), so
//! sequencing costs seconds while keeping request bursts impossible and
//! progress reporting trivially ordered. There is no retry: a failed card
//! is recorded and the loop moves on, so one dead provider response can
//! never stall or abort the deck.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::card::{AcquisitionProgress, AcquisitionReport, Card};
use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::sources::{self, ImageSource};

/// Resolve the configured image source and run the acquisition loop.
///
/// This is the primary entry point for the stage. Configuration problems
/// (no source selected, missing credential) fail here, before any card is
/// touched; once the loop starts, nothing but the caller can stop it short
/// of the last card.
pub async fn acquire_images(
    cards: &mut [Card],
    config: &DeckConfig,
) -> Result<AcquisitionReport, DeckError> {
    let source = sources::resolve_source(config)?;
    Ok(acquire_with_source(cards, source.as_ref(), config).await)
}

/// Run the acquisition loop against an already-resolved source.
///
/// Walks the deck in ascending order. Per card: `Ok(Some(url))` sets
/// `image_url`, `Ok(None)` leaves the card deliberately image-less, and
/// `Err` is recorded while the loop continues. The progress counter
/// advances exactly once per card, success or failure, and reaches `total`
/// exactly once, at the end.
pub async fn acquire_with_source(
    cards: &mut [Card],
    source: &dyn ImageSource,
    config: &DeckConfig,
) -> AcquisitionReport {
    let started = Instant::now();
    let total = cards.len();
    let callback = &config.progress;
    let mut progress = AcquisitionProgress::new(total);
    let mut errors = Vec::new();
    let mut acquired = 0usize;

    info!(total, source = source.name(), "starting image acquisition");
    callback.on_acquisition_start(total);

    for (index, card) in cards.iter_mut().enumerate() {
        callback.on_card_start(card.id, total);

        match source.acquire(card, &config.layout).await {
            Ok(Some(url)) => {
                card.image_url = Some(url);
                acquired += 1;
                debug!(card = card.id, "image acquired");
                callback.on_card_complete(card.id, total, true);
            }
            Ok(None) => {
                debug!(card = card.id, "source left this card without an image");
                callback.on_card_complete(card.id, total, false);
            }
            Err(err) => {
                warn!(card = card.id, error = %err, "card failed, continuing");
                callback.on_card_error(card.id, total, &err.to_string());
                errors.push(err);
            }
        }

        progress.advance();

        // Pacing between cards; no trailing delay after the last one.
        if index + 1 < total && config.card_pacing_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.card_pacing_ms)).await;
        }
    }

    debug_assert!(progress.is_complete());
    callback.on_acquisition_complete(total, acquired);

    let report = AcquisitionReport {
        total,
        acquired,
        errors,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        total,
        acquired = report.acquired,
        failed = report.failed(),
        duration_ms = report.duration_ms,
        "acquisition finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutSettings;
    use crate::error::CardError;
    use crate::progress::AcquisitionProgressCallback;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Outcome script per card id; unlisted ids succeed with a stock URL.
    #[derive(Default)]
    struct ScriptedSource {
        outcomes: HashMap<u32, Outcome>,
        calls: Mutex<Vec<u32>>,
    }

    enum Outcome {
        Blank,
        Fail(String),
    }

    impl ScriptedSource {
        fn failing(ids: &[u32]) -> Self {
            let mut outcomes = HashMap::new();
            for &id in ids {
                outcomes.insert(id, Outcome::Fail(format!("scripted failure {id}")));
            }
            Self {
                outcomes,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn blank(ids: &[u32]) -> Self {
            let mut outcomes = HashMap::new();
            for &id in ids {
                outcomes.insert(id, Outcome::Blank);
            }
            Self {
                outcomes,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn acquire(
            &self,
            card: &Card,
            _layout: &LayoutSettings,
        ) -> Result<Option<String>, CardError> {
            self.calls.lock().unwrap().push(card.id);
            match self.outcomes.get(&card.id) {
                Some(Outcome::Blank) => Ok(None),
                Some(Outcome::Fail(detail)) => Err(CardError::SourceUnavailable {
                    card: card.id,
                    detail: detail.clone(),
                }),
                None => Ok(Some(format!("https://img.example/{}.jpg", card.id))),
            }
        }
    }

    fn deck(n: u32) -> Vec<Card> {
        (1..=n)
            .map(|i| Card::new(i, format!("제목 {i}"), format!("본문 {i}")))
            .collect()
    }

    fn fast_config() -> DeckConfig {
        DeckConfig::builder().card_pacing_ms(0).build().unwrap()
    }

    #[tokio::test]
    async fn all_cards_acquire_in_order() {
        let mut cards = deck(4);
        let source = ScriptedSource::default();
        let report = acquire_with_source(&mut cards, &source, &fast_config()).await;

        assert_eq!(report.total, 4);
        assert_eq!(report.acquired, 4);
        assert!(report.is_clean());
        assert!(cards.iter().all(|c| c.image_url.is_some()));
        assert_eq!(*source.calls.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_deck() {
        let mut cards = deck(3);
        let source = ScriptedSource::failing(&[2]);
        let report = acquire_with_source(&mut cards, &source, &fast_config()).await;

        assert_eq!(report.acquired, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.errors[0].card(), 2);
        assert!(cards[0].image_url.is_some());
        assert!(cards[1].image_url.is_none());
        assert!(cards[2].image_url.is_some(), "card after the failure still runs");
    }

    #[tokio::test]
    async fn blank_outcome_is_neither_acquired_nor_failed() {
        let mut cards = deck(2);
        let source = ScriptedSource::blank(&[1]);
        let report = acquire_with_source(&mut cards, &source, &fast_config()).await;

        assert_eq!(report.acquired, 1);
        assert!(report.is_clean());
        assert!(cards[0].image_url.is_none());
        assert!(cards[1].image_url.is_some());
    }

    #[tokio::test]
    async fn callback_sees_every_card_exactly_once() {
        struct Counting {
            starts: AtomicUsize,
            completes: AtomicUsize,
            errors: AtomicUsize,
            finishes: AtomicUsize,
            acquired: AtomicUsize,
        }
        impl AcquisitionProgressCallback for Counting {
            fn on_card_start(&self, _id: u32, _total: usize) {
                self.starts.fetch_add(1, Ordering::SeqCst);
            }
            fn on_card_complete(&self, _id: u32, _total: usize, _set: bool) {
                self.completes.fetch_add(1, Ordering::SeqCst);
            }
            fn on_card_error(&self, _id: u32, _total: usize, _error: &str) {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
            fn on_acquisition_complete(&self, _total: usize, acquired: usize) {
                self.finishes.fetch_add(1, Ordering::SeqCst);
                self.acquired.store(acquired, Ordering::SeqCst);
            }
        }

        let counting = Arc::new(Counting {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            finishes: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
        });
        let config = DeckConfig::builder()
            .card_pacing_ms(0)
            .progress(counting.clone())
            .build()
            .unwrap();

        let mut cards = deck(3);
        let source = ScriptedSource::failing(&[3]);
        acquire_with_source(&mut cards, &source, &config).await;

        assert_eq!(counting.starts.load(Ordering::SeqCst), 3);
        assert_eq!(counting.completes.load(Ordering::SeqCst), 2);
        assert_eq!(counting.errors.load(Ordering::SeqCst), 1);
        assert_eq!(counting.finishes.load(Ordering::SeqCst), 1);
        assert_eq!(counting.acquired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_deck_still_reports_cleanly() {
        let mut cards: Vec<Card> = Vec::new();
        let source = ScriptedSource::default();
        let report = acquire_with_source(&mut cards, &source, &fast_config()).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.acquired, 0);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn pacing_runs_between_cards_only() {
        let mut cards = deck(3);
        let source = ScriptedSource::default();
        let config = DeckConfig::builder().card_pacing_ms(25).build().unwrap();

        let started = Instant::now();
        acquire_with_source(&mut cards, &source, &config).await;
        let elapsed = started.elapsed();

        // Two gaps of 25 ms for three cards; the absence of a trailing
        // delay is not asserted to keep the test timing-insensitive.
        assert!(elapsed >= Duration::from_millis(50), "got {elapsed:?}");
    }

    #[tokio::test]
    async fn unconfigured_source_fails_before_touching_cards() {
        let mut cards = deck(2);
        let err = acquire_images(&mut cards, &fast_config()).await.unwrap_err();
        assert!(matches!(err, DeckError::SourceNotConfigured { .. }));
        assert!(cards.iter().all(|c| c.image_url.is_none()));
    }
}
