//! Error types for the cardnews library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DeckError`] - **Fatal**: the run cannot proceed at all (empty topic,
//!   image source not configured, model output with no recoverable cards).
//!   Returned as `Err(DeckError)` from the top-level stage functions.
//!
//! * [`CardError`] - **Non-fatal**: a single card failed (search returned
//!   nothing, its image could not be fetched, its raster panicked) but all
//!   other cards are fine. Collected into [`crate::card::AcquisitionReport`]
//!   and [`crate::card::ArchiveExport`] so callers can inspect partial
//!   success rather than losing the whole deck to one bad card.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! card failure, log and continue, or collect all errors for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cardnews library.
///
/// Card-level failures use [`CardError`] and are aggregated into stage
/// reports rather than propagated here.
#[derive(Debug, Error)]
pub enum DeckError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a stage received unusable input.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No usable collaborator for the requested strategy (no source kind
    /// selected, provider without a credential, missing API key).
    #[error("Not configured: {detail}\n{hint}")]
    SourceNotConfigured { detail: String, hint: String },

    // ── Content errors ────────────────────────────────────────────────────
    /// Neither parsing strategy recovered a single card from the text.
    #[error(
        "Generated text contained no recognisable cards ({detail}).\n\
         Run with RUST_LOG=cardnews=debug to log the raw model output."
    )]
    MalformedContent { detail: String },

    /// The generative API answered with an error, or not at all.
    #[error("Generative API error: {message}")]
    ApiError { message: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// No font with usable glyph coverage could be loaded.
    #[error(
        "No usable font: {detail}\n\
         Install a system font with Hangul coverage (e.g. Noto Sans KR) or\n\
         point the config at a font file explicitly."
    )]
    FontUnavailable { detail: String },

    /// Every card failed to export; the archive would be empty.
    #[error("All {total} cards failed to export.\nFirst error: {first_error}")]
    AllCardsFailed { total: usize, first_error: String },

    /// The archive writer itself failed (not any one card).
    #[error("Failed to package archive: {detail}")]
    Packaging { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single card.
///
/// Recorded in [`crate::card::AcquisitionReport::errors`] or
/// [`crate::card::ArchiveExport::failed_ids`] when a card fails.
/// The overall run continues unless ALL cards fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CardError {
    /// The image provider could not be reached or answered with an error.
    #[error("Card {card}: image source unavailable: {detail}")]
    SourceUnavailable { card: u32, detail: String },

    /// The provider answered normally but had no image for the query.
    #[error("Card {card}: no image found for query '{query}'")]
    NoResult { card: u32, query: String },

    /// Fetching or rasterising the card's visual failed.
    #[error("Card {card}: render failed: {detail}")]
    RenderFailed { card: u32, detail: String },
}

impl CardError {
    /// Id of the card this error belongs to.
    pub fn card(&self) -> u32 {
        match self {
            CardError::SourceUnavailable { card, .. }
            | CardError::NoResult { card, .. }
            | CardError::RenderFailed { card, .. } => *card,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_cards_failed_display() {
        let e = DeckError::AllCardsFailed {
            total: 6,
            first_error: "card 1: no image found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 6 cards"), "got: {msg}");
        assert!(msg.contains("no image found"), "got: {msg}");
    }

    #[test]
    fn source_not_configured_display() {
        let e = DeckError::SourceNotConfigured {
            detail: "search selected but no provider chosen".into(),
            hint: "Pass --provider pixabay|pexels|unsplash.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("no provider chosen"));
        assert!(msg.contains("--provider"));
    }

    #[test]
    fn malformed_content_display_has_log_hint() {
        let e = DeckError::MalformedContent {
            detail: "0 marker lines, 0 sections".into(),
        };
        assert!(e.to_string().contains("RUST_LOG=cardnews=debug"));
    }

    #[test]
    fn no_result_display() {
        let e = CardError::NoResult {
            card: 3,
            query: "morning routine".into(),
        };
        assert!(e.to_string().contains("Card 3"));
        assert!(e.to_string().contains("morning routine"));
    }

    #[test]
    fn card_accessor_covers_all_variants() {
        let errs = [
            CardError::SourceUnavailable {
                card: 1,
                detail: "timeout".into(),
            },
            CardError::NoResult {
                card: 2,
                query: "q".into(),
            },
            CardError::RenderFailed {
                card: 3,
                detail: "font".into(),
            },
        ];
        let ids: Vec<u32> = errs.iter().map(CardError::card).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
