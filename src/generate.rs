//! Text stages: content generation and keyword enrichment.
//!
//! Both stages follow the same shape: build the prompt, call the resolved
//! [`TextGenerator`], hand the blob to the matching pipeline step. A
//! generator failure is fatal to its stage (there is nothing to salvage
//! from a call that never produced text), while everything recoverable
//! about the *content* of the text is the pipeline step's job.
//!
//! [`TextGenerator`]: crate::sources::TextGenerator

use std::time::Instant;

use tracing::{debug, info};

use crate::card::Card;
use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::pipeline::{enrich, parse};
use crate::prompts;
use crate::sources;

/// Generate a fresh deck for `topic`.
///
/// # Errors
/// - [`DeckError::InvalidConfig`] when the topic is blank
/// - [`DeckError::SourceNotConfigured`] when no generator is available
/// - [`DeckError::ApiError`] when the generator call fails
/// - [`DeckError::MalformedContent`] when no strategy can parse the reply
pub async fn generate_cards(topic: &str, config: &DeckConfig) -> Result<Vec<Card>, DeckError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(DeckError::InvalidConfig("topic must not be empty".into()));
    }
    let started = Instant::now();
    info!(topic, "generating card content");

    // ── Step 1: Resolve the generator ────────────────────────────────────
    let generator = sources::resolve_text_generator(config)?;

    // ── Step 2: Request content ──────────────────────────────────────────
    let prompt = prompts::content_prompt(topic);
    let text = generator.generate(&prompt).await?;
    debug!(bytes = text.len(), "model replied");

    // ── Step 3: Parse the reply into a deck ──────────────────────────────
    let cards = parse::parse_cards(&text)?;
    info!(
        cards = cards.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "deck generated"
    );
    Ok(cards)
}

/// Ask for search keywords for the current deck and apply them in place.
///
/// Returns how many cards received at least one keyword list. Zero is not
/// an error: a reply the matcher cannot align with any card leaves the
/// deck untouched and the caller decides whether that matters.
pub async fn enrich_cards(cards: &mut [Card], config: &DeckConfig) -> Result<usize, DeckError> {
    if cards.is_empty() {
        return Ok(0);
    }
    let started = Instant::now();
    info!(cards = cards.len(), "requesting image keywords");

    let generator = sources::resolve_text_generator(config)?;
    let prompt = prompts::keyword_prompt(cards);
    let text = generator.generate(&prompt).await?;
    debug!(bytes = text.len(), "model replied");

    let applied = enrich::apply_keywords(cards, &text);
    info!(
        applied,
        duration_ms = started.elapsed().as_millis() as u64,
        "keywords applied"
    );
    Ok(applied)
}
