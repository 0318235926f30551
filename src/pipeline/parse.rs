//! Parsing: recover [`Card`] records from loosely-formatted model text.
//!
//! ## Why two strategies?
//!
//! The content prompt asks for one card per line (`카드 N: [제목] … /
//! [본문] …`), but models drift: they drop the slash, pad the labels with
//! whitespace, or spread one card across several lines. Rejecting such
//! output outright would fail runs whose content is perfectly usable, so
//! parsing is an ordered list of strategies:
//!
//! 1. **Marker lines** - every line starting with the `카드` marker is
//!    matched against the `[제목] … [본문] …` line grammar.
//! 2. **Sections** - the whole text is split on `카드 N:` headers and each
//!    section is searched for the two labels, which may now be on separate
//!    lines.
//!
//! The first strategy to recover at least one card wins outright; partial
//! results from different strategies are never merged, so a deck always has
//! one consistent provenance. Ids number the records a strategy actually
//! produced (1-based), not the ordinals printed in the text; a malformed
//! line never leaves a gap, and `cards[i].id == i + 1` holds for every deck
//! this module returns.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::card::Card;
use crate::error::DeckError;

/// Line prefix that marks a card record in model output.
const CARD_MARKER: &str = "카드";

/// `[제목] title / [본문] body` on a single line. The slash is optional
/// because models drop it about as often as they keep it.
static RE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[제목\](.*?)\s*/?\s*\[본문\](.*)$").unwrap());

/// `카드 N:` section header, tolerant of spacing (`카드1:`, `카드 12 :`).
static RE_SECTION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"카드\s*\d+\s*:").unwrap());

/// `[제목] … [본문] …` across line boundaries, for the section strategy.
static RE_SECTION_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[제목\](.*?)\[본문\](.*)").unwrap());

type Strategy = fn(&str) -> Vec<Card>;

/// Ordered by strictness: the line grammar binds format tightly, the
/// section grammar only needs the two labels somewhere in each block.
const STRATEGIES: [(&str, Strategy); 2] =
    [("marker-line", parse_marker_lines), ("section", parse_sections)];

/// Parse model text into a deck.
///
/// Tries each strategy in order and returns the first non-empty result.
/// When no strategy recovers a single card the text is logged at debug
/// level and [`DeckError::MalformedContent`] is returned; the raw text
/// never travels inside the error.
pub fn parse_cards(text: &str) -> Result<Vec<Card>, DeckError> {
    for (name, strategy) in STRATEGIES {
        let cards = strategy(text);
        if !cards.is_empty() {
            debug!(strategy = name, cards = cards.len(), "recovered deck");
            return Ok(cards);
        }
    }

    debug!(raw = text, "no parsing strategy recovered any card");
    let marker_lines = text
        .lines()
        .filter(|l| l.trim_start().starts_with(CARD_MARKER))
        .count();
    let sections = split_sections(text).len();
    Err(DeckError::MalformedContent {
        detail: format!("{marker_lines} marker lines, {sections} sections, none parsable"),
    })
}

/// Split text into non-blank blocks between `카드 N:` headers.
///
/// Shared with the enrichment matcher so both stages agree on what a
/// "section" is.
pub(crate) fn split_sections(text: &str) -> Vec<&str> {
    RE_SECTION_HEADER
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

// ── Strategy 1: marker lines ─────────────────────────────────────────────

fn parse_marker_lines(text: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    for line in text.lines() {
        if !line.trim_start().starts_with(CARD_MARKER) {
            continue;
        }
        if let Some(caps) = RE_LINE.captures(line) {
            let id = cards.len() as u32 + 1;
            cards.push(Card::new(id, caps[1].trim(), caps[2].trim()));
        }
    }
    cards
}

// ── Strategy 2: sections ─────────────────────────────────────────────────

fn parse_sections(text: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    for section in split_sections(text) {
        if let Some(caps) = RE_SECTION_BODY.captures(section) {
            let id = cards.len() as u32 + 1;
            cards.push(Card::new(id, caps[1].trim(), caps[2].trim()));
        }
    }
    cards
}

// ── Tests ────────────────────────────────────────────────────────────────
