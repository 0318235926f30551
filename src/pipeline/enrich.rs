//! Enrichment: attach search keywords from a second model response.
//!
//! The keyword response echoes the deck as `카드 N:` sections, each holding
//! a quoted Korean and a quoted English keyword list. Matching is
//! **positional**: section *i* enriches card *i*, in deck order. Ordinals
//! printed inside the response are never trusted (models renumber and
//! repeat them), so a reordered response will enrich the wrong cards, which
//! is accepted as the cost of surviving sloppy numbering. Taking
//! `&mut [Card]` makes the no-resize, no-reorder guarantee structural.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::card::Card;
use crate::pipeline::parse::split_sections;

static RE_KOREAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"🇰🇷 한글 검색어: "(.*?)""#).unwrap());

static RE_ENGLISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"🇺🇸 영문 검색어: "(.*?)""#).unwrap());

/// Apply keyword sections to the deck, position by position.
///
/// Either keyword line may be absent from a section; the other is still
/// applied. Excess sections are ignored, and cards beyond the last section
/// keep their fields unchanged. Returns how many cards received at least
/// one keyword list.
pub fn apply_keywords(cards: &mut [Card], text: &str) -> usize {
    let sections = split_sections(text);
    let mut applied = 0;

    for (card, section) in cards.iter_mut().zip(&sections) {
        let korean = RE_KOREAN.captures(section).map(|c| c[1].to_string());
        let english = RE_ENGLISH.captures(section).map(|c| c[1].to_string());

        if korean.is_some() || english.is_some() {
            applied += 1;
        }
        if korean.is_some() {
            card.korean_keywords = korean;
        }
        if english.is_some() {
            card.english_keywords = english;
        }
    }

    debug!(
        cards = cards.len(),
        sections = sections.len(),
        applied,
        "keyword enrichment applied"
    );
    applied
}
