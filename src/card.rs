//! Core deck records and stage reports.
//!
//! [`Card`] is the unit every stage operates on: the parser creates them,
//! enrichment and acquisition mutate them in place, export reads them.
//! The stage reports ([`AcquisitionReport`], [`ArchiveExport`],
//! [`DocumentExport`]) carry aggregate outcomes only; the cards themselves
//! stay with the caller.

use serde::{Deserialize, Serialize};

use crate::error::CardError;

/// One card of a deck.
///
/// `id` is a stable 1-based ordinal assigned at parse time. It is never
/// reused or renumbered, so later stages and callers can refer to a card
/// by id across the whole run. Serialises with the camelCase field names
/// the web frontends of this format expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// 1-based position in the deck. `cards[i].id == i + 1` always holds.
    pub id: u32,
    /// Short headline.
    pub title: String,
    /// Two or three lines of body copy.
    pub body: String,
    /// Comma-separated Korean search hints, set by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub korean_keywords: Option<String>,
    /// Comma-separated English search hints, set by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_keywords: Option<String>,
    /// Remote URL or `data:` URI, set by acquisition (or by hand).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Card {
    /// A card with no keywords and no image yet.
    pub fn new(id: u32, title: impl Into<String>, body: impl Into<String>) -> Self {
        Card {
            id,
            title: title.into(),
            body: body.into(),
            korean_keywords: None,
            english_keywords: None,
            image_url: None,
        }
    }

    /// Query string for stock-photo search: the first comma-separated
    /// English keyword, trimmed; the title when no usable keyword exists.
    pub fn search_query(&self) -> &str {
        self.english_keywords
            .as_deref()
            .and_then(|kw| kw.split(',').next())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(&self.title)
    }
}

/// Monotonic progress counter for the acquisition stage.
///
/// `total` is fixed at construction; `current` only ever moves forward,
/// one card at a time, and saturates at `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionProgress {
    pub current: usize,
    pub total: usize,
}

impl AcquisitionProgress {
    pub fn new(total: usize) -> Self {
        AcquisitionProgress { current: 0, total }
    }

    /// Advance by exactly one card. Saturates at `total`.
    pub fn advance(&mut self) {
        if self.current < self.total {
            self.current += 1;
        }
    }

    /// True once every card has been attempted.
    pub fn is_complete(&self) -> bool {
        self.current == self.total
    }
}

/// Aggregate outcome of one acquisition run.
///
/// The cards were mutated in place; this report only says how the run went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionReport {
    /// Cards attempted (the deck size at the start of the run).
    pub total: usize,
    /// Cards that ended the run with an image reference set.
    pub acquired: usize,
    /// Per-card failures, in deck order. Cards that yielded a deliberate
    /// blank (manual slot left empty) appear in neither count.
    pub errors: Vec<CardError>,
    /// Wall-clock duration of the whole run, pacing delays included.
    pub duration_ms: u64,
}

impl AcquisitionReport {
    /// True when no card recorded an error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of cards that recorded an error.
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// A packaged PNG archive produced by [`crate::export::export_archive`].
#[derive(Debug, Clone)]
pub struct ArchiveExport {
    /// Suggested file name, `card-news-<epoch-millis>.zip`.
    pub file_name: String,
    /// The complete ZIP archive bytes.
    pub archive: Vec<u8>,
    /// Cards that made it into the archive.
    pub exported: usize,
    /// Ids of cards that failed to render or fetch, in deck order.
    pub failed_ids: Vec<u32>,
}

/// A standalone HTML document produced by [`crate::export::export_document`].
#[derive(Debug, Clone)]
pub struct DocumentExport {
    /// Suggested file name, always `card-news.html`.
    pub file_name: String,
    /// The complete document, self-contained (inline styles).
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_prefers_first_english_keyword() {
        let mut card = Card::new(1, "건강한 아침", "본문");
        card.english_keywords = Some("morning routine, healthy food, sunrise".into());
        assert_eq!(card.search_query(), "morning routine");
    }

    #[test]
    fn search_query_falls_back_to_title() {
        let card = Card::new(2, "건강한 아침", "본문");
        assert_eq!(card.search_query(), "건강한 아침");

        let mut blank = Card::new(3, "제목", "본문");
        blank.english_keywords = Some("   ,second".into());
        // First segment is blank after trimming, so the title wins.
        assert_eq!(blank.search_query(), "제목");
    }

    #[test]
    fn progress_advances_one_at_a_time_and_saturates() {
        let mut p = AcquisitionProgress::new(2);
        assert!(!p.is_complete());
        p.advance();
        assert_eq!(p.current, 1);
        assert!(!p.is_complete());
        p.advance();
        assert_eq!(p.current, 2);
        assert!(p.is_complete());
        p.advance();
        assert_eq!(p.current, 2, "must saturate at total");
    }

    #[test]
    fn progress_zero_total_is_immediately_complete() {
        let p = AcquisitionProgress::new(0);
        assert!(p.is_complete());
    }

    #[test]
    fn card_serialises_with_camel_case_names() {
        let mut card = Card::new(1, "제목", "본문");
        card.english_keywords = Some("kw".into());
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"englishKeywords\""), "got: {json}");
        assert!(!json.contains("imageUrl"), "unset fields stay absent: {json}");

        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }
}
