//! # cardnews
//!
//! Turn a free-text topic into an illustrated card-news deck and export it
//! as a ZIP of fixed-resolution PNGs or one self-contained HTML page.
//!
//! ## Why this crate?
//!
//! Generative models are good at drafting card decks and terrible at
//! formatting them. The text comes back loosely structured, and the image
//! APIs that illustrate it fail for individual cards. This crate absorbs
//! both: a forgiving strategy ladder recovers cards from drifting output,
//! and a strictly sequential per-card pipeline keeps one failed image from
//! sinking the deck. Export then re-renders every card offscreen at the
//! target resolution, so "save my deck" produces the same pixels no matter
//! what screen the deck was previewed on.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Generate  model drafts 5–8 cards (카드 N: [제목] … [본문] …)
//!  ├─ 2. Parse     marker-line strategy, then section strategy, never both
//!  ├─ 3. Enrich    per-card 🇰🇷/🇺🇸 search keywords, matched by position
//!  ├─ 4. Acquire   one image per card, sequential, failures isolated
//!  └─ 5. Export    fixed-resolution PNGs in a ZIP, or standalone HTML
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardnews::{DeckConfig, ImageSourceKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GEMINI_API_KEY is read from the environment.
//!     let config = DeckConfig::builder()
//!         .source_kind(ImageSourceKind::Synthesis)
//!         .build()?;
//!
//!     let mut cards = cardnews::generate_cards("건강한 아침 루틴", &config).await?;
//!     cardnews::enrich_cards(&mut cards, &config).await?;
//!
//!     let report = cardnews::acquire_images(&mut cards, &config).await?;
//!     eprintln!("{} of {} cards illustrated", report.acquired, report.total);
//!
//!     let archive = cardnews::export_archive(&cards, &config).await?;
//!     std::fs::write(&archive.file_name, &archive.archive)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardnews` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cardnews = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing an Image Source
//!
//! | Source | Credential | Character |
//! |--------|------------|-----------|
//! | `Synthesis` | `GEMINI_API_KEY` | Imagen artwork generated per card, styled via [`AiImageStyle`] |
//! | `Search`    | provider API key | First stock-photo hit from Pixabay / Pexels / Unsplash |
//! | `Manual`    | none             | Caller-supplied URLs mapped to cards by position |
//!
//! Cards whose source fails keep going as text-only cards; the deck renders
//! them with a placeholder panel rather than dropping them.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod card;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod render;
pub mod sources;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use card::{AcquisitionProgress, AcquisitionReport, ArchiveExport, Card, DocumentExport};
pub use config::{
    AiImageStyle, AspectRatio, CardStyle, DeckConfig, DeckConfigBuilder, GradientColors,
    ImageSourceKind, LayoutSettings, ScrollDirection, SearchProvider,
};
pub use error::{CardError, DeckError};
pub use export::{
    export_archive, export_archive_to_file, export_document, export_document_to_file,
};
pub use fetch::fetch_card_image;
pub use generate::{enrich_cards, generate_cards};
pub use pipeline::acquire::{acquire_images, acquire_with_source};
pub use pipeline::parse::parse_cards;
pub use progress::{AcquisitionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use render::{load_render_font, render_card, CardVisual};
pub use sources::{resolve_source, resolve_text_generator, ImageSource, TextGenerator};
