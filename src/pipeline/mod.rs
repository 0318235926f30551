//! Pipeline stages for turning model text into an illustrated deck.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different image source) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! parse ──▶ enrich ──▶ acquire
//! (text→cards) (keywords) (images)
//! ```
//!
//! 1. [`parse`]   - recover `Card` records from loosely-formatted model text
//!    (two strategies, first non-empty result wins)
//! 2. [`enrich`]  - align a second model response with the deck and attach
//!    per-card search keywords
//! 3. [`acquire`] - walk the deck in order and attach one image reference
//!    per card; the only stage with network I/O

pub mod acquire;
pub mod enrich;
pub mod parse;
