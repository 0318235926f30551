//! Manual pass-through of user-supplied image URLs.

use async_trait::async_trait;

use crate::card::Card;
use crate::config::LayoutSettings;
use crate::error::CardError;
use crate::sources::ImageSource;

/// [`ImageSource`] strategy that hands out caller-provided URLs by deck
/// position: slot 0 feeds card 1, slot 1 feeds card 2, and so on.
///
/// Blank and missing slots yield `Ok(None)` - an intentionally image-less
/// card, not a failure. No validation is performed on the URLs; whatever
/// the caller typed is carried through verbatim.
pub struct ManualImageSource {
    urls: Vec<String>,
}

impl ManualImageSource {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl ImageSource for ManualImageSource {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn acquire(
        &self,
        card: &Card,
        _layout: &LayoutSettings,
    ) -> Result<Option<String>, CardError> {
        let slot = (card.id as usize).saturating_sub(1);
        Ok(self
            .urls
            .get(slot)
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(String::from))
    }
}
