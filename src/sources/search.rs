//! Stock-photo search across the three supported providers.
//!
//! Each provider gets one request per card (`per_page` capped low) and the
//! first hit wins. The distinction the report cares about: a provider that
//! cannot be reached or answers with an error status is `SourceUnavailable`,
//! a provider that answers cleanly with zero hits is `NoResult`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::card::Card;
use crate::config::{LayoutSettings, SearchProvider};
use crate::error::{CardError, DeckError};
use crate::sources::ImageSource;

const PEXELS_API: &str = "https://api.pexels.com/v1/search";
const PIXABAY_API: &str = "https://pixabay.com/api/";
const UNSPLASH_API: &str = "https://api.unsplash.com/search/photos";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Deserialize)]
struct PexelsSrc {
    large: String,
}

#[derive(Deserialize)]
struct UnsplashResponse {
    #[serde(default)]
    results: Vec<UnsplashResult>,
}

#[derive(Deserialize)]
struct UnsplashResult {
    urls: UnsplashUrls,
}

#[derive(Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Deserialize)]
struct PixabayResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Deserialize)]
struct PixabayHit {
    #[serde(rename = "webformatURL")]
    webformat_url: String,
}

// ── Source ───────────────────────────────────────────────────────────────

/// [`ImageSource`] strategy that queries one stock-photo provider.
///
/// The query for each card is [`Card::search_query`]: the first English
/// keyword when enrichment produced one, the title otherwise.
pub struct SearchImageSource {
    provider: SearchProvider,
    api_key: String,
    client: Client,
}

impl SearchImageSource {
    pub fn new(
        provider: SearchProvider,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, DeckError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DeckError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            provider,
            api_key: api_key.into(),
            client,
        })
    }

    async fn search(&self, card_id: u32, query: &str) -> Result<Option<String>, CardError> {
        match self.provider {
            SearchProvider::Pexels => self.search_pexels(card_id, query).await,
            SearchProvider::Unsplash => self.search_unsplash(card_id, query).await,
            SearchProvider::Pixabay => self.search_pixabay(card_id, query).await,
        }
    }

    async fn search_pexels(&self, card_id: u32, query: &str) -> Result<Option<String>, CardError> {
        let response = self
            .client
            .get(PEXELS_API)
            .query(&[("query", query), ("per_page", "1")])
            .header("Authorization", &self.api_key)
            .send()
            .await
            .map_err(|e| unavailable(card_id, e))?;
        let parsed: PexelsResponse = read_json(card_id, response).await?;
        Ok(parsed.photos.into_iter().next().map(|p| p.src.large))
    }

    async fn search_unsplash(
        &self,
        card_id: u32,
        query: &str,
    ) -> Result<Option<String>, CardError> {
        let response = self
            .client
            .get(UNSPLASH_API)
            .query(&[("query", query), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {}", self.api_key))
            .send()
            .await
            .map_err(|e| unavailable(card_id, e))?;
        let parsed: UnsplashResponse = read_json(card_id, response).await?;
        Ok(parsed.results.into_iter().next().map(|r| r.urls.regular))
    }

    async fn search_pixabay(&self, card_id: u32, query: &str) -> Result<Option<String>, CardError> {
        let response = self
            .client
            .get(PIXABAY_API)
            .query(&[("key", self.api_key.as_str()), ("q", query), ("per_page", "3")])
            .send()
            .await
            .map_err(|e| unavailable(card_id, e))?;
        let parsed: PixabayResponse = read_json(card_id, response).await?;
        Ok(parsed.hits.into_iter().next().map(|h| h.webformat_url))
    }
}

#[async_trait]
impl ImageSource for SearchImageSource {
    fn name(&self) -> &'static str {
        match self.provider {
            SearchProvider::Pixabay => "search:pixabay",
            SearchProvider::Pexels => "search:pexels",
            SearchProvider::Unsplash => "search:unsplash",
        }
    }

    async fn acquire(
        &self,
        card: &Card,
        _layout: &LayoutSettings,
    ) -> Result<Option<String>, CardError> {
        let query = card.search_query();
        debug!(card = card.id, provider = self.provider.as_str(), query, "searching");
        match self.search(card.id, query).await? {
            Some(url) => Ok(Some(url)),
            None => Err(CardError::NoResult {
                card: card.id,
                query: query.to_string(),
            }),
        }
    }
}

fn unavailable(card_id: u32, err: reqwest::Error) -> CardError {
    CardError::SourceUnavailable {
        card: card_id,
        detail: err.to_string(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    card_id: u32,
    response: reqwest::Response,
) -> Result<T, CardError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(CardError::SourceUnavailable {
            card: card_id,
            detail: format!("HTTP {status}: {body}"),
        });
    }
    response.json().await.map_err(|e| CardError::SourceUnavailable {
        card: card_id,
        detail: format!("unreadable response: {e}"),
    })
}

// ── Credential probe ─────────────────────────────────────────────────────

/// Check a provider credential with the cheapest possible request.
///
/// Returns whether the provider answered with a success status. A blank
/// key returns `false` without any request; transport errors also map to
/// `false` - the caller only wants a usable/not-usable answer.
pub async fn test_credential(provider: SearchProvider, api_key: &str) -> bool {
    if api_key.trim().is_empty() {
        return false;
    }
    let Ok(client) = Client::builder().timeout(Duration::from_secs(10)).build() else {
        return false;
    };

    let request = match provider {
        SearchProvider::Pexels => client
            .get(PEXELS_API)
            .query(&[("query", "test"), ("per_page", "1")])
            .header("Authorization", api_key),
        SearchProvider::Unsplash => client
            .get(UNSPLASH_API)
            .query(&[("query", "test"), ("per_page", "1")])
            .header("Authorization", format!("Client-ID {api_key}")),
        SearchProvider::Pixabay => client
            .get(PIXABAY_API)
            .query(&[("key", api_key), ("q", "test")]),
    };

    match request.send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(provider = provider.as_str(), error = %e, "credential probe failed");
            false
        }
    }
}
