//! Artwork resolution: turn a card's image reference into decoded pixels.
//!
//! References come in two shapes. Synthesis produces `data:` URIs with the
//! artwork inline, stock search and manual entry produce `http(s)` URLs.
//! Either way the raster step only ever sees fully decoded pixels, so a
//! half-downloaded or corrupt asset can never end up inside an exported
//! card; it surfaces as that card's failure instead.

use crate::error::CardError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::time::Duration;
use tracing::debug;

pub(crate) fn is_data_uri(reference: &str) -> bool {
    reference.starts_with("data:")
}

pub(crate) fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Resolve a card's image reference into a decoded image.
///
/// A card with no reference resolves to `Ok(None)`; the renderer draws its
/// placeholder panel and the card still exports. A reference that cannot be
/// loaded or decoded is a per-card failure.
pub async fn fetch_card_image(
    card_id: u32,
    reference: Option<&str>,
    timeout_secs: u64,
) -> Result<Option<DynamicImage>, CardError> {
    let Some(reference) = reference else {
        return Ok(None);
    };

    let bytes = if is_data_uri(reference) {
        decode_data_uri(card_id, reference)?
    } else if is_url(reference) {
        download(card_id, reference, timeout_secs).await?
    } else {
        return Err(CardError::SourceUnavailable {
            card: card_id,
            detail: format!(
                "unsupported image reference scheme: {}",
                reference.chars().take(32).collect::<String>()
            ),
        });
    };

    let image = image::load_from_memory(&bytes).map_err(|e| CardError::SourceUnavailable {
        card: card_id,
        detail: format!("image data does not decode: {e}"),
    })?;
    debug!(card = card_id, width = image.width(), height = image.height(), "artwork decoded");
    Ok(Some(image))
}

/// Decode the payload of a `data:<mime>;base64,<payload>` reference.
fn decode_data_uri(card_id: u32, reference: &str) -> Result<Vec<u8>, CardError> {
    let (head, payload) = reference
        .split_once(',')
        .ok_or_else(|| CardError::SourceUnavailable {
            card: card_id,
            detail: "data URI has no payload separator".into(),
        })?;
    if !head.contains(";base64") {
        return Err(CardError::SourceUnavailable {
            card: card_id,
            detail: "data URI is not base64-encoded".into(),
        });
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| CardError::SourceUnavailable {
            card: card_id,
            detail: format!("data URI payload is not valid base64: {e}"),
        })
}

/// Download artwork over HTTP with a hard timeout.
async fn download(card_id: u32, url: &str, timeout_secs: u64) -> Result<Vec<u8>, CardError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CardError::SourceUnavailable {
            card: card_id,
            detail: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        let detail = if e.is_timeout() {
            format!("image fetch timed out after {timeout_secs}s")
        } else {
            e.to_string()
        };
        CardError::SourceUnavailable {
            card: card_id,
            detail,
        }
    })?;

    if !response.status().is_success() {
        return Err(CardError::SourceUnavailable {
            card: card_id,
            detail: format!("image fetch returned HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CardError::SourceUnavailable {
            card: card_id,
            detail: e.to_string(),
        })?;
    Ok(bytes.to_vec())
}
