//! Gemini REST client: text generation and image synthesis.
//!
//! Talks to the Generative Language API directly with typed request and
//! response bodies: `generateContent` for text, `predict` for Imagen
//! synthesis. Auth is the `x-goog-api-key` header on every call. Calls are
//! not retried; a failed call surfaces as an error for its stage to handle.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::card::Card;
use crate::config::{AiImageStyle, AspectRatio, DeckConfig, LayoutSettings};
use crate::error::{CardError, DeckError};
use crate::prompts;
use crate::sources::{ImageSource, TextGenerator};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Minimal Gemini API client shared by text generation and synthesis.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    /// Build a client using the models and timeout from `config`.
    pub fn new(api_key: impl Into<String>, config: &DeckConfig) -> Result<Self, DeckError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| DeckError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    /// Generate a text completion for `prompt`.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, DeckError> {
        let url = format!("{API_BASE}/models/{}:generateContent", self.text_model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeckError::ApiError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeckError::ApiError {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| DeckError::ApiError {
                message: format!("unreadable response: {e}"),
            })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DeckError::ApiError {
                message: "empty completion".into(),
            });
        }
        debug!(model = %self.text_model, bytes = text.len(), "text generated");
        Ok(text)
    }

    /// Synthesise one image and return it as a `data:` URI.
    pub async fn synthesize_image(
        &self,
        prompt: &str,
        aspect: AspectRatio,
    ) -> Result<String, DeckError> {
        let url = format!("{API_BASE}/models/{}:predict", self.image_model);
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect.api_value().to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeckError::ApiError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeckError::ApiError {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: PredictResponse = response.json().await.map_err(|e| DeckError::ApiError {
            message: format!("unreadable response: {e}"),
        })?;

        let prediction = parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| DeckError::ApiError {
                message: "no image in response".into(),
            })?;
        let encoded = prediction
            .bytes_base64_encoded
            .filter(|b| !b.is_empty())
            .ok_or_else(|| DeckError::ApiError {
                message: "no image bytes in response".into(),
            })?;

        // Reject undecodable payloads here rather than at export time.
        base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| DeckError::ApiError {
                message: format!("image bytes are not base64: {e}"),
            })?;

        let mime = prediction.mime_type.unwrap_or_else(|| "image/jpeg".into());
        debug!(model = %self.image_model, %mime, "image synthesised");
        Ok(format!("data:{mime};base64,{encoded}"))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, DeckError> {
        self.generate_text(prompt).await
    }
}

/// [`ImageSource`] strategy that synthesises one image per card.
///
/// The prompt is the configured style prefix plus the card's title and
/// English keywords; the layout's aspect ratio is passed to the API so the
/// synthesised image matches the card surface.
pub struct GeminiImageSource {
    client: GeminiClient,
    style: AiImageStyle,
}

impl GeminiImageSource {
    pub fn new(client: GeminiClient, style: AiImageStyle) -> Self {
        Self { client, style }
    }
}

#[async_trait]
impl ImageSource for GeminiImageSource {
    fn name(&self) -> &'static str {
        "synthesis"
    }

    async fn acquire(
        &self,
        card: &Card,
        layout: &LayoutSettings,
    ) -> Result<Option<String>, CardError> {
        let prompt = prompts::synthesis_prompt(card, self.style);
        let data_uri = self
            .client
            .synthesize_image(&prompt, layout.aspect_ratio)
            .await
            .map_err(|e| CardError::SourceUnavailable {
                card: card.id,
                detail: e.to_string(),
            })?;
        Ok(Some(data_uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_request_serialises_camel_case() {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: "a cat".into(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "9:16".into(),
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"sampleCount\":1"), "got: {json}");
        assert!(json.contains("\"aspectRatio\":\"9:16\""), "got: {json}");
    }

    #[test]
    fn generate_content_response_parses_candidate_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "카드 1: "}, {"text": "[제목] a / [본문] b"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap();
        assert_eq!(text, "카드 1: [제목] a / [본문] b");
    }

    #[test]
    fn predict_response_tolerates_missing_fields() {
        let parsed: PredictResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.predictions.is_empty());

        let parsed: PredictResponse =
            serde_json::from_str(r#"{"predictions": [{"mimeType": "image/png"}]}"#).unwrap();
        assert!(parsed.predictions[0].bytes_base64_encoded.is_none());
    }
}
