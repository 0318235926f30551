//! Configuration types for deck generation and export.
//!
//! All run behaviour is controlled through [`DeckConfig`], built via its
//! [`DeckConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across stages, log them, and diff two runs to understand
//! why their outputs differ.
//!
//! [`LayoutSettings`] is split out because it fixes the *visual* identity
//! of a deck: every card of a deck is rendered with the same layout, and
//! export re-renders from it at a different resolution without touching the
//! rest of the config.

use crate::error::DeckError;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::sources::{ImageSource, TextGenerator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Scroll axis of the final deck presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    /// Cards laid out left-to-right (default).
    #[default]
    Horizontal,
    /// Cards laid out top-to-bottom.
    Vertical,
}

/// Card aspect ratio. Fixes both the export and the preview resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    /// 1:1 (default).
    #[default]
    Square,
    /// 16:9.
    Landscape,
    /// 9:16.
    Portrait,
}

impl AspectRatio {
    /// Fixed export resolution in pixels. Export output is always exactly
    /// this size, regardless of any preview the caller rendered.
    pub fn export_resolution(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1080, 1080),
            AspectRatio::Landscape => (1280, 720),
            AspectRatio::Portrait => (720, 1280),
        }
    }

    /// Reduced resolution for interactive previews.
    pub fn preview_resolution(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (540, 540),
            AspectRatio::Landscape => (640, 360),
            AspectRatio::Portrait => (360, 640),
        }
    }

    /// Ratio string the image-synthesis API expects.
    pub fn api_value(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

/// Visual style applied identically to every card of a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStyle {
    /// Full-bleed image, darkened, text bottom-left (default).
    #[default]
    Classic,
    /// White card, image on top, centred text below.
    Minimalist,
    /// White card with padding and a rounded image panel.
    Modern,
    /// Full-bleed image under a two-colour gradient veil.
    Gradient,
    /// Dark card, small round image, text front and centre.
    TextFocus,
}

/// Two-colour veil for [`CardStyle::Gradient`], as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientColors {
    pub from: String,
    pub to: String,
}

impl Default for GradientColors {
    fn default() -> Self {
        GradientColors {
            from: "#4338ca".into(),
            to: "#8b5cf6".into(),
        }
    }
}

/// Deck-wide presentation settings.
///
/// Captured once per deck; every card is rendered from the same layout, and
/// export re-renders from it at [`AspectRatio::export_resolution`] rather
/// than scaling up whatever preview happened to be on screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSettings {
    pub scroll_direction: ScrollDirection,
    pub aspect_ratio: AspectRatio,
    pub card_style: CardStyle,
    pub gradient: GradientColors,
}

/// Style prefix for synthesised images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiImageStyle {
    /// Cinematic photograph look (default).
    #[default]
    Photorealistic,
    /// Vibrant illustration.
    DigitalArt,
    /// Clean vector look.
    Minimalist,
}

/// Stock-photo search provider. Closed set; one API credential each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Pixabay,
    Pexels,
    Unsplash,
}

impl SearchProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchProvider::Pixabay => "pixabay",
            SearchProvider::Pexels => "pexels",
            SearchProvider::Unsplash => "unsplash",
        }
    }

    /// Environment variable consulted when no key is set in the config.
    pub fn env_var(self) -> &'static str {
        match self {
            SearchProvider::Pixabay => "PIXABAY_API_KEY",
            SearchProvider::Pexels => "PEXELS_API_KEY",
            SearchProvider::Unsplash => "UNSPLASH_API_KEY",
        }
    }
}

/// Which image-acquisition strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSourceKind {
    /// Generate images with the synthesis API.
    Synthesis,
    /// Search a stock-photo provider.
    Search,
    /// Pass through user-supplied URLs, one per deck position.
    Manual,
}

/// Configuration for a full deck run.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use cardnews::{AspectRatio, CardStyle, DeckConfig, ImageSourceKind};
///
/// let config = DeckConfig::builder()
///     .aspect_ratio(AspectRatio::Portrait)
///     .card_style(CardStyle::Gradient)
///     .source_kind(ImageSourceKind::Search)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// Deck-wide presentation settings. Default: horizontal, square, classic.
    pub layout: LayoutSettings,

    /// Acquisition strategy. `None` means no source was selected; the
    /// acquisition stage refuses to start (fails before touching any card).
    pub source_kind: Option<ImageSourceKind>,

    /// Style prefix for synthesised images. Default: photorealistic.
    pub ai_style: AiImageStyle,

    /// Stock-photo provider for [`ImageSourceKind::Search`]. Selecting the
    /// search strategy without a provider is a configuration error.
    pub provider: Option<SearchProvider>,

    /// Credential for the selected search provider. If `None`, the
    /// provider's environment variable is consulted at resolve time.
    pub search_api_key: Option<String>,

    /// Credential for the text/synthesis API. If `None`, `GEMINI_API_KEY`
    /// is consulted at resolve time.
    pub gemini_api_key: Option<String>,

    /// Text model identifier. Default: "gemini-2.5-flash".
    pub text_model: String,

    /// Image-synthesis model identifier. Default: "imagen-4.0-generate-001".
    pub image_model: String,

    /// User-supplied image URLs for [`ImageSourceKind::Manual`], by deck
    /// position (index 0 is card 1). Blank entries leave that card without
    /// an image on purpose.
    pub manual_urls: Vec<String>,

    /// Pre-constructed image source. Takes precedence over `source_kind`.
    pub image_source: Option<Arc<dyn ImageSource>>,

    /// Pre-constructed text generator. Takes precedence over the API key.
    pub text_generator: Option<Arc<dyn TextGenerator>>,

    /// Progress observer for the acquisition stage. Default: no-op.
    pub progress: ProgressCallback,

    /// Fixed delay between consecutive card acquisitions in milliseconds.
    /// Default: 200.
    ///
    /// This is pacing, not backoff: it runs after every card, success or
    /// failure, to stay under provider rate limits without retry logic.
    pub card_pacing_ms: u64,

    /// Per-API-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Timeout for fetching one card's image bytes at export time, in
    /// seconds. Default: 30.
    pub image_fetch_timeout_secs: u64,

    /// Explicit font file for export rendering. If `None`, system fonts
    /// are searched for Hangul-capable sans faces.
    pub font_path: Option<PathBuf>,

    /// Smallest font size auto-fit may shrink text to, in pixels.
    /// Default: 8. Text that still overflows at this size is clipped.
    pub min_font_px: u32,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            layout: LayoutSettings::default(),
            source_kind: None,
            ai_style: AiImageStyle::default(),
            provider: None,
            search_api_key: None,
            gemini_api_key: None,
            text_model: "gemini-2.5-flash".into(),
            image_model: "imagen-4.0-generate-001".into(),
            manual_urls: Vec::new(),
            image_source: None,
            text_generator: None,
            progress: Arc::new(NoopProgressCallback),
            card_pacing_ms: 200,
            api_timeout_secs: 60,
            image_fetch_timeout_secs: 30,
            font_path: None,
            min_font_px: 8,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("layout", &self.layout)
            .field("source_kind", &self.source_kind)
            .field("ai_style", &self.ai_style)
            .field("provider", &self.provider)
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("manual_urls", &self.manual_urls.len())
            .field("image_source", &self.image_source.as_ref().map(|s| s.name()))
            .field("text_generator", &self.text_generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("card_pacing_ms", &self.card_pacing_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("image_fetch_timeout_secs", &self.image_fetch_timeout_secs)
            .field("font_path", &self.font_path)
            .field("min_font_px", &self.min_font_px)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DeckConfig`].
#[derive(Debug)]
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl DeckConfigBuilder {
    pub fn layout(mut self, layout: LayoutSettings) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn scroll_direction(mut self, dir: ScrollDirection) -> Self {
        self.config.layout.scroll_direction = dir;
        self
    }

    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.config.layout.aspect_ratio = ratio;
        self
    }

    pub fn card_style(mut self, style: CardStyle) -> Self {
        self.config.layout.card_style = style;
        self
    }

    pub fn gradient(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config.layout.gradient = GradientColors {
            from: from.into(),
            to: to.into(),
        };
        self
    }

    pub fn source_kind(mut self, kind: ImageSourceKind) -> Self {
        self.config.source_kind = Some(kind);
        self
    }

    pub fn ai_style(mut self, style: AiImageStyle) -> Self {
        self.config.ai_style = style;
        self
    }

    pub fn provider(mut self, provider: SearchProvider) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.search_api_key = Some(key.into());
        self
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn manual_urls(mut self, urls: Vec<String>) -> Self {
        self.config.manual_urls = urls;
        self
    }

    pub fn image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.config.image_source = Some(source);
        self
    }

    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.text_generator = Some(generator);
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = callback;
        self
    }

    pub fn card_pacing_ms(mut self, ms: u64) -> Self {
        self.config.card_pacing_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn image_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = Some(path.into());
        self
    }

    pub fn min_font_px(mut self, px: u32) -> Self {
        self.config.min_font_px = px.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, DeckError> {
        let c = &self.config;
        for hex in [&c.layout.gradient.from, &c.layout.gradient.to] {
            if crate::render::parse_hex_color(hex).is_none() {
                return Err(DeckError::InvalidConfig(format!(
                    "gradient colour '{hex}' is not a #rrggbb value"
                )));
            }
        }
        if c.source_kind == Some(ImageSourceKind::Search) && c.provider.is_none() {
            return Err(DeckError::InvalidConfig(
                "search source selected but no provider chosen".into(),
            ));
        }
        Ok(self.config)
    }
}
