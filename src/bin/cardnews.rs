//! CLI binary for cardnews.
//!
//! A thin shim over the library crate that maps CLI flags to `DeckConfig`
//! and runs the pipeline from topic to exported deck.

use anyhow::{Context, Result};
use cardnews::sources::test_credential;
use cardnews::{
    acquire_images, enrich_cards, export_archive, export_archive_to_file,
    export_document_to_file, generate_cards, AcquisitionProgressCallback, AiImageStyle,
    AspectRatio, CardStyle, DeckConfig, ImageSourceKind, ProgressCallback, ScrollDirection,
    SearchProvider,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-card log
/// lines using [indicatif]. Acquisition is strictly sequential, so a single
/// start-time slot is enough.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the card currently in flight.
    current_start: Mutex<Option<Instant>>,
    /// Count of cards that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_acquisition_start` (called before any card is attempted).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_acquisition_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Writing copy…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current_start: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} cards  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Sourcing");
        self.bar.reset_eta();
    }

    fn take_elapsed(&self) -> f64 {
        self.current_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl AcquisitionProgressCallback for CliProgressCallback {
    fn on_acquisition_start(&self, total: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual deck size.
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sourcing images for {total} cards…"))
        ));
    }

    fn on_card_start(&self, card_id: u32, _total: usize) {
        *self.current_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("card {card_id}"));
    }

    fn on_card_complete(&self, card_id: u32, total: usize, image_set: bool) {
        let elapsed = self.take_elapsed();
        let outcome = if image_set { "image set" } else { "left blank" };

        self.bar.println(format!(
            "  {} Card {:>2}/{:<2}  {:<10}  {}",
            green("✓"),
            card_id,
            total,
            dim(outcome),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_card_error(&self, card_id: u32, total: usize, error: &str) {
        let elapsed = self.take_elapsed();
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy. Messages
        // carry Korean text, so cut on characters, not bytes.
        let msg = if error.chars().count() > 80 {
            let short: String = error.chars().take(79).collect();
            format!("{short}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Card {:>2}/{:<2}  {}  {}",
            red("✗"),
            card_id,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_acquisition_complete(&self, total: usize, acquired: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} cards sourced  ({} with an image)",
                green("✔"),
                bold(&total.to_string()),
                acquired,
            );
        } else {
            eprintln!(
                "{} {}/{} cards sourced  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&total.saturating_sub(failed).to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Synthesised images (needs GEMINI_API_KEY)
  cardnews "아침 루틴 만들기"

  # Stock photos from Pexels (needs PEXELS_API_KEY)
  cardnews --source search --provider pexels "재택근무 집중력"

  # Hand-picked images, one URL per card position (blank skips a card)
  cardnews --source manual \
      --image-url https://example.com/1.jpg \
      --image-url "" \
      --image-url https://example.com/3.jpg \
      "프로젝트 회고"

  # Portrait deck in the gradient style with custom colours
  cardnews --aspect portrait --style gradient \
      --gradient-from "#0f172a" --gradient-to "#38bdf8" "수면 습관"

  # Standalone HTML document instead of the PNG archive
  cardnews --html deck.html "면접 준비 체크리스트"

  # JSON run summary on stdout (deck, keywords, per-card errors)
  cardnews --json "휴가지 추천" > run.json

  # Check a provider key without generating anything
  cardnews --test-credential pixabay

IMAGE SOURCES:
  synthesis   Generate one image per card with the Imagen API (default)
  search      Query a stock-photo provider with each card's keywords
  manual      Use --image-url values by position; blanks stay empty

SEARCH PROVIDERS:
  pixabay     PIXABAY_API_KEY
  pexels      PEXELS_API_KEY
  unsplash    UNSPLASH_API_KEY  (Access Key)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Text generation, keywords and image synthesis
  PIXABAY_API_KEY     Pixabay credential for --source search
  PEXELS_API_KEY      Pexels credential for --source search
  UNSPLASH_API_KEY    Unsplash credential for --source search
  CARDNEWS_FONT       Font file used for export rendering

SETUP:
  1. Set the key:     export GEMINI_API_KEY=...
  2. Generate:        cardnews "주제" -o deck.zip

  Export renders Hangul text, so a font with Korean coverage must be
  installed (Noto Sans KR, NanumGothic or similar) or supplied with
  --font /path/to/font.ttf.
"##;

/// Generate Korean card-news decks from a single topic.
#[derive(Parser, Debug)]
#[command(
    name = "cardnews",
    version,
    about = "Generate Korean card-news decks from a single topic",
    long_about = "Generate a complete card-news deck from a single topic: Gemini writes the card \
copy and search keywords, images come from Imagen synthesis, a stock-photo provider, or \
hand-picked URLs, and the deck is exported as a ZIP of PNG cards or a standalone HTML document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Deck topic, e.g. "아침 루틴 만들기".
    #[arg(required_unless_present = "test_credential")]
    topic: Option<String>,

    /// Write the PNG archive to this file instead of ./card-news-<millis>.zip.
    #[arg(short, long, env = "CARDNEWS_OUTPUT")]
    output: Option<PathBuf>,

    /// Write a standalone HTML document to FILE instead of the archive
    /// (add -o to write both).
    #[arg(long, env = "CARDNEWS_HTML", value_name = "FILE")]
    html: Option<PathBuf>,

    /// Image source: synthesis, search, manual.
    #[arg(long, env = "CARDNEWS_SOURCE", value_enum, default_value = "synthesis")]
    source: SourceArg,

    /// Style prefix for synthesised images.
    #[arg(long, env = "CARDNEWS_AI_STYLE", value_enum, default_value = "photorealistic")]
    ai_style: AiStyleArg,

    /// Stock-photo provider for --source search.
    #[arg(long, env = "CARDNEWS_PROVIDER", value_enum)]
    provider: Option<ProviderArg>,

    /// Image URL for the next deck position with --source manual
    /// (repeatable; an empty value leaves that card without an image).
    #[arg(long = "image-url", value_name = "URL")]
    image_urls: Vec<String>,

    /// Card aspect ratio: square (1080×1080), landscape (1280×720),
    /// portrait (720×1280).
    #[arg(long, env = "CARDNEWS_ASPECT", value_enum, default_value = "square")]
    aspect: AspectArg,

    /// Scroll axis of the HTML document.
    #[arg(long, env = "CARDNEWS_SCROLL", value_enum, default_value = "horizontal")]
    scroll: ScrollArg,

    /// Card style applied to the whole deck.
    #[arg(long, env = "CARDNEWS_STYLE", value_enum, default_value = "classic")]
    style: StyleArg,

    /// Gradient start colour for --style gradient (#rrggbb).
    #[arg(long, value_name = "HEX", default_value = "#4338ca")]
    gradient_from: String,

    /// Gradient end colour for --style gradient (#rrggbb).
    #[arg(long, value_name = "HEX", default_value = "#8b5cf6")]
    gradient_to: String,

    /// Text model ID.
    #[arg(long, env = "CARDNEWS_TEXT_MODEL")]
    text_model: Option<String>,

    /// Image-synthesis model ID.
    #[arg(long, env = "CARDNEWS_IMAGE_MODEL")]
    image_model: Option<String>,

    /// Font file for export rendering (needs Hangul coverage).
    #[arg(long, env = "CARDNEWS_FONT", value_name = "FILE")]
    font: Option<PathBuf>,

    /// Delay between consecutive card acquisitions in milliseconds.
    #[arg(long, env = "CARDNEWS_PACING_MS", default_value_t = 200)]
    pacing_ms: u64,

    /// Per-API-call timeout in seconds.
    #[arg(long, env = "CARDNEWS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Per-image download timeout at export time, in seconds.
    #[arg(long, env = "CARDNEWS_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Print a structured JSON run summary to stdout.
    #[arg(long, env = "CARDNEWS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CARDNEWS_NO_PROGRESS")]
    no_progress: bool,

    /// Verify the API key for a search provider and exit.
    #[arg(long, value_enum, value_name = "PROVIDER")]
    test_credential: Option<ProviderArg>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDNEWS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CARDNEWS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SourceArg {
    Synthesis,
    Search,
    Manual,
}

impl From<SourceArg> for ImageSourceKind {
    fn from(v: SourceArg) -> Self {
        match v {
            SourceArg::Synthesis => ImageSourceKind::Synthesis,
            SourceArg::Search => ImageSourceKind::Search,
            SourceArg::Manual => ImageSourceKind::Manual,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AiStyleArg {
    Photorealistic,
    DigitalArt,
    Minimalist,
}

impl From<AiStyleArg> for AiImageStyle {
    fn from(v: AiStyleArg) -> Self {
        match v {
            AiStyleArg::Photorealistic => AiImageStyle::Photorealistic,
            AiStyleArg::DigitalArt => AiImageStyle::DigitalArt,
            AiStyleArg::Minimalist => AiImageStyle::Minimalist,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProviderArg {
    Pixabay,
    Pexels,
    Unsplash,
}

impl From<ProviderArg> for SearchProvider {
    fn from(v: ProviderArg) -> Self {
        match v {
            ProviderArg::Pixabay => SearchProvider::Pixabay,
            ProviderArg::Pexels => SearchProvider::Pexels,
            ProviderArg::Unsplash => SearchProvider::Unsplash,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AspectArg {
    Square,
    Landscape,
    Portrait,
}

impl From<AspectArg> for AspectRatio {
    fn from(v: AspectArg) -> Self {
        match v {
            AspectArg::Square => AspectRatio::Square,
            AspectArg::Landscape => AspectRatio::Landscape,
            AspectArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ScrollArg {
    Horizontal,
    Vertical,
}

impl From<ScrollArg> for ScrollDirection {
    fn from(v: ScrollArg) -> Self {
        match v {
            ScrollArg::Horizontal => ScrollDirection::Horizontal,
            ScrollArg::Vertical => ScrollDirection::Vertical,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    Classic,
    Minimalist,
    Modern,
    Gradient,
    TextFocus,
}

impl From<StyleArg> for CardStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::Classic => CardStyle::Classic,
            StyleArg::Minimalist => CardStyle::Minimalist,
            StyleArg::Modern => CardStyle::Modern,
            StyleArg::Gradient => CardStyle::Gradient,
            StyleArg::TextFocus => CardStyle::TextFocus,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential check mode ────────────────────────────────────────────
    if let Some(provider_arg) = cli.test_credential {
        let provider: SearchProvider = provider_arg.into();
        let key = std::env::var(provider.env_var()).unwrap_or_default();
        if key.trim().is_empty() {
            eprintln!("{} {} is not set", red("✘"), bold(provider.env_var()));
            std::process::exit(1);
        }
        if test_credential(provider, &key).await {
            println!("{} {} accepted the key", green("✔"), bold(provider.as_str()));
            return Ok(());
        }
        eprintln!("{} {} rejected the key", red("✘"), bold(provider.as_str()));
        std::process::exit(1);
    }

    let topic = cli.topic.as_deref().context("a deck topic is required")?;

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar starts as a spinner (deck size unknown until the
    // copy is written); `on_acquisition_start` resizes it to the real total.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn AcquisitionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Write the copy ───────────────────────────────────────────────────
    let mut cards = generate_cards(topic, &config)
        .await
        .context("Content generation failed")?;

    enrich_cards(&mut cards, &config)
        .await
        .context("Keyword generation failed")?;

    // ── Source the images ────────────────────────────────────────────────
    let report = acquire_images(&mut cards, &config)
        .await
        .context("Image acquisition failed")?;

    // ── Export ───────────────────────────────────────────────────────────
    let document_path = if let Some(ref path) = cli.html {
        export_document_to_file(&cards, &config, path)
            .await
            .context("HTML export failed")?;
        Some(path.clone())
    } else {
        None
    };

    // The archive is the default product; --html alone replaces it, --html
    // together with -o writes both.
    let archive = if cli.html.is_none() || cli.output.is_some() {
        let (export, path) = if let Some(ref path) = cli.output {
            let export = export_archive_to_file(&cards, &config, path)
                .await
                .context("Archive export failed")?;
            (export, path.clone())
        } else {
            let export = export_archive(&cards, &config)
                .await
                .context("Archive export failed")?;
            let path = PathBuf::from(&export.file_name);
            tokio::fs::write(&path, &export.archive)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            (export, path)
        };
        Some((export, path))
    } else {
        None
    };

    // Summary lines (the callback already printed the per-card log).
    if !cli.quiet {
        if let Some((ref export, ref path)) = archive {
            eprintln!(
                "{}  {}/{} cards  →  {}",
                if export.failed_ids.is_empty() {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                export.exported,
                cards.len(),
                bold(&path.display().to_string()),
            );
        }
        if let Some(ref path) = document_path {
            eprintln!(
                "{}  deck document  →  {}",
                green("✔"),
                bold(&path.display().to_string()),
            );
        }
    }

    if cli.json {
        let summary = serde_json::json!({
            "topic": topic,
            "cards": cards,
            "acquisition": report,
            "archive": archive.as_ref().map(|(export, path)| {
                serde_json::json!({
                    "path": path.display().to_string(),
                    "exported": export.exported,
                    "failedIds": export.failed_ids,
                    "bytes": export.archive.len(),
                })
            }),
            "document": document_path.as_ref().map(|p| p.display().to_string()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    }

    Ok(())
}

/// Map CLI args to `DeckConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .scroll_direction(cli.scroll.into())
        .aspect_ratio(cli.aspect.into())
        .card_style(cli.style.into())
        .gradient(cli.gradient_from.clone(), cli.gradient_to.clone())
        .source_kind(cli.source.into())
        .ai_style(cli.ai_style.into())
        .card_pacing_ms(cli.pacing_ms)
        .api_timeout_secs(cli.api_timeout)
        .image_fetch_timeout_secs(cli.fetch_timeout);

    if let Some(provider) = cli.provider {
        builder = builder.provider(provider.into());
    }
    if !cli.image_urls.is_empty() {
        builder = builder.manual_urls(cli.image_urls.clone());
    }
    if let Some(ref model) = cli.text_model {
        builder = builder.text_model(model.clone());
    }
    if let Some(ref model) = cli.image_model {
        builder = builder.image_model(model.clone());
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}
