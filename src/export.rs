//! Deck export: a ZIP of fixed-resolution PNGs, or one standalone HTML file.
//!
//! Archive export walks the deck strictly in order. Each card gets its own
//! failure boundary: fetch the artwork, snapshot the visual state, strip
//! preview decoration, rasterise on the blocking pool, encode to PNG. A
//! card that fails at any of those steps is recorded and skipped; the batch
//! never aborts early. Only a deck where *every* card failed is a deck-level
//! error, because then there is nothing worth packaging.
//!
//! Successful cards are numbered `card-1.png`, `card-2.png`, … in export
//! order, so a failed card never leaves a hole in the archive's numbering;
//! the gap is reported through `failed_ids` instead.

use crate::card::{ArchiveExport, Card, DocumentExport};
use crate::config::{CardStyle, DeckConfig, ScrollDirection};
use crate::error::{CardError, DeckError};
use crate::fetch::fetch_card_image;
use crate::render::{self, CardVisual};
use ab_glyph::FontVec;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Render every card at the layout's export resolution and package the
/// successes as a ZIP archive of PNGs.
pub async fn export_archive(
    cards: &[Card],
    config: &DeckConfig,
) -> Result<ArchiveExport, DeckError> {
    if cards.is_empty() {
        return Err(DeckError::InvalidConfig("cannot export an empty deck".into()));
    }
    let started = Instant::now();
    let font = Arc::new(render::load_render_font(config)?);
    let resolution = config.layout.aspect_ratio.export_resolution();
    let total = cards.len();
    info!(
        total,
        width = resolution.0,
        height = resolution.1,
        "exporting deck to PNG archive"
    );

    let mut rendered: Vec<(String, Vec<u8>)> = Vec::with_capacity(total);
    let mut errors: Vec<CardError> = Vec::new();

    for card in cards {
        match render_card_png(card, total, config, Arc::clone(&font), resolution).await {
            Ok(png) => {
                let name = format!("card-{}.png", rendered.len() + 1);
                debug!(card = card.id, entry = %name, bytes = png.len(), "card exported");
                rendered.push((name, png));
            }
            Err(e) => {
                warn!(card = e.card(), error = %e, "card export failed; continuing with the rest");
                errors.push(e);
            }
        }
    }

    if rendered.is_empty() {
        let first_error = errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".into());
        return Err(DeckError::AllCardsFailed { total, first_error });
    }

    let archive = write_zip(&rendered)?;
    let file_name = format!("card-news-{}.zip", chrono::Utc::now().timestamp_millis());
    info!(
        exported = rendered.len(),
        failed = errors.len(),
        bytes = archive.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "archive built"
    );
    Ok(ArchiveExport {
        file_name,
        archive,
        exported: rendered.len(),
        failed_ids: errors.iter().map(|e| e.card()).collect(),
    })
}

/// One card, fetch through PNG bytes, inside its own failure boundary.
async fn render_card_png(
    card: &Card,
    total: usize,
    config: &DeckConfig,
    font: Arc<FontVec>,
    resolution: (u32, u32),
) -> Result<Vec<u8>, CardError> {
    let image = fetch_card_image(
        card.id,
        card.image_url.as_deref(),
        config.image_fetch_timeout_secs,
    )
    .await?;

    let visual = CardVisual::snapshot(card, total, image).for_export();
    let layout = config.layout.clone();
    let min_font_px = config.min_font_px;
    let card_id = card.id;

    // Rasterisation is CPU-bound; keep it off the async workers. A panic in
    // the blocking task surfaces at the join and becomes this card's error.
    tokio::task::spawn_blocking(move || {
        let canvas = render::render_card(&visual, &layout, resolution, &font, min_font_px)?;
        let mut buf = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| CardError::RenderFailed {
                card: card_id,
                detail: format!("PNG encode failed: {e}"),
            })?;
        Ok(buf)
    })
    .await
    .map_err(|e| CardError::RenderFailed {
        card: card_id,
        detail: format!("render task panicked: {e}"),
    })?
}

/// [`export_archive`], then write the ZIP to `path`.
pub async fn export_archive_to_file(
    cards: &[Card],
    config: &DeckConfig,
    path: impl AsRef<std::path::Path>,
) -> Result<ArchiveExport, DeckError> {
    let export = export_archive(cards, config).await?;
    write_output(path.as_ref(), &export.archive).await?;
    Ok(export)
}

/// [`export_document`], then write the HTML to `path`.
pub async fn export_document_to_file(
    cards: &[Card],
    config: &DeckConfig,
    path: impl AsRef<std::path::Path>,
) -> Result<DocumentExport, DeckError> {
    let export = export_document(cards, config)?;
    write_output(path.as_ref(), export.html.as_bytes()).await?;
    Ok(export)
}

/// Atomic write: temp file in the target directory, then rename.
async fn write_output(path: &std::path::Path, bytes: &[u8]) -> Result<(), DeckError> {
    let failed = |e: std::io::Error| DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(failed)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(failed)?;
    Ok(())
}

fn write_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, DeckError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| DeckError::Packaging { detail: e.to_string() })?;
        writer
            .write_all(bytes)
            .map_err(|e| DeckError::Packaging { detail: e.to_string() })?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| DeckError::Packaging { detail: e.to_string() })?;
    Ok(cursor.into_inner())
}

/// Serialise the deck as one self-contained HTML document.
///
/// No external stylesheets or scripts: the style block is inlined and image
/// references are carried exactly as stored, so a deck illustrated with
/// `data:` URIs opens offline. Page-number badges never appear.
pub fn export_document(cards: &[Card], config: &DeckConfig) -> Result<DocumentExport, DeckError> {
    if cards.is_empty() {
        return Err(DeckError::InvalidConfig("cannot export an empty deck".into()));
    }
    let layout = &config.layout;
    let (card_w, card_h) = layout.aspect_ratio.preview_resolution();
    let axis = match layout.scroll_direction {
        ScrollDirection::Horizontal => "horizontal",
        ScrollDirection::Vertical => "vertical",
    };

    let mut sections = String::new();
    for card in cards {
        sections.push_str(&card_section(card, layout.card_style, &gradient_css(config)));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Card News</title>
<style>
body {{ background: #111827; display: flex; justify-content: center; align-items: center; min-height: 100vh; margin: 0; padding: 2rem; font-family: sans-serif; }}
.deck {{ display: flex; gap: 1rem; padding: 1rem; border-radius: 0.5rem; background: rgba(31, 41, 55, 0.5); max-width: 100%; }}
.deck.horizontal {{ flex-direction: row; align-items: center; overflow-x: auto; }}
.deck.vertical {{ flex-direction: column; align-items: center; }}
.card {{ position: relative; overflow: hidden; border-radius: 0.5rem; flex-shrink: 0; width: {card_w}px; height: {card_h}px; box-shadow: 0 10px 15px rgba(0, 0, 0, 0.3); }}
.card h3 {{ margin: 0; }}
.card p {{ margin: 0.5rem 0 0 0; font-size: 0.875rem; }}
.cover {{ position: absolute; inset: 0; width: 100%; height: 100%; object-fit: cover; }}
.veil {{ position: absolute; inset: 0; background: rgba(0, 0, 0, 0.4); }}
.overlay-text {{ position: relative; z-index: 1; display: flex; flex-direction: column; justify-content: flex-end; height: 100%; padding: 2rem; box-sizing: border-box; color: #ffffff; }}
.overlay-text h3 {{ font-size: 1.5rem; text-shadow: 2px 2px 4px rgba(0, 0, 0, 0.7); }}
.overlay-text p {{ text-shadow: 1px 1px 2px rgba(0, 0, 0, 0.8); }}
.placeholder {{ background: #1f2937; color: #374151; display: flex; align-items: center; justify-content: center; font-weight: bold; }}
.photo {{ height: 60%; overflow: hidden; }}
.photo img, .photo .placeholder {{ width: 100%; height: 100%; object-fit: cover; }}
.caption {{ height: 40%; box-sizing: border-box; padding: 1.5rem; display: flex; flex-direction: column; justify-content: center; text-align: center; color: #1f2937; }}
.caption p {{ color: #4b5563; }}
.card.minimalist {{ background: #ffffff; }}
.card.modern {{ background: #ffffff; padding: 1.5rem; box-sizing: border-box; display: flex; flex-direction: column; }}
.card.modern .photo {{ border-radius: 0.375rem; }}
.card.modern .caption {{ height: auto; flex: 1; padding: 1.5rem 0 0 0; }}
.card.textfocus {{ background: #1f2937; display: flex; flex-direction: column; justify-content: center; align-items: center; text-align: center; padding: 2rem; box-sizing: border-box; }}
.card.textfocus .avatar {{ width: 6rem; height: 6rem; border-radius: 50%; object-fit: cover; border: 4px solid #374151; margin-bottom: 1.5rem; flex-shrink: 0; }}
.card.textfocus h3 {{ color: #a5b4fc; font-size: 1.25rem; }}
.card.textfocus p {{ color: #d1d5db; }}
</style>
</head>
<body>
<div class="deck {axis}">
{sections}</div>
</body>
</html>
"#
    );

    Ok(DocumentExport {
        file_name: "card-news.html".into(),
        html,
    })
}

fn gradient_css(config: &DeckConfig) -> String {
    let to_rgba = |hex: &str, alpha: f32| match render::parse_hex_color(hex) {
        Some(c) => format!("rgba({}, {}, {}, {alpha})", c[0], c[1], c[2]),
        None => format!("rgba(0, 0, 0, {alpha})"),
    };
    format!(
        "linear-gradient(to top, {}, {}, transparent)",
        to_rgba(&config.layout.gradient.from, 0.8),
        to_rgba(&config.layout.gradient.to, 0.4),
    )
}

fn card_section(card: &Card, style: CardStyle, gradient: &str) -> String {
    let title = escape_html(&card.title);
    let body = escape_html(&card.body);
    let artwork = |class: &str| match &card.image_url {
        Some(url) => format!(
            r#"<img class="{class}" src="{}" alt="{title}">"#,
            escape_html(url)
        ),
        None => format!(
            r#"<div class="{class} placeholder">Image {}</div>"#,
            card.id
        ),
    };

    match style {
        CardStyle::Classic => format!(
            "<div class=\"card classic\">{}<div class=\"veil\"></div><div class=\"overlay-text\"><h3>{title}</h3><p>{body}</p></div></div>\n",
            artwork("cover")
        ),
        CardStyle::Gradient => format!(
            "<div class=\"card gradient\">{}<div class=\"veil\" style=\"background: {gradient}\"></div><div class=\"overlay-text\"><h3>{title}</h3><p>{body}</p></div></div>\n",
            artwork("cover")
        ),
        CardStyle::Minimalist => format!(
            "<div class=\"card minimalist\"><div class=\"photo\">{}</div><div class=\"caption\"><h3>{title}</h3><p>{body}</p></div></div>\n",
            artwork("")
        ),
        CardStyle::Modern => format!(
            "<div class=\"card modern\"><div class=\"photo\">{}</div><div class=\"caption\"><h3>{title}</h3><p>{body}</p></div></div>\n",
            artwork("")
        ),
        CardStyle::TextFocus => format!(
            "<div class=\"card textfocus\">{}<h3>{title}</h3><p>{body}</p></div>\n",
            artwork("avatar")
        ),
    }
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
