//! Offscreen card rasterisation.
//!
//! The live preview and the export archive are the same drawing: a card's
//! visual state plus the deck layout, rendered onto a fresh surface whose
//! dimensions come from the caller. Nothing here knows about viewports or
//! preview scaling; export simply asks for the full target resolution and
//! previews ask for a smaller one, and each request is a complete re-render
//! rather than a bitmap resize.
//!
//! `CardVisual` is the explicit snapshot of what gets drawn. Taking the
//! snapshot and then applying [`CardVisual::for_export`] is what strips
//! preview-only decoration (the page-number pill), so "what does export
//! remove" is a plain unit-testable transform instead of something buried
//! in the renderer.
//!
//! All geometry is proportional to the surface's short edge, anchored to
//! the preview stylesheet's pixel values at the 540 px square size, so a
//! 1080 px export looks like the preview, only sharper.

pub mod font;
mod surface;
mod text;

pub use font::load_render_font;
pub use surface::parse_hex_color;

use crate::card::Card;
use crate::config::{CardStyle, LayoutSettings};
use crate::error::CardError;
use ab_glyph::FontVec;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::rect::Rect;
use text::Align;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GRAY_900: Rgba<u8> = Rgba([17, 24, 39, 255]);
const GRAY_800: Rgba<u8> = Rgba([31, 41, 55, 255]);
const GRAY_700: Rgba<u8> = Rgba([55, 65, 81, 255]);
const GRAY_600: Rgba<u8> = Rgba([75, 85, 99, 255]);
const GRAY_300: Rgba<u8> = Rgba([209, 213, 219, 255]);
const INDIGO_300: Rgba<u8> = Rgba([165, 180, 252, 255]);

/// Everything the renderer needs to draw one card, captured up front.
#[derive(Debug, Clone)]
pub struct CardVisual {
    pub id: u32,
    pub title: String,
    pub body: String,
    /// Page-number pill text, present only for preview renders.
    pub badge: Option<String>,
    /// Fully decoded artwork; `None` renders the placeholder panel.
    pub image: Option<DynamicImage>,
}

impl CardVisual {
    /// Capture a card's current state, badge included.
    pub fn snapshot(card: &Card, total: usize, image: Option<DynamicImage>) -> Self {
        CardVisual {
            id: card.id,
            title: card.title.clone(),
            body: card.body.clone(),
            badge: Some(format!("{} / {}", card.id, total)),
            image,
        }
    }

    /// Strip preview-only decoration before export.
    pub fn for_export(mut self) -> Self {
        self.badge = None;
        self
    }
}

/// Render one card onto a fresh surface of exactly `resolution` pixels.
pub fn render_card(
    visual: &CardVisual,
    layout: &LayoutSettings,
    resolution: (u32, u32),
    font: &FontVec,
    min_font_px: u32,
) -> Result<RgbaImage, CardError> {
    let (w, h) = resolution;
    if w == 0 || h == 0 {
        return Err(CardError::RenderFailed {
            card: visual.id,
            detail: format!("surface resolution {w}x{h} is empty"),
        });
    }
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    let unit = w.min(h) as f32;

    match layout.card_style {
        CardStyle::Classic => render_classic(&mut canvas, visual, None, font, min_font_px),
        CardStyle::Gradient => render_classic(&mut canvas, visual, Some(layout), font, min_font_px),
        CardStyle::Minimalist => render_split(&mut canvas, visual, false, font, min_font_px),
        CardStyle::Modern => render_split(&mut canvas, visual, true, font, min_font_px),
        CardStyle::TextFocus => render_text_focus(&mut canvas, visual, font, min_font_px),
    }

    if let Some(badge) = &visual.badge {
        draw_badge(&mut canvas, badge, font, unit);
    }
    surface::round_corners(&mut canvas, (0.015 * unit) as u32);
    Ok(canvas)
}

/// Classic and Gradient share a full-bleed photo with bottom-anchored text;
/// they differ only in the overlay between photo and text.
fn render_classic(
    canvas: &mut RgbaImage,
    visual: &CardVisual,
    gradient: Option<&LayoutSettings>,
    font: &FontVec,
    min_font_px: u32,
) {
    let (w, h) = canvas.dimensions();
    let unit = w.min(h) as f32;
    cover_or_placeholder(canvas, visual, Rect::at(0, 0).of_size(w, h), font, min_font_px);

    match gradient {
        None => surface::shade(canvas, Rgba([0, 0, 0, 102])),
        Some(layout) => {
            // Same fallback the preview uses for an unparsable colour.
            let black = Rgba([0, 0, 0, 255]);
            let from = parse_hex_color(&layout.gradient.from).unwrap_or(black);
            let to = parse_hex_color(&layout.gradient.to).unwrap_or(black);
            surface::vertical_gradient(
                canvas,
                surface::with_alpha(from, 204),
                surface::with_alpha(to, 102),
            );
        }
    }

    let pad = (0.059 * unit) as i32;
    let text_w = w as f32 - 2.0 * pad as f32;
    let avail_h = h as f32 - 2.0 * pad as f32;
    let gap = 0.015 * unit;

    let title = text::fit(
        font,
        &visual.title,
        text_w,
        avail_h * 0.6,
        0.0444 * unit,
        min_font_px,
        1.3,
    );
    let body = text::fit(
        font,
        &visual.body,
        text_w,
        (avail_h * 0.4 - gap).max(0.0),
        0.026 * unit,
        min_font_px,
        1.45,
    );

    let total = title.height() + gap + body.height();
    let y0 = (h as f32 - pad as f32 - total).max(pad as f32) as i32;
    let shadow = ((0.004 * unit) as i32).max(1);

    text::draw_block(
        canvas,
        font,
        &title,
        Rect::at(pad, y0).of_size(text_w as u32, title.height().ceil() as u32 + 2),
        Align::Left,
        WHITE,
        Some((shadow, Rgba([0, 0, 0, 178]))),
    );
    let body_y = y0 + (title.height() + gap) as i32;
    let body_h = (h as i32 - pad - body_y).max(0) as u32;
    text::draw_block(
        canvas,
        font,
        &body,
        Rect::at(pad, body_y).of_size(text_w as u32, body_h),
        Align::Left,
        WHITE,
        Some(((shadow / 2).max(1), Rgba([0, 0, 0, 204]))),
    );
}

/// Minimalist and Modern: photo on top, centred dark text beneath, on a
/// white card. Modern insets everything and rounds the photo panel.
fn render_split(
    canvas: &mut RgbaImage,
    visual: &CardVisual,
    inset_panel: bool,
    font: &FontVec,
    min_font_px: u32,
) {
    let (w, h) = canvas.dimensions();
    let unit = w.min(h) as f32;
    surface::fill_rect(canvas, Rect::at(0, 0).of_size(w, h), WHITE);

    let pad = (0.044 * unit) as i32;
    let (image_rect, zone_top) = if inset_panel {
        let inner_w = (w as i32 - 2 * pad).max(1) as u32;
        let inner_h = (h as i32 - 2 * pad).max(1) as u32;
        let panel_h = ((inner_h as f32 * 0.6) as u32).max(1);
        (
            Rect::at(pad, pad).of_size(inner_w, panel_h),
            pad + panel_h as i32 + pad,
        )
    } else {
        let panel_h = ((h as f32 * 0.6) as u32).max(1);
        (
            Rect::at(0, 0).of_size(w, panel_h),
            panel_h as i32 + pad,
        )
    };

    if inset_panel {
        // Rounded photo panel: compose on its own surface so the corner
        // cut lets the white card show through.
        let mut panel = RgbaImage::from_pixel(image_rect.width(), image_rect.height(), WHITE);
        cover_or_placeholder(
            &mut panel,
            visual,
            Rect::at(0, 0).of_size(image_rect.width(), image_rect.height()),
            font,
            min_font_px,
        );
        surface::round_corners(&mut panel, (0.011 * unit) as u32);
        image::imageops::overlay(canvas, &panel, image_rect.left() as i64, image_rect.top() as i64);
    } else {
        cover_or_placeholder(canvas, visual, image_rect, font, min_font_px);
    }

    let zone_bottom = h as i32 - pad;
    let inner_x = pad;
    let inner_w = (w as i32 - 2 * pad).max(1) as f32;
    let inner_h = (zone_bottom - zone_top).max(1) as f32;
    let gap = 0.015 * unit;

    let title = text::fit(
        font,
        &visual.title,
        inner_w,
        inner_h * 0.55,
        0.037 * unit,
        min_font_px,
        1.3,
    );
    let body = text::fit(
        font,
        &visual.body,
        inner_w,
        (inner_h * 0.45 - gap).max(0.0),
        0.026 * unit,
        min_font_px,
        1.45,
    );

    let total = title.height() + gap + body.height();
    let y0 = zone_top + ((inner_h - total) / 2.0).max(0.0) as i32;

    text::draw_block(
        canvas,
        font,
        &title,
        Rect::at(inner_x, y0).of_size(inner_w as u32, title.height().ceil() as u32 + 2),
        Align::Center,
        GRAY_800,
        None,
    );
    let body_y = y0 + (title.height() + gap) as i32;
    let body_h = (zone_bottom - body_y).max(0) as u32;
    text::draw_block(
        canvas,
        font,
        &body,
        Rect::at(inner_x, body_y).of_size(inner_w as u32, body_h),
        Align::Center,
        GRAY_600,
        None,
    );
}

/// Dark panel, circular avatar, centred indigo title over grey body.
fn render_text_focus(
    canvas: &mut RgbaImage,
    visual: &CardVisual,
    font: &FontVec,
    min_font_px: u32,
) {
    let (w, h) = canvas.dimensions();
    let unit = w.min(h) as f32;
    surface::fill_rect(canvas, Rect::at(0, 0).of_size(w, h), GRAY_800);

    let pad = (0.059 * unit) as i32;
    let radius = (0.06 * unit) as u32;
    let ring = ((0.0074 * unit) as u32).max(1);
    let gap_avatar = 0.03 * unit;
    let gap_body = 0.022 * unit;
    let text_w = w as f32 - 2.0 * pad as f32;

    let title = text::fit(
        font,
        &visual.title,
        text_w,
        h as f32 * 0.3,
        0.037 * unit,
        min_font_px,
        1.3,
    );
    let body = text::fit(
        font,
        &visual.body,
        text_w,
        h as f32 * 0.3,
        0.026 * unit,
        min_font_px,
        1.45,
    );

    let avatar_d = 2.0 * (radius + ring) as f32;
    let stack = avatar_d + gap_avatar + title.height() + gap_body + body.height();
    let y0 = ((h as f32 - stack) / 2.0).max(pad as f32) as i32;

    let center = (w as i32 / 2, y0 + (radius + ring) as i32);
    match &visual.image {
        Some(photo) => surface::draw_avatar(canvas, photo, center, radius, GRAY_700, ring),
        None => {
            let placeholder = placeholder_photo(visual.id, font);
            surface::draw_avatar(canvas, &placeholder, center, radius, GRAY_700, ring);
        }
    }

    let title_y = y0 + (avatar_d + gap_avatar) as i32;
    text::draw_block(
        canvas,
        font,
        &title,
        Rect::at(pad, title_y).of_size(text_w as u32, title.height().ceil() as u32 + 2),
        Align::Center,
        INDIGO_300,
        None,
    );
    let body_y = title_y + (title.height() + gap_body) as i32;
    let body_h = (h as i32 - pad - body_y).max(0) as u32;
    text::draw_block(
        canvas,
        font,
        &body,
        Rect::at(pad, body_y).of_size(text_w as u32, body_h),
        Align::Center,
        GRAY_300,
        None,
    );
}

/// Draw either the card's artwork (cover-fitted) or the placeholder panel.
fn cover_or_placeholder(
    canvas: &mut RgbaImage,
    visual: &CardVisual,
    rect: Rect,
    font: &FontVec,
    min_font_px: u32,
) {
    match &visual.image {
        Some(photo) => surface::draw_cover_image(canvas, photo, rect),
        None => draw_placeholder(canvas, rect, visual.id, font, min_font_px),
    }
}

/// Deterministic stand-in panel for a card with no artwork.
fn draw_placeholder(
    canvas: &mut RgbaImage,
    rect: Rect,
    id: u32,
    font: &FontVec,
    min_font_px: u32,
) {
    surface::fill_rect(canvas, rect, GRAY_800);
    let rmin = rect.width().min(rect.height()) as f32;
    let label = format!("Image {id}");
    let block = text::fit(
        font,
        &label,
        rect.width() as f32 * 0.8,
        rmin * 0.3,
        0.12 * rmin,
        min_font_px,
        1.0,
    );
    let y = rect.top() + ((rect.height() as f32 - block.height()) / 2.0).max(0.0) as i32;
    text::draw_block(
        canvas,
        font,
        &block,
        Rect::at(rect.left(), y).of_size(rect.width(), block.height().ceil() as u32 + 2),
        Align::Center,
        GRAY_700,
        None,
    );
}

/// Placeholder rendered as a standalone image, for the avatar crop.
fn placeholder_photo(id: u32, font: &FontVec) -> DynamicImage {
    let mut img = RgbaImage::from_pixel(256, 256, GRAY_900);
    draw_placeholder(&mut img, Rect::at(0, 0).of_size(256, 256), id, font, 8);
    DynamicImage::ImageRgba8(img)
}

/// Page-number pill, top-right.
fn draw_badge(canvas: &mut RgbaImage, badge: &str, font: &FontVec, unit: f32) {
    let size = (0.022 * unit).max(8.0);
    let pad_x = 0.015 * unit;
    let pad_y = 0.0075 * unit;
    let margin = (0.022 * unit) as i32;
    let text_width = text::line_width(font, size, badge);
    let pill_w = (text_width + 2.0 * pad_x).ceil() as u32;
    let pill_h = (size + 2.0 * pad_y).ceil() as u32;
    let x = canvas.width() as i32 - margin - pill_w as i32;
    let pill = Rect::at(x.max(0), margin).of_size(pill_w, pill_h);
    surface::fill_capsule(canvas, pill, Rgba([0, 0, 0, 128]));
    let block = text::TextBlock {
        size,
        lines: vec![badge.to_string()],
        line_height: 1.0,
    };
    text::draw_block(
        canvas,
        font,
        &block,
        Rect::at(pill.left() + pad_x as i32, pill.top() + pad_y as i32)
            .of_size(text_width.ceil() as u32 + 1, pill_h),
        Align::Left,
        WHITE,
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AspectRatio;

    fn sample_card() -> Card {
        Card::new(2, "건강한 아침 루틴", "일찍 일어나 물 한 잔으로 하루를 시작하세요.")
    }

    fn sample_visual(image: Option<DynamicImage>) -> CardVisual {
        CardVisual::snapshot(&sample_card(), 5, image)
    }

    #[test]
    fn snapshot_builds_the_page_badge() {
        let visual = sample_visual(None);
        assert_eq!(visual.badge.as_deref(), Some("2 / 5"));
        assert_eq!(visual.id, 2);
    }

    #[test]
    fn export_transform_strips_only_the_badge() {
        let visual = sample_visual(None).for_export();
        assert_eq!(visual.badge, None);
        assert_eq!(visual.title, "건강한 아침 루틴");
        assert!(visual.image.is_none());
    }

    #[test]
    fn zero_resolution_is_a_card_failure() {
        let Ok(font) = font::discover_system_font() else { return };
        let err = render_card(
            &sample_visual(None),
            &LayoutSettings::default(),
            (0, 100),
            &font,
            8,
        )
        .unwrap_err();
        assert!(matches!(err, CardError::RenderFailed { card: 2, .. }));
    }

    #[test]
    fn surface_matches_requested_resolution_for_every_ratio() {
        let Ok(font) = font::discover_system_font() else { return };
        let visual = sample_visual(None);
        let layout = LayoutSettings::default();
        for ratio in [AspectRatio::Square, AspectRatio::Landscape, AspectRatio::Portrait] {
            let target = ratio.export_resolution();
            let img = render_card(&visual, &layout, target, &font, 8).unwrap();
            assert_eq!(img.dimensions(), target);
            let preview = ratio.preview_resolution();
            let img = render_card(&visual, &layout, preview, &font, 8).unwrap();
            assert_eq!(img.dimensions(), preview);
        }
    }

    #[test]
    fn every_style_renders_with_and_without_artwork() {
        let Ok(font) = font::discover_system_font() else { return };
        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            64,
            48,
            Rgba([200, 40, 40, 255]),
        ));
        for style in [
            CardStyle::Classic,
            CardStyle::Minimalist,
            CardStyle::Modern,
            CardStyle::Gradient,
            CardStyle::TextFocus,
        ] {
            let layout = LayoutSettings {
                card_style: style,
                ..LayoutSettings::default()
            };
            for image in [None, Some(photo.clone())] {
                let visual = sample_visual(image);
                let img = render_card(&visual, &layout, (256, 256), &font, 8).unwrap();
                assert_eq!(img.dimensions(), (256, 256));
            }
        }
    }

    #[test]
    fn preview_and_export_renders_differ_by_the_badge() {
        let Ok(font) = font::discover_system_font() else { return };
        let layout = LayoutSettings::default();
        let preview = sample_visual(None);
        let export = preview.clone().for_export();
        let a = render_card(&preview, &layout, (256, 256), &font, 8).unwrap();
        let b = render_card(&export, &layout, (256, 256), &font, 8).unwrap();
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn corners_are_transparent_after_render() {
        let Ok(font) = font::discover_system_font() else { return };
        let img = render_card(
            &sample_visual(None),
            &LayoutSettings::default(),
            (256, 256),
            &font,
            8,
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_ne!(img.get_pixel(128, 128)[3], 0);
    }
}
