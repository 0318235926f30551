//! Text layout for card surfaces: wrapping, measuring and the shrink-to-fit
//! loop that mirrors the preview's behaviour of stepping a font down 1 px at
//! a time until the block stops overflowing its container.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;

/// A wrapped text block at a settled font size.
#[derive(Debug, Clone)]
pub(crate) struct TextBlock {
    pub size: f32,
    pub lines: Vec<String>,
    pub line_height: f32,
}

impl TextBlock {
    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.size * self.line_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
}

/// Advance width of `text` at `size`, kerning included.
pub(crate) fn line_width(font: &FontVec, size: f32, text: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut prev = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Wrap at whitespace, breaking runs with no whitespace (Korean prose
/// routinely has none) character by character so nothing escapes the box.
pub(crate) fn wrap(font: &FontVec, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if line_width(font, size, &candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if line_width(font, size, word) <= max_width {
                current = word.to_string();
            } else {
                // Word alone exceeds the box: split per character.
                for c in word.chars() {
                    let mut grown = current.clone();
                    grown.push(c);
                    if !current.is_empty() && line_width(font, size, &grown) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = grown;
                    }
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Shrink from `start_px` in whole-pixel steps until the wrapped block fits
/// `max_width` x `max_height`, never going below `min_px`. At the floor the
/// block is returned as-is and callers clip the overflow.
pub(crate) fn fit(
    font: &FontVec,
    text: &str,
    max_width: f32,
    max_height: f32,
    start_px: f32,
    min_px: u32,
    line_height: f32,
) -> TextBlock {
    let floor = min_px as f32;
    let mut size = start_px.max(floor);
    loop {
        let lines = wrap(font, size, text, max_width);
        let height = lines.len() as f32 * size * line_height;
        let widest = lines
            .iter()
            .map(|l| line_width(font, size, l))
            .fold(0.0f32, f32::max);
        if (height <= max_height && widest <= max_width) || size <= floor {
            return TextBlock {
                size,
                lines,
                line_height,
            };
        }
        size -= 1.0;
    }
}

/// Draw a fitted block with its top-left at `area`'s origin, clipping whole
/// lines that fall below the area. An optional `(offset, colour)` shadow is
/// drawn behind each line.
pub(crate) fn draw_block(
    canvas: &mut RgbaImage,
    font: &FontVec,
    block: &TextBlock,
    area: imageproc::rect::Rect,
    align: Align,
    color: Rgba<u8>,
    shadow: Option<(i32, Rgba<u8>)>,
) {
    let step = block.size * block.line_height;
    let clip_bottom = area.top() + area.height() as i32;
    for (i, line) in block.lines.iter().enumerate() {
        let line_y = area.top() + (i as f32 * step) as i32;
        if line_y + block.size as i32 > clip_bottom {
            break;
        }
        let line_x = match align {
            Align::Left => area.left(),
            Align::Center => {
                let lw = line_width(font, block.size, line);
                area.left() + ((area.width() as f32 - lw) / 2.0).max(0.0) as i32
            }
        };
        let scale = PxScale::from(block.size);
        if let Some((offset, shadow_color)) = shadow {
            draw_text_mut(
                canvas,
                shadow_color,
                line_x + offset,
                line_y + offset,
                scale,
                font,
                line,
            );
        }
        draw_text_mut(canvas, color, line_x, line_y, scale, font, line);
    }
}
