//! Pixel-level drawing primitives for the offscreen card surface.
//!
//! Everything here operates on a plain `RgbaImage` with source-over
//! blending, so style renderers can layer fills, photos, gradients and
//! shades in the same order the live preview stacks its elements.

use image::imageops::FilterType;
use image::{DynamicImage, Pixel, Rgba, RgbaImage};
use imageproc::rect::Rect;

/// Parse a `#rrggbb` colour. Returns `None` for anything else.
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}

pub(crate) fn with_alpha(color: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], alpha])
}

/// Source-over blend `color` onto every pixel of the surface.
pub(crate) fn shade(canvas: &mut RgbaImage, color: Rgba<u8>) {
    for px in canvas.pixels_mut() {
        px.blend(&color);
    }
}

/// Source-over blend `color` onto every pixel inside `rect`.
pub(crate) fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    let x0 = rect.left().max(0) as u32;
    let y0 = rect.top().max(0) as u32;
    let x1 = (rect.left() + rect.width() as i32).clamp(0, w as i32) as u32;
    let y1 = (rect.top() + rect.height() as i32).clamp(0, h as i32) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// Source-over blend a capsule (rect with fully rounded short ends) used
/// for the page-number pill.
pub(crate) fn fill_capsule(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let r = (rect.height() / 2) as i64;
    if r == 0 || (rect.width() as i64) < 2 * r {
        fill_rect(canvas, rect, color);
        return;
    }
    let (w, h) = canvas.dimensions();
    let left = rect.left() as i64;
    let top = rect.top() as i64;
    let right = left + rect.width() as i64;
    let cy = top + r;
    for y in top..top + rect.height() as i64 {
        for x in left..right {
            if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
                continue;
            }
            let inside = if x < left + r {
                let dx = x - (left + r);
                let dy = y - cy;
                dx * dx + dy * dy <= r * r
            } else if x >= right - r {
                let dx = x - (right - r - 1);
                let dy = y - cy;
                dx * dx + dy * dy <= r * r
            } else {
                true
            };
            if inside {
                canvas.get_pixel_mut(x as u32, y as u32).blend(&color);
            }
        }
    }
}

/// Bottom-up three-stop gradient: `bottom` at the lower edge, `middle`
/// half way up, fully transparent at the top. Stops interpolate alpha
/// first so the transparent stop does not drag colours towards black.
pub(crate) fn vertical_gradient(canvas: &mut RgbaImage, bottom: Rgba<u8>, middle: Rgba<u8>) {
    let h = canvas.height();
    if h == 0 {
        return;
    }
    for y in 0..h {
        // t runs 0.0 at the top edge to 1.0 at the bottom edge.
        let t = y as f32 / (h - 1).max(1) as f32;
        let row = if t <= 0.5 {
            let f = t / 0.5;
            with_alpha(middle, (middle[3] as f32 * f) as u8)
        } else {
            let f = (t - 0.5) / 0.5;
            lerp_color(middle, bottom, f)
        };
        for x in 0..canvas.width() {
            canvas.get_pixel_mut(x, y).blend(&row);
        }
    }
}

fn lerp_color(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let ch = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t) as u8;
    Rgba([ch(0), ch(1), ch(2), ch(3)])
}

/// Scale `photo` to cover `rect` (centre-cropped, aspect preserved) and
/// composite it onto the surface.
pub(crate) fn draw_cover_image(canvas: &mut RgbaImage, photo: &DynamicImage, rect: Rect) {
    if rect.width() == 0 || rect.height() == 0 {
        return;
    }
    let fitted = photo
        .resize_to_fill(rect.width(), rect.height(), FilterType::Lanczos3)
        .to_rgba8();
    image::imageops::overlay(canvas, &fitted, rect.left() as i64, rect.top() as i64);
}

/// Circular avatar crop of `photo` with a solid ring behind it.
pub(crate) fn draw_avatar(
    canvas: &mut RgbaImage,
    photo: &DynamicImage,
    center: (i32, i32),
    radius: u32,
    ring: Rgba<u8>,
    ring_width: u32,
) {
    if radius == 0 {
        return;
    }
    imageproc::drawing::draw_filled_circle_mut(
        canvas,
        center,
        (radius + ring_width) as i32,
        ring,
    );
    let d = radius * 2;
    let fitted = photo.resize_to_fill(d, d, FilterType::Lanczos3).to_rgba8();
    let (cx, cy) = center;
    let r2 = (radius * radius) as i64;
    let (cw, ch) = canvas.dimensions();
    for dy in 0..d {
        for dx in 0..d {
            let px = cx - radius as i32 + dx as i32;
            let py = cy - radius as i32 + dy as i32;
            if px < 0 || py < 0 || px >= cw as i32 || py >= ch as i32 {
                continue;
            }
            let ox = dx as i64 - radius as i64;
            let oy = dy as i64 - radius as i64;
            if ox * ox + oy * oy > r2 {
                continue;
            }
            canvas
                .get_pixel_mut(px as u32, py as u32)
                .blend(fitted.get_pixel(dx, dy));
        }
    }
}

/// Clear the alpha of pixels outside a rounded-rect outline so the
/// exported PNG keeps the preview's rounded corners.
pub(crate) fn round_corners(canvas: &mut RgbaImage, radius: u32) {
    let (w, h) = canvas.dimensions();
    if radius == 0 || w < radius * 2 || h < radius * 2 {
        return;
    }
    let r = radius as i64;
    let r2 = r * r;
    let centers = [
        (r - 1, r - 1),
        (w as i64 - r, r - 1),
        (r - 1, h as i64 - r),
        (w as i64 - r, h as i64 - r),
    ];
    let corners = [
        (0i64, 0i64),
        (w as i64 - r, 0),
        (0, h as i64 - r),
        (w as i64 - r, h as i64 - r),
    ];
    for ((cx, cy), (ox, oy)) in centers.into_iter().zip(corners) {
        for y in oy..oy + r {
            for x in ox..ox + r {
                let dx = x - cx;
                let dy = y - cy;
                if dx * dx + dy * dy > r2 {
                    canvas.get_pixel_mut(x as u32, y as u32)[3] = 0;
                }
            }
        }
    }
}
