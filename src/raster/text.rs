//! # Text Layout
//!
//! Lays out plain text on a canvas as wide as the print head:
//!
//! 1. Every input line is greedily word-wrapped to `width - WRAP_MARGIN`.
//! 2. Wrapped lines are drawn from `(TEXT_OFFSET, TEXT_OFFSET)` with
//!    `LINE_SPACING` pixels between lines.
//! 3. The canvas is trimmed to the ink bounding box, keeping
//!    `TRIM_PADDING` white rows under the last line.
//!
//! The trimmed canvas is narrower than the print head; the image pipeline
//! pads it back on the right, so text ends up flush left on paper.

use image::{GrayImage, Luma};

use super::font::TextRenderer;

/// Horizontal budget reserved around wrapped lines
pub const WRAP_MARGIN: u32 = 20;
/// Where the first line is drawn
pub const TEXT_OFFSET: u32 = 10;
/// Extra pixels between consecutive lines
pub const LINE_SPACING: u32 = 4;
/// White rows kept under the last inked row
pub const TRIM_PADDING: u32 = 10;

const WHITE: Luma<u8> = Luma([255]);

/// Wrap one line of text so no piece is wider than `max_width`.
///
/// A line that already fits is returned unchanged (including empty lines).
/// Otherwise words are appended greedily; a single word wider than the
/// limit gets a line of its own.
pub fn wrap_line(line: &str, font: &dyn TextRenderer, max_width: u32) -> Vec<String> {
    if font.measure(line) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if font.measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Wrap every line of `text` for a canvas `width` pixels wide.
pub fn wrap_text(text: &str, font: &dyn TextRenderer, width: u32) -> Vec<String> {
    let max_width = width.saturating_sub(WRAP_MARGIN);
    text.lines()
        .flat_map(|line| wrap_line(line, font, max_width))
        .collect()
}

/// Draw `text` onto a fresh white canvas and trim it to its content.
pub fn render(text: &str, font: &dyn TextRenderer, width: u32) -> GrayImage {
    let lines = wrap_text(text, font, width);
    let advance = font.line_height() + LINE_SPACING;
    let height = TEXT_OFFSET * 2 + advance * lines.len().max(1) as u32 + TRIM_PADDING;

    let mut canvas = GrayImage::from_pixel(width, height, WHITE);
    for (i, line) in lines.iter().enumerate() {
        let y = TEXT_OFFSET + i as u32 * advance;
        font.draw(&mut canvas, TEXT_OFFSET as i32, y as i32, line);
    }

    trim(&canvas)
}

/// Bounding box `(x0, y0, x1, y1)` (inclusive) of non-white pixels.
pub fn content_bounds(canvas: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in canvas.enumerate_pixels() {
        if pixel.0[0] == 255 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

/// Crop to the content bounding box plus [`TRIM_PADDING`] rows below.
///
/// A canvas without any ink is returned unchanged.
pub fn trim(canvas: &GrayImage) -> GrayImage {
    let Some((x0, y0, x1, y1)) = content_bounds(canvas) else {
        return canvas.clone();
    };

    let width = x1 - x0 + 1;
    let height = y1 - y0 + 1 + TRIM_PADDING;
    let mut trimmed = GrayImage::from_pixel(width, height, WHITE);
    for y in 0..=(y1 - y0) {
        for x in 0..width {
            trimmed.put_pixel(x, y, *canvas.get_pixel(x0 + x, y0 + y));
        }
    }
    trimmed
}
