//! # Text Renderers
//!
//! Text is drawn onto a grayscale canvas before it goes through the same
//! threshold and packing pipeline as images. Two renderers are available:
//!
//! | Renderer | Source | Used when |
//! |----------|--------|-----------|
//! | [`TtfFont`] | any TrueType/OpenType file via `ab_glyph` | job carries a font path, or a common system font is installed |
//! | [`BitmapFont`] | Spleen 12x24, nearest-neighbor scaled | no usable font file |
//!
//! Both draw black (0) on a white (255) canvas.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::GrayImage;
use spleen_font::{FONT_12X24, PSF2Font};
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::error::CatprintError;

/// Something that can measure and draw a single line of text.
pub trait TextRenderer: Send + Sync {
    /// Advance width of `text` in pixels.
    fn measure(&self, text: &str) -> u32;

    /// Height of one line in pixels.
    fn line_height(&self) -> u32;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw(&self, canvas: &mut GrayImage, x: i32, y: i32, text: &str);
}

/// System fonts tried in order when a job names no font.
pub const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/Windows/Fonts/arial.ttf",
];

/// Pick a renderer for a job.
///
/// Without a font path the first loadable [`SYSTEM_FONTS`] entry is used.
/// A font that cannot be read or parsed falls back to the built-in bitmap
/// font with a warning, so a bad font never fails the job.
pub fn load(font_ref: Option<&str>, pixel_height: u32) -> Box<dyn TextRenderer> {
    let Some(path) = font_ref else {
        return load_first(SYSTEM_FONTS, pixel_height);
    };

    match TtfFont::open(path, pixel_height) {
        Ok(font) => Box::new(font),
        Err(e) => {
            warn!("Falling back to built-in font: {}", e);
            Box::new(BitmapFont::new(pixel_height))
        }
    }
}

/// First font in `candidates` that loads, else the bitmap font.
pub fn load_first(candidates: &[&str], pixel_height: u32) -> Box<dyn TextRenderer> {
    for path in candidates {
        match TtfFont::open(path, pixel_height) {
            Ok(font) => {
                debug!("Using system font {}", path);
                return Box::new(font);
            }
            Err(e) => trace!("Skipping system font: {}", e),
        }
    }
    Box::new(BitmapFont::new(pixel_height))
}

#[inline]
fn put_black(canvas: &mut GrayImage, x: i32, y: i32, ink: u8) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    // Overlapping glyph edges keep the darkest value
    pixel.0[0] = pixel.0[0].min(255 - ink);
}

// ============================================================================
// BITMAP FONT
// ============================================================================

const SPLEEN_WIDTH: usize = 12;
const SPLEEN_HEIGHT: usize = 24;

/// Spleen 12x24 scaled to an arbitrary pixel height.
#[derive(Debug, Clone, Copy)]
pub struct BitmapFont {
    cell_width: u32,
    cell_height: u32,
}

impl BitmapFont {
    pub fn new(pixel_height: u32) -> Self {
        let cell_height = pixel_height.max(1);
        let cell_width = (cell_height * SPLEEN_WIDTH as u32 / SPLEEN_HEIGHT as u32).max(1);
        Self {
            cell_width,
            cell_height,
        }
    }

    /// Width of one character cell
    pub fn cell_width(&self) -> u32 {
        self.cell_width
    }

    fn draw_box(&self, canvas: &mut GrayImage, x: i32, y: i32) {
        let (w, h) = (self.cell_width as i32, self.cell_height as i32);
        for dx in 0..w {
            put_black(canvas, x + dx, y, 255);
            put_black(canvas, x + dx, y + h - 1, 255);
        }
        for dy in 0..h {
            put_black(canvas, x, y + dy, 255);
            put_black(canvas, x + w - 1, y + dy, 255);
        }
    }
}

impl TextRenderer for BitmapFont {
    fn measure(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.cell_width
    }

    fn line_height(&self) -> u32 {
        self.cell_height
    }

    fn draw(&self, canvas: &mut GrayImage, x: i32, y: i32, text: &str) {
        let mut spleen = match PSF2Font::new(FONT_12X24) {
            Ok(font) => font,
            Err(_) => {
                warn!("Built-in Spleen font failed to parse");
                return;
            }
        };

        for (i, ch) in text.chars().enumerate() {
            let cell_x = x + (i as u32 * self.cell_width) as i32;
            if ch.is_whitespace() {
                continue;
            }

            let utf8 = ch.to_string();
            let bitmap = spleen.glyph_for_utf8(utf8.as_bytes()).map(|glyph| {
                let mut bitmap = [false; SPLEEN_WIDTH * SPLEEN_HEIGHT];
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < SPLEEN_HEIGHT && col_x < SPLEEN_WIDTH {
                            bitmap[row_y * SPLEEN_WIDTH + col_x] = on;
                        }
                    }
                }
                bitmap
            });
            let Some(bitmap) = bitmap else {
                self.draw_box(canvas, cell_x, y);
                continue;
            };

            // Nearest-neighbor scale from 12x24 to the cell size
            for dy in 0..self.cell_height as usize {
                let sy = dy * SPLEEN_HEIGHT / self.cell_height as usize;
                for dx in 0..self.cell_width as usize {
                    let sx = dx * SPLEEN_WIDTH / self.cell_width as usize;
                    if bitmap[sy * SPLEEN_WIDTH + sx] {
                        put_black(canvas, cell_x + dx as i32, y + dy as i32, 255);
                    }
                }
            }
        }
    }
}

// ============================================================================
// TRUETYPE FONT
// ============================================================================

/// A TrueType/OpenType font loaded from disk.
pub struct TtfFont {
    font: FontVec,
    scale: PxScale,
}

impl TtfFont {
    /// Load a font file and size it to `pixel_height`.
    pub fn open<P: AsRef<Path>>(path: P, pixel_height: u32) -> Result<Self, CatprintError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            CatprintError::Font(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(data, pixel_height)
            .map_err(|e| CatprintError::Font(format!("{}: {}", path.display(), e)))
    }

    /// Parse font bytes already in memory.
    pub fn from_bytes(data: Vec<u8>, pixel_height: u32) -> Result<Self, CatprintError> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| CatprintError::Font(format!("Invalid font: {}", e)))?;
        Ok(Self {
            font,
            scale: PxScale::from(pixel_height.max(1) as f32),
        })
    }
}

impl TextRenderer for TtfFont {
    fn measure(&self, text: &str) -> u32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width.ceil() as u32
    }

    fn line_height(&self) -> u32 {
        let scaled = self.font.as_scaled(self.scale);
        (scaled.ascent() - scaled.descent()).ceil() as u32
    }

    fn draw(&self, canvas: &mut GrayImage, x: i32, y: i32, text: &str) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y as f32 + scaled.ascent();
        let mut caret = x as f32;
        let mut previous = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, ab_glyph::point(caret, baseline));
            caret += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let ink = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                    put_black(
                        canvas,
                        px as i32 + bounds.min.x as i32,
                        py as i32 + bounds.min.y as i32,
                        ink,
                    );
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    #[test]
    fn test_bitmap_metrics_scale_with_size() {
        let font = BitmapFont::new(40);
        assert_eq!(font.line_height(), 40);
        assert_eq!(font.cell_width(), 20);
        assert_eq!(font.measure("Hi"), 40);
        assert_eq!(font.measure(""), 0);
    }

    #[test]
    fn test_bitmap_draws_ink() {
        let font = BitmapFont::new(24);
        let mut canvas = blank(100, 40);
        font.draw(&mut canvas, 5, 5, "Hi");
        assert!(canvas.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn test_bitmap_space_draws_nothing() {
        let font = BitmapFont::new(24);
        let mut canvas = blank(100, 40);
        font.draw(&mut canvas, 0, 0, "   ");
        assert!(canvas.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_draw_clips_to_canvas() {
        let font = BitmapFont::new(48);
        let mut canvas = blank(10, 10);
        font.draw(&mut canvas, -20, -20, "WWWW");
        font.draw(&mut canvas, 8, 8, "WWWW");
    }

    #[test]
    fn test_missing_font_falls_back() {
        let font = load(Some("/nonexistent/font.ttf"), 30);
        assert_eq!(font.line_height(), 30);
    }

    #[test]
    fn test_no_system_font_uses_bitmap() {
        let font = load_first(&["/nonexistent/a.ttf", "/nonexistent/b.ttc"], 24);
        assert_eq!(font.line_height(), 24);
        assert_eq!(font.measure("ab"), 24);
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(
            TtfFont::from_bytes(vec![0, 1, 2, 3], 24),
            Err(CatprintError::Font(_))
        ));
    }
}
