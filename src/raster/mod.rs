//! # Rasterizer
//!
//! Converts text or arbitrary images into the row format the print head
//! consumes: fixed-width, one bit per dot, one protocol command per row.
//!
//! ## Pipeline
//!
//! ```text
//! text ──► layout + font ──┐
//!                          ├─► flatten alpha ─► fit width ─► threshold ─► pad ─► orient ─► pack
//! image ───────────────────┘
//! ```
//!
//! | Step | Behavior |
//! |------|----------|
//! | flatten | transparent pixels are composited over white |
//! | fit width | wider images are downscaled to the head width, aspect preserved |
//! | threshold | luma below [`THRESHOLD`] prints, everything else stays white |
//! | pad | narrower images are padded with white on the right |
//! | orient | rotated 180° unless the job is in chat mode |
//! | pack | 8 dots per byte, see [`pack_row`] |
//!
//! No dithering is applied; gray areas become solid black or solid white.
//!
//! ## Modules
//!
//! - [`font`]: Text renderers (built-in bitmap font, TrueType)
//! - [`text`]: Word wrapping and trimming

pub mod font;
pub mod text;

use image::{DynamicImage, GrayImage, Luma, imageops::FilterType};
use std::io::Cursor;

use crate::error::CatprintError;

/// Luma values below this print as black
pub const THRESHOLD: u8 = 128;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// Physical orientation of the printed strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Rows go out in reading order (chat strips)
    Upright,
    /// Rotated 180° so the strip reads correctly once it hangs out of
    /// the printer
    Inverted,
}

impl Orientation {
    /// Orientation policy for a job: chat strips are fed upright.
    pub fn for_chat_mode(chat_mode: bool) -> Self {
        if chat_mode {
            Orientation::Upright
        } else {
            Orientation::Inverted
        }
    }
}

/// Text content to rasterize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent<'a> {
    pub text: &'a str,
    /// Pixel height of one line of text
    pub font_size: u32,
    /// Path to a TrueType/OpenType font; built-in font when `None`
    pub font_ref: Option<&'a str>,
}

// ============================================================================
// RASTER IMAGE
// ============================================================================

/// # Packed Raster
///
/// A monochrome image in device row format. Every row holds exactly
/// `ceil(width / 8)` bytes; a set bit is a printed dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    rows: Vec<Vec<u8>>,
}

impl RasterImage {
    /// Pack a thresholded image (0 = black, anything else = white).
    pub fn from_monochrome(image: &GrayImage) -> Self {
        let rows = image
            .rows()
            .map(|row| pack_row(row.map(|pixel| pixel.0[0] < THRESHOLD)))
            .collect();
        Self {
            width: image.width(),
            rows,
        }
    }

    /// Width in dots
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Bytes per row
    pub fn row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Packed rows, top to bottom
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Whether the dot at `(x, y)` prints.
    ///
    /// Inverts [`pack_row`]: in a full byte the first dot sits in bit 0 and
    /// the eighth dot in bit 7.
    pub fn is_black(&self, x: u32, y: usize) -> bool {
        let byte_index = (x / 8) as usize;
        let dots_in_byte = (self.width - byte_index as u32 * 8).min(8);
        let position = x % 8;
        let bit = 7 - (dots_in_byte - 1 - position);
        (self.rows[y][byte_index] >> bit) & 1 == 1
    }

    /// Render as a black-on-white PNG for previews.
    pub fn to_png(&self) -> Result<Vec<u8>, CatprintError> {
        let mut img = GrayImage::from_pixel(self.width, self.rows.len() as u32, WHITE);
        for y in 0..self.rows.len() {
            for x in 0..self.width {
                if self.is_black(x, y) {
                    img.put_pixel(x, y as u32, BLACK);
                }
            }
        }

        let mut png_bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .map_err(|e| CatprintError::Image(format!("Failed to encode PNG: {}", e)))?;
        Ok(png_bytes)
    }
}

/// Pack one row of dots into bytes.
///
/// The firmware expects each byte to be filled by shifting: for every dot,
/// left to right, the byte is shifted right by one and `0x80` is OR'ed in
/// if the dot prints. After eight dots the first one has travelled down to
/// bit 0 and the last one sits in bit 7.
///
/// ```
/// use catprint::raster::pack_row;
///
/// assert_eq!(pack_row([true; 8]), vec![0xFF]);
/// assert_eq!(pack_row([true, false, false, false, false, false, false, false]), vec![0x01]);
/// assert_eq!(pack_row([false, false, false, false, false, false, false, true]), vec![0x80]);
/// ```
pub fn pack_row<I>(dots: I) -> Vec<u8>
where
    I: IntoIterator<Item = bool>,
{
    let mut row = Vec::new();
    for (i, black) in dots.into_iter().enumerate() {
        if i % 8 == 0 {
            row.push(0u8);
        }
        let byte = &mut row[i / 8];
        *byte >>= 1;
        if black {
            *byte |= 0x80;
        }
    }
    row
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Flatten, fit, threshold and pad an image to exactly `width` dots.
///
/// Returns a grayscale image containing only 0 and 255.
pub fn to_monochrome(image: &DynamicImage, width: u32) -> Result<GrayImage, CatprintError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CatprintError::Image("Image has no pixels".to_string()));
    }

    let gray = flatten(image);

    let gray = if gray.width() > width {
        let height = ((gray.height() as u64 * width as u64) / gray.width() as u64).max(1) as u32;
        image::imageops::resize(&gray, width, height, FilterType::CatmullRom)
    } else {
        gray
    };

    let mut mono = GrayImage::from_pixel(width, gray.height(), WHITE);
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] < THRESHOLD {
            mono.put_pixel(x, y, BLACK);
        }
    }
    Ok(mono)
}

/// Composite over white and convert to luma.
fn flatten(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }

    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let alpha = pixel[3] as u32;
        for c in 0..3 {
            pixel[c] = ((pixel[c] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
        pixel[3] = 255;
    }
    DynamicImage::ImageRgba8(rgba).to_luma8()
}

fn orient(mono: GrayImage, orientation: Orientation) -> GrayImage {
    match orientation {
        Orientation::Upright => mono,
        Orientation::Inverted => image::imageops::rotate180(&mono),
    }
}

/// Rasterize an image for a print head `width` dots wide.
pub fn rasterize_image(
    image: &DynamicImage,
    width: u32,
    orientation: Orientation,
) -> Result<RasterImage, CatprintError> {
    let mono = to_monochrome(image, width)?;
    Ok(RasterImage::from_monochrome(&orient(mono, orientation)))
}

/// Render and rasterize text for a print head `width` dots wide.
pub fn rasterize_text(
    content: &TextContent<'_>,
    width: u32,
    orientation: Orientation,
) -> Result<RasterImage, CatprintError> {
    let font = font::load(content.font_ref, content.font_size);
    let canvas = text::render(content.text, font.as_ref(), width);
    rasterize_image(&DynamicImage::ImageLuma8(canvas), width, orientation)
}
