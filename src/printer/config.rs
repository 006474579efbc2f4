//! # Printer Configuration
//!
//! This module defines the hardware profile of the supported printer.
//!
//! ## Supported Printers
//!
//! | Model | Width (dots) | Bytes/row | Resolution |
//! |-------|--------------|-----------|------------|
//! | MX06  | 384          | 48        | 203 DPI    |
//!
//! ## Usage
//!
//! ```
//! use catprint::printer::PrinterConfig;
//!
//! let config = PrinterConfig::MX06;
//! println!("Print width: {} dots ({} bytes)",
//!          config.width_dots,
//!          config.width_bytes);
//! ```

use std::time::Duration;

/// # Printer Configuration
///
/// Defines the hardware and link characteristics of a thermal printer.
///
/// ## Physical Properties
///
/// - **width_dots**: Printable width in dots (pixels). Every raster row is
///   exactly this wide.
/// - **width_bytes**: Width in bytes (width_dots / 8)
/// - **dpi**: Resolution in dots per inch
///
/// ## Bluetooth LE
///
/// - **write_characteristic**: GATT characteristic receiving frame chunks
/// - **notify_characteristic**: GATT characteristic carrying flow control
/// - **chunk_size**: Maximum bytes per characteristic write
/// - **chunk_delay**: Pause after every chunk
#[derive(Debug, Clone, Copy)]
pub struct PrinterConfig {
    /// Advertised device name used as the discovery filter
    pub name: &'static str,

    /// Printable width in dots (pixels)
    pub width_dots: u32,

    /// Row width in bytes (width_dots / 8)
    pub width_bytes: usize,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Outbound characteristic UUID
    pub write_characteristic: &'static str,

    /// Inbound notification characteristic UUID
    pub notify_characteristic: &'static str,

    /// Bytes per BLE write
    pub chunk_size: usize,

    /// Delay after each BLE write
    pub chunk_delay: Duration,
}

impl PrinterConfig {
    /// # MX06 "cat printer"
    ///
    /// 58mm paper thermal printer driven over BLE.
    ///
    /// ## Print Area
    ///
    /// ```text
    /// ├─ 5mm ─┼──── 48mm printable ────┼─ 5mm ─┤
    /// │margin │        384 dots        │margin │
    /// ```
    pub const MX06: Self = Self {
        name: "MX06",
        width_dots: 384,
        width_bytes: 48,
        dpi: 203,
        write_characteristic: "0000AE01-0000-1000-8000-00805F9B34FB",
        notify_characteristic: "0000AE02-0000-1000-8000-00805F9B34FB",
        chunk_size: 100,
        chunk_delay: Duration::from_millis(2),
    };

    /// Calculate dots per millimeter
    ///
    /// ## Example
    ///
    /// ```
    /// use catprint::printer::PrinterConfig;
    ///
    /// let config = PrinterConfig::MX06;
    /// assert!((config.dots_per_mm() - 8.0).abs() < 0.1);
    /// ```
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Calculate print width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 / self.dots_per_mm()
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::MX06
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mx06_geometry() {
        let config = PrinterConfig::MX06;
        assert_eq!(config.width_dots, 384);
        assert_eq!(config.width_bytes as u32 * 8, config.width_dots);
        assert!((config.width_mm() - 48.0).abs() < 0.5);
    }

    #[test]
    fn test_default_is_mx06() {
        assert_eq!(PrinterConfig::default().name, "MX06");
    }
}
