//! # MX06 Protocol Commands
//!
//! This module defines the command set of the MX06 thermal printer and the
//! payload builders for each command.
//!
//! ## Command Set
//!
//! | Command | Byte | Payload |
//! |---------|------|---------|
//! | Draw bitmap row | `0xA2` | one packed raster row (48 bytes) |
//! | Feed paper | `0xA1` | u16 LE line count |
//! | Set quality | `0xA4` | 1 byte |
//! | Control lattice | `0xA6` | 11-byte lattice constant |
//! | Set energy | `0xAF` | u16 LE heating energy |
//! | Drawing mode | `0xBE` | 1 byte (0 = image) |
//! | Other feed paper | `0xBD` | 1 byte feed speed |
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x2EE0 is sent as bytes `[0xE0, 0x2E]`

use std::fmt;

use crate::error::CatprintError;

// ============================================================================
// COMMAND BYTES
// ============================================================================

/// Printer command identifiers (the third byte of every frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Print one raster row
    DrawBitmap = 0xA2,
    /// Advance the paper by a number of dot lines
    FeedPaper = 0xA1,
    /// Print quality
    SetQuality = 0xA4,
    /// Lattice control, brackets the printed region
    ControlLattice = 0xA6,
    /// Heating energy (print darkness)
    SetEnergy = 0xAF,
    /// Image vs text drawing mode
    DrawingMode = 0xBE,
    /// Feed speed used while printing and while feeding blank paper
    OtherFeedPaper = 0xBD,
}

impl Command {
    /// All commands known to the firmware
    pub const ALL: [Command; 7] = [
        Command::DrawBitmap,
        Command::FeedPaper,
        Command::SetQuality,
        Command::ControlLattice,
        Command::SetEnergy,
        Command::DrawingMode,
        Command::OtherFeedPaper,
    ];

    /// Wire value of the command
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = CatprintError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Command::ALL
            .into_iter()
            .find(|c| c.code() == byte)
            .ok_or_else(|| CatprintError::Protocol(format!("Unknown command byte {:#04x}", byte)))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::DrawBitmap => "draw-bitmap",
            Command::FeedPaper => "feed-paper",
            Command::SetQuality => "set-quality",
            Command::ControlLattice => "control-lattice",
            Command::SetEnergy => "set-energy",
            Command::DrawingMode => "drawing-mode",
            Command::OtherFeedPaper => "other-feed-paper",
        };
        write!(f, "{} ({:#04x})", name, self.code())
    }
}

// ============================================================================
// PAYLOAD CONSTANTS
// ============================================================================

/// Lattice sent before the first raster row
pub const PRINT_LATTICE: [u8; 11] = [
    0xAA, 0x55, 0x17, 0x38, 0x44, 0x5F, 0x5F, 0x5F, 0x44, 0x38, 0x2C,
];

/// Lattice sent after the final feed
pub const FINISH_LATTICE: [u8; 11] = [
    0xAA, 0x55, 0x17, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x17,
];

/// Print quality used for every job
pub const QUALITY: u8 = 0x33;

/// Feed speed while drawing image rows
pub const IMG_PRINT_SPEED: [u8; 1] = [0x05];

/// Feed speed while feeding blank paper
pub const BLANK_SPEED: [u8; 1] = [0x05];

/// Default heating energy
pub const DEFAULT_ENERGY: u16 = 0x2EE0;

/// Drawing mode selecting image output
pub const DRAWING_MODE_IMAGE: u8 = 0x00;

// ============================================================================
// PAYLOAD BUILDERS
// ============================================================================

/// Encode a u16 as little-endian bytes.
#[inline]
pub fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// # Set Quality (0xA4)
///
/// ```
/// use catprint::protocol::commands;
///
/// assert_eq!(commands::set_quality(0x33), vec![0x33]);
/// ```
#[inline]
pub fn set_quality(quality: u8) -> Vec<u8> {
    vec![quality]
}

/// # Control Lattice (0xA6)
#[inline]
pub fn control_lattice(lattice: &[u8; 11]) -> Vec<u8> {
    lattice.to_vec()
}

/// # Set Energy (0xAF)
///
/// ```
/// use catprint::protocol::commands;
///
/// assert_eq!(commands::set_energy(0x2EE0), vec![0xE0, 0x2E]);
/// ```
#[inline]
pub fn set_energy(energy: u16) -> Vec<u8> {
    u16_le(energy).to_vec()
}

/// # Drawing Mode (0xBE)
#[inline]
pub fn drawing_mode(mode: u8) -> Vec<u8> {
    vec![mode]
}

/// # Other Feed Paper (0xBD)
///
/// Sets the paper speed. Sent with [`IMG_PRINT_SPEED`] before the rows and
/// with [`BLANK_SPEED`] before the trailing feed.
#[inline]
pub fn feed_speed(speed: &[u8; 1]) -> Vec<u8> {
    speed.to_vec()
}

/// # Feed Paper (0xA1)
///
/// ```
/// use catprint::protocol::commands;
///
/// assert_eq!(commands::feed_paper(20), vec![20, 0]);
/// ```
#[inline]
pub fn feed_paper(lines: u16) -> Vec<u8> {
    u16_le(lines).to_vec()
}

/// # Draw Bitmap (0xA2)
///
/// The payload is one packed raster row, copied as-is.
#[inline]
pub fn draw_bitmap(row: &[u8]) -> Vec<u8> {
    row.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(Command::DrawBitmap.code(), 0xA2);
        assert_eq!(Command::FeedPaper.code(), 0xA1);
        assert_eq!(Command::SetQuality.code(), 0xA4);
        assert_eq!(Command::ControlLattice.code(), 0xA6);
        assert_eq!(Command::DrawingMode.code(), 0xBE);
        assert_eq!(Command::OtherFeedPaper.code(), 0xBD);
        assert_eq!(Command::SetEnergy.code(), 0xAF);
    }

    #[test]
    fn test_command_try_from() {
        for command in Command::ALL {
            assert_eq!(Command::try_from(command.code()).unwrap(), command);
        }
        assert!(matches!(
            Command::try_from(0x00),
            Err(CatprintError::Protocol(_))
        ));
    }

    #[test]
    fn test_energy_little_endian() {
        assert_eq!(set_energy(DEFAULT_ENERGY), vec![0xE0, 0x2E]);
        assert_eq!(set_energy(0x0102), vec![0x02, 0x01]);
    }

    #[test]
    fn test_feed_little_endian() {
        assert_eq!(feed_paper(50), vec![0x32, 0x00]);
        assert_eq!(feed_paper(300), vec![0x2C, 0x01]);
    }

    #[test]
    fn test_lattices() {
        assert_eq!(control_lattice(&PRINT_LATTICE).len(), 11);
        assert_eq!(FINISH_LATTICE[2], 0x17);
        assert_eq!(FINISH_LATTICE[10], 0x17);
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::SetEnergy.to_string(), "set-energy (0xaf)");
    }
}
