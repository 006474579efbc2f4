//! # MX06 Protocol Implementation
//!
//! This module provides the byte-level protocol spoken by MX06 "cat"
//! thermal printers over Bluetooth LE.
//!
//! ## Module Structure
//!
//! - [`commands`]: Command identifiers, payload builders and constants
//! - [`crc`]: CRC-8 payload checksum
//! - [`frame`]: Frame encoding and decoding
//! - [`notify`]: Flow-control notifications from the printer
//!
//! ## Usage Example
//!
//! ```
//! use catprint::protocol::{commands::{self, Command}, frame};
//!
//! // Build the frames that start a print job
//! let mut data = Vec::new();
//! data.extend(frame::encode(Command::SetQuality, &commands::set_quality(commands::QUALITY))?.into_bytes());
//! data.extend(frame::encode(Command::ControlLattice, &commands::control_lattice(&commands::PRINT_LATTICE))?.into_bytes());
//!
//! assert_eq!(frame::decode_stream(&data)?.len(), 2);
//! # Ok::<(), catprint::error::CatprintError>(())
//! ```

pub mod commands;
pub mod crc;
pub mod frame;
pub mod notify;

pub use commands::Command;
pub use frame::Frame;
pub use notify::FlowSignal;
