//! # Frame Codec
//!
//! Every message to the printer is wrapped in a fixed envelope:
//!
//! ```text
//! ┌──────┬──────┬─────────┬──────┬─────┬──────┬─────────────┬───────┬──────┐
//! │ 0x51 │ 0x78 │ command │ 0x00 │ len │ 0x00 │ payload...  │ crc8  │ 0xFF │
//! └──────┴──────┴─────────┴──────┴─────┴──────┴─────────────┴───────┴──────┘
//!   sync   sync               rsvd        rsvd   len bytes    payload  end
//! ```
//!
//! The length field is a single byte, so payloads are limited to 255 bytes.
//! The checksum covers the payload only (see [`crc`](super::crc)).

use super::commands::Command;
use super::crc;
use crate::error::CatprintError;

/// First sync byte
pub const SYNC0: u8 = 0x51;
/// Second sync byte
pub const SYNC1: u8 = 0x78;
/// Reserved byte, always zero
pub const RESERVED: u8 = 0x00;
/// Frame terminator
pub const TERMINATOR: u8 = 0xFF;

/// Header bytes before the payload
pub const HEADER_LEN: usize = 6;
/// Checksum + terminator
pub const FOOTER_LEN: usize = 2;
/// Largest payload the length byte can describe
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// An encoded protocol message, ready to be chunked onto the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Raw frame bytes (header, payload, checksum, terminator)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total encoded length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Frames always carry at least a header and footer
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Command byte of this frame
    pub fn command(&self) -> u8 {
        self.bytes[2]
    }

    /// Payload slice of this frame
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..self.bytes.len() - FOOTER_LEN]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Build a frame for `command` carrying `payload`.
///
/// ## Errors
///
/// Returns [`CatprintError::Protocol`] if the payload is longer than
/// [`MAX_PAYLOAD`] bytes.
///
/// ## Example
///
/// ```
/// use catprint::protocol::{commands::Command, frame};
///
/// let frame = frame::encode(Command::SetQuality, &[0x33])?;
/// assert_eq!(frame.as_bytes(), &[0x51, 0x78, 0xA4, 0x00, 0x01, 0x00, 0x33, 0x99, 0xFF]);
/// # Ok::<(), catprint::error::CatprintError>(())
/// ```
pub fn encode(command: Command, payload: &[u8]) -> Result<Frame, CatprintError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(CatprintError::Protocol(format!(
            "Payload of {} bytes exceeds the {} byte frame limit",
            payload.len(),
            MAX_PAYLOAD
        )));
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
    bytes.extend_from_slice(&[
        SYNC0,
        SYNC1,
        command.code(),
        RESERVED,
        payload.len() as u8,
        RESERVED,
    ]);
    bytes.extend_from_slice(payload);
    bytes.push(crc::checksum(payload));
    bytes.push(TERMINATOR);

    Ok(Frame { bytes })
}

/// Parse exactly one frame.
///
/// Validates sync, reserved, length, checksum and terminator bytes.
pub fn decode(bytes: &[u8]) -> Result<(Command, Vec<u8>), CatprintError> {
    let (command, payload, consumed) = decode_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(CatprintError::Protocol(format!(
            "{} trailing bytes after frame",
            bytes.len() - consumed
        )));
    }
    Ok((command, payload))
}

/// Split a concatenated byte stream into its frames.
///
/// The stream must end on a frame boundary.
pub fn decode_stream(mut bytes: &[u8]) -> Result<Vec<(Command, Vec<u8>)>, CatprintError> {
    let mut frames = Vec::new();
    while !bytes.is_empty() {
        let (command, payload, consumed) = decode_prefix(bytes)?;
        frames.push((command, payload));
        bytes = &bytes[consumed..];
    }
    Ok(frames)
}

fn decode_prefix(bytes: &[u8]) -> Result<(Command, Vec<u8>, usize), CatprintError> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(CatprintError::Protocol(format!(
            "Frame too short: {} bytes",
            bytes.len()
        )));
    }
    if bytes[0] != SYNC0 || bytes[1] != SYNC1 {
        return Err(CatprintError::Protocol(format!(
            "Bad sync bytes {:#04x} {:#04x}",
            bytes[0], bytes[1]
        )));
    }
    if bytes[3] != RESERVED || bytes[5] != RESERVED {
        return Err(CatprintError::Protocol("Reserved header bytes not zero".to_string()));
    }

    let command = Command::try_from(bytes[2])?;
    let len = bytes[4] as usize;
    let total = HEADER_LEN + len + FOOTER_LEN;
    if bytes.len() < total {
        return Err(CatprintError::Protocol(format!(
            "Frame declares {} payload bytes but only {} available",
            len,
            bytes.len() - HEADER_LEN - FOOTER_LEN
        )));
    }

    let payload = &bytes[HEADER_LEN..HEADER_LEN + len];
    let expected = crc::checksum(payload);
    let actual = bytes[HEADER_LEN + len];
    if actual != expected {
        return Err(CatprintError::Protocol(format!(
            "Checksum mismatch: expected {:#04x}, got {:#04x}",
            expected, actual
        )));
    }
    if bytes[total - 1] != TERMINATOR {
        return Err(CatprintError::Protocol(format!(
            "Bad terminator {:#04x}",
            bytes[total - 1]
        )));
    }

    Ok((command, payload.to_vec(), total))
}
