//! # CRC-8 Checksum
//!
//! Frame payloads are protected by a plain CRC-8 (polynomial `0x07`,
//! initial value `0x00`, no reflection, no final XOR). Only the payload is
//! covered; header and footer bytes are constant and not checksummed.
//!
//! The lookup table is precomputed at compile time from the polynomial and
//! matches the table the printer firmware was reverse-engineered against.

/// CRC-8 generator polynomial (x^8 + x^2 + x + 1)
pub const POLYNOMIAL: u8 = 0x07;

/// Precomputed lookup table: `TABLE[i]` is the CRC of the single byte `i`.
pub const TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the CRC-8 of a payload.
///
/// ## Example
///
/// ```
/// use catprint::protocol::crc;
///
/// assert_eq!(crc::checksum(&[]), 0x00);
/// assert_eq!(crc::checksum(&[0x33]), crc::TABLE[0x33]);
/// ```
#[inline]
pub fn checksum(payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(0u8, |crc, &byte| TABLE[(crc ^ byte) as usize])
}
