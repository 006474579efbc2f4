//! # Device Notifications
//!
//! The printer reports status on its notify characteristic. The only
//! messages acted on are flow-control signals, an XOFF/XON analogue the
//! firmware sends when its line buffer fills up and drains again:
//!
//! ```text
//! index:  0    1    2    3    4    5    6
//!        0x51 0x78 0xAE  ..   ..   ..  0x10   → pause
//!        0x51 0x78 0xAE  ..   ..   ..  0x00   → resume
//! ```
//!
//! Anything else (battery, paper, temperature reports) is ignored.

/// Byte 2 of a flow-control notification
pub const FLOW_MARKER: u8 = 0xAE;
/// Byte 6 value requesting a pause
pub const FLOW_PAUSE: u8 = 0x10;
/// Byte 6 value allowing transmission again
pub const FLOW_RESUME: u8 = 0x00;

const MARKER_INDEX: usize = 2;
const VALUE_INDEX: usize = 6;

/// Flow-control request from the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    /// Stop sending chunks
    Pause,
    /// Sending may continue
    Resume,
}

impl FlowSignal {
    /// Decode a raw notification. Returns `None` for non-flow messages.
    ///
    /// ```
    /// use catprint::protocol::notify::FlowSignal;
    ///
    /// let xoff = [0x51, 0x78, 0xAE, 0x01, 0x01, 0x00, 0x10, 0x70, 0xFF];
    /// assert_eq!(FlowSignal::decode(&xoff), Some(FlowSignal::Pause));
    /// assert_eq!(FlowSignal::decode(&[0x51, 0x78]), None);
    /// ```
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() <= VALUE_INDEX || data[MARKER_INDEX] != FLOW_MARKER {
            return None;
        }
        match data[VALUE_INDEX] {
            FLOW_PAUSE => Some(FlowSignal::Pause),
            FLOW_RESUME => Some(FlowSignal::Resume),
            _ => None,
        }
    }

    /// Whether transmission is permitted after this signal
    pub fn permits_transmit(self) -> bool {
        matches!(self, FlowSignal::Resume)
    }

    /// Raw notification bytes for this signal, as the firmware sends them.
    pub fn to_notification(self) -> Vec<u8> {
        let value = match self {
            FlowSignal::Pause => FLOW_PAUSE,
            FlowSignal::Resume => FLOW_RESUME,
        };
        vec![0x51, 0x78, FLOW_MARKER, 0x01, 0x01, 0x00, value, 0x00, 0xFF]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pause_and_resume() {
        assert_eq!(
            FlowSignal::decode(&FlowSignal::Pause.to_notification()),
            Some(FlowSignal::Pause)
        );
        assert_eq!(
            FlowSignal::decode(&FlowSignal::Resume.to_notification()),
            Some(FlowSignal::Resume)
        );
    }

    #[test]
    fn test_decode_ignores_short_messages() {
        // Marker present but value byte missing
        assert_eq!(FlowSignal::decode(&[0x51, 0x78, 0xAE, 0x00, 0x00, 0x00]), None);
        assert_eq!(FlowSignal::decode(&[]), None);
    }

    #[test]
    fn test_decode_ignores_other_markers() {
        assert_eq!(
            FlowSignal::decode(&[0x51, 0x78, 0xA3, 0x00, 0x01, 0x00, 0x10, 0x00, 0xFF]),
            None
        );
    }

    #[test]
    fn test_decode_ignores_unknown_values() {
        assert_eq!(
            FlowSignal::decode(&[0x51, 0x78, 0xAE, 0x00, 0x01, 0x00, 0x42, 0x00, 0xFF]),
            None
        );
    }

    #[test]
    fn test_permits_transmit() {
        assert!(!FlowSignal::Pause.permits_transmit());
        assert!(FlowSignal::Resume.permits_transmit());
    }
}
