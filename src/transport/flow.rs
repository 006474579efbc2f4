//! Flow-control state shared between the notification listener and the
//! transmitter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::protocol::notify::FlowSignal;

/// Whether the printer currently accepts data.
///
/// Cloning shares the underlying flag. Only the notification listener
/// writes it; the transmitter reads it before every chunk.
#[derive(Debug, Clone)]
pub struct FlowState {
    permitted: Arc<AtomicBool>,
}

impl FlowState {
    /// New state, transmission permitted.
    pub fn new() -> Self {
        Self {
            permitted: Arc::new(AtomicBool::new(true)),
        }
    }

    #[inline]
    pub fn is_permitted(&self) -> bool {
        self.permitted.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        self.permitted.store(false, Ordering::Release);
    }

    pub fn resume(&self) {
        self.permitted.store(true, Ordering::Release);
    }

    /// Apply a decoded printer signal.
    pub fn apply(&self, signal: FlowSignal) {
        match signal {
            FlowSignal::Pause => self.pause(),
            FlowSignal::Resume => self.resume(),
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_permitted() {
        assert!(FlowState::new().is_permitted());
    }

    #[test]
    fn test_clones_share_state() {
        let writer = FlowState::new();
        let reader = writer.clone();

        writer.apply(FlowSignal::Pause);
        assert!(!reader.is_permitted());

        writer.apply(FlowSignal::Resume);
        assert!(reader.is_permitted());
    }
}
