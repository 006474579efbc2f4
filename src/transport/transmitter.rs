//! # Transmitter
//!
//! Sends one command at a time: encode the frame, cut it into
//! characteristic-sized chunks and write them in order, holding back
//! whenever the printer has asked for a pause.
//!
//! ```text
//! frame ──► [chunk 0] ──► wait flow ──► write ──► sleep chunk_delay
//!           [chunk 1] ──► wait flow ──► write ──► sleep chunk_delay
//!           ...
//! ```
//!
//! The transmitter borrows its [`Connection`] mutably, so only one frame
//! can be in flight per connection and chunks never interleave.

use std::time::Duration;
use tracing::{debug, trace};

use super::{Connection, Link};
use crate::error::CatprintError;
use crate::printer::PrinterConfig;
use crate::protocol::commands::Command;
use crate::protocol::frame;

/// How often a paused sender re-checks the flow state
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Chunking and pacing settings.
#[derive(Debug, Clone)]
pub struct TransmitConfig {
    /// Maximum bytes per link write
    pub chunk_size: usize,
    /// Pause after every chunk
    pub chunk_delay: Duration,
    /// Flow-state polling interval while paused
    pub poll_interval: Duration,
}

impl TransmitConfig {
    pub fn for_printer(printer: &PrinterConfig) -> Self {
        Self {
            chunk_size: printer.chunk_size,
            chunk_delay: printer.chunk_delay,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self::for_printer(&PrinterConfig::MX06)
    }
}

/// Frame sender bound to one connection.
pub struct Transmitter<'c, L: Link> {
    connection: &'c mut Connection<L>,
    config: TransmitConfig,
}

impl<'c, L: Link> Transmitter<'c, L> {
    pub fn new(connection: &'c mut Connection<L>, config: TransmitConfig) -> Self {
        Self { connection, config }
    }

    pub fn config(&self) -> &TransmitConfig {
        &self.config
    }

    /// Send a command with the configured inter-chunk delay.
    pub async fn send(&mut self, command: Command, payload: &[u8]) -> Result<(), CatprintError> {
        let delay = self.config.chunk_delay;
        self.send_with_delay(command, payload, delay).await
    }

    /// Send a command, sleeping `delay` after each chunk.
    ///
    /// ## Errors
    ///
    /// - [`CatprintError::NotConnected`] if the link is down before sending
    /// - [`CatprintError::Protocol`] if the payload does not fit in a frame
    /// - [`CatprintError::Link`] if any chunk write fails; the rest of the
    ///   frame is not sent
    pub async fn send_with_delay(
        &mut self,
        command: Command,
        payload: &[u8],
        delay: Duration,
    ) -> Result<(), CatprintError> {
        if !self.connection.is_connected().await {
            return Err(CatprintError::NotConnected);
        }

        let frame = frame::encode(command, payload)?;
        trace!("Sending {} ({} bytes)", command, frame.len());

        for chunk in frame.as_bytes().chunks(self.config.chunk_size.max(1)) {
            self.wait_for_flow().await;
            self.connection.write_chunk(chunk).await?;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn wait_for_flow(&self) {
        let flow = self.connection.flow();
        if flow.is_permitted() {
            return;
        }
        debug!("Waiting for printer to resume");
        while !flow.is_permitted() {
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ConnectConfig;
    use crate::transport::mock::{MockLink, MockPrinter};
    use pretty_assertions::assert_eq;

    fn fast() -> TransmitConfig {
        TransmitConfig {
            chunk_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    async fn connected(printer: &MockPrinter) -> Connection<MockLink> {
        let mut conn = Connection::new(MockLink::new(printer.clone()), ConnectConfig::default());
        conn.connect().await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_small_frame_single_chunk() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        Transmitter::new(&mut conn, fast())
            .send(Command::SetQuality, &[0x33])
            .await
            .unwrap();

        assert_eq!(
            printer.chunks(),
            vec![vec![0x51, 0x78, 0xA4, 0x00, 0x01, 0x00, 0x33, 0x99, 0xFF]]
        );
    }

    #[tokio::test]
    async fn test_chunking_reconstructs_frame() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        let payload: Vec<u8> = (0..=254u8).collect();
        let expected = frame::encode(Command::DrawBitmap, &payload).unwrap();

        Transmitter::new(&mut conn, fast())
            .send(Command::DrawBitmap, &payload)
            .await
            .unwrap();

        // 263 bytes -> 100 + 100 + 63
        let chunks = printer.chunks();
        assert_eq!(chunks.len(), expected.len().div_ceil(100));
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100, 63]);
        assert_eq!(chunks.concat(), expected.as_bytes());
    }

    #[tokio::test]
    async fn test_not_connected() {
        let printer = MockPrinter::new("MX06");
        let mut conn = Connection::new(MockLink::new(printer.clone()), ConnectConfig::default());
        let err = Transmitter::new(&mut conn, fast())
            .send(Command::SetQuality, &[0x33])
            .await
            .unwrap_err();
        assert!(matches!(err, CatprintError::NotConnected));
        assert!(printer.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_payload_sends_nothing() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        let err = Transmitter::new(&mut conn, fast())
            .send(Command::DrawBitmap, &[0u8; 256])
            .await
            .unwrap_err();
        assert!(matches!(err, CatprintError::Protocol(_)));
        assert!(printer.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_aborts_frame() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        printer.fail_writes(1);

        let err = Transmitter::new(&mut conn, fast())
            .send(Command::DrawBitmap, &[0u8; 200])
            .await
            .unwrap_err();
        assert!(matches!(err, CatprintError::Link(_)));
        assert!(printer.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_paused_flow_blocks_writes() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        let flow = conn.flow().clone();
        flow.pause();

        let send = tokio::spawn(async move {
            Transmitter::new(&mut conn, fast())
                .send(Command::FeedPaper, &[20, 0])
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(printer.chunks().is_empty());
        assert!(!send.is_finished());

        flow.resume();
        let result = tokio::time::timeout(Duration::from_millis(100), send)
            .await
            .expect("send should finish after resume")
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(printer.chunks().len(), 1);
    }

    #[tokio::test]
    async fn test_printer_pause_notification_blocks_writes() {
        let printer = MockPrinter::new("MX06");
        let mut conn = connected(&printer).await;
        printer.pause();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let send = tokio::spawn(async move {
            Transmitter::new(&mut conn, fast())
                .send(Command::FeedPaper, &[20, 0])
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(printer.chunks().is_empty());

        printer.resume();
        send.await.unwrap().unwrap();
        assert_eq!(printer.commands().unwrap(), vec![(Command::FeedPaper, vec![20, 0])]);
    }
}
