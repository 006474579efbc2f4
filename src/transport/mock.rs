//! # Mock Printer Link
//!
//! An in-memory stand-in for a BLE printer. The [`MockLink`] half is handed
//! to a [`Connection`](super::Connection); the [`MockPrinter`] half stays
//! with the caller to script failures, push notifications and inspect what
//! was written.
//!
//! ```
//! use catprint::transport::mock::{MockLink, MockPrinter};
//!
//! let printer = MockPrinter::new("MX06");
//! let link = MockLink::new(printer.clone());
//! assert!(printer.chunks().is_empty());
//! # drop(link);
//! ```

use async_trait::async_trait;
use futures_lite::stream;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use super::{Link, NotificationStream};
use crate::error::CatprintError;
use crate::protocol::commands::Command;
use crate::protocol::frame;
use crate::protocol::notify::FlowSignal;

/// A simulated printer found by [`MockLink::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDevice {
    pub name: String,
}

#[derive(Debug, Default)]
struct MockState {
    name: String,
    connected: bool,
    connect_failures: u32,
    write_failures: u32,
    auto_pause: Option<(usize, Duration)>,
    chunks: Vec<Vec<u8>>,
    scans: u32,
    connects: u32,
    notify_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

/// Test-side handle on a simulated printer.
#[derive(Debug, Clone)]
pub struct MockPrinter {
    state: Arc<Mutex<MockState>>,
}

impl MockPrinter {
    /// A printer advertising `name`.
    pub fn new(name: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                name: name.to_string(),
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next `n` connection attempts.
    pub fn fail_connects(&self, n: u32) {
        self.state().connect_failures = n;
    }

    /// Fail the next `n` chunk writes.
    pub fn fail_writes(&self, n: u32) {
        self.state().write_failures = n;
    }

    /// Send a pause after every `every` chunks and resume `resume_after`
    /// later, like a printer draining its line buffer.
    pub fn auto_pause(&self, every: usize, resume_after: Duration) {
        self.state().auto_pause = Some((every.max(1), resume_after));
    }

    /// Push a raw notification. Returns `false` when nobody is connected.
    pub fn notify(&self, data: Vec<u8>) -> bool {
        match &self.state().notify_tx {
            Some(tx) => tx.send(data).is_ok(),
            None => false,
        }
    }

    pub fn pause(&self) -> bool {
        self.notify(FlowSignal::Pause.to_notification())
    }

    pub fn resume(&self) -> bool {
        self.notify(FlowSignal::Resume.to_notification())
    }

    /// Simulate the printer going out of range.
    pub fn drop_connection(&self) {
        let mut state = self.state();
        state.connected = false;
        state.notify_tx = None;
    }

    /// Every chunk written so far, in order
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.state().chunks.clone()
    }

    /// All written bytes, concatenated
    pub fn written(&self) -> Vec<u8> {
        self.state().chunks.concat()
    }

    /// Decode everything written so far into commands.
    pub fn commands(&self) -> Result<Vec<(Command, Vec<u8>)>, CatprintError> {
        frame::decode_stream(&self.written())
    }

    pub fn clear(&self) {
        self.state().chunks.clear();
    }

    pub fn scan_count(&self) -> u32 {
        self.state().scans
    }

    pub fn connect_count(&self) -> u32 {
        self.state().connects
    }

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }
}

/// Link half of a simulated printer.
#[derive(Debug, Clone)]
pub struct MockLink {
    printer: MockPrinter,
}

impl MockLink {
    pub fn new(printer: MockPrinter) -> Self {
        Self { printer }
    }

    pub fn printer(&self) -> &MockPrinter {
        &self.printer
    }
}

#[async_trait]
impl Link for MockLink {
    type Device = MockDevice;

    async fn scan(&mut self, name: &str, _timeout: Duration) -> Result<MockDevice, CatprintError> {
        let mut state = self.printer.state();
        state.scans += 1;
        if state.name == name {
            Ok(MockDevice {
                name: state.name.clone(),
            })
        } else {
            Err(CatprintError::DeviceNotFound(name.to_string()))
        }
    }

    async fn connect(&mut self, _device: &MockDevice) -> Result<NotificationStream, CatprintError> {
        let mut state = self.printer.state();
        state.connects += 1;
        if state.connect_failures > 0 {
            state.connect_failures -= 1;
            return Err(CatprintError::Link("Simulated connection failure".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.notify_tx = Some(tx);
        state.connected = true;

        let notifications = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|data| (data, rx))
        });
        Ok(Box::pin(notifications))
    }

    async fn disconnect(&mut self) -> Result<(), CatprintError> {
        let mut state = self.printer.state();
        state.connected = false;
        state.notify_tx = None;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.printer.state().connected
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CatprintError> {
        let mut state = self.printer.state();
        if !state.connected {
            return Err(CatprintError::Link("Simulated printer is disconnected".to_string()));
        }
        if state.write_failures > 0 {
            state.write_failures -= 1;
            return Err(CatprintError::Link("Simulated write failure".to_string()));
        }
        state.chunks.push(chunk.to_vec());

        if let (Some((every, resume_after)), Some(tx)) = (state.auto_pause, &state.notify_tx) {
            if state.chunks.len() % every == 0 {
                let _ = tx.send(FlowSignal::Pause.to_notification());
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(resume_after).await;
                    let _ = tx.send(FlowSignal::Resume.to_notification());
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::StreamExt;

    #[tokio::test]
    async fn test_scan_matches_name() {
        let printer = MockPrinter::new("MX06");
        let mut link = MockLink::new(printer.clone());
        assert!(link.scan("MX06", Duration::ZERO).await.is_ok());
        assert!(matches!(
            link.scan("MX10", Duration::ZERO).await,
            Err(CatprintError::DeviceNotFound(_))
        ));
        assert_eq!(printer.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_writes_are_recorded() {
        let printer = MockPrinter::new("MX06");
        let mut link = MockLink::new(printer.clone());
        let device = link.scan("MX06", Duration::ZERO).await.unwrap();
        let _notifications = link.connect(&device).await.unwrap();

        link.write_chunk(&[1, 2]).await.unwrap();
        link.write_chunk(&[3]).await.unwrap();
        assert_eq!(printer.chunks(), vec![vec![1, 2], vec![3]]);
        assert_eq!(printer.written(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_notification_stream_ends_on_disconnect() {
        let printer = MockPrinter::new("MX06");
        let mut link = MockLink::new(printer.clone());
        let device = link.scan("MX06", Duration::ZERO).await.unwrap();
        let mut notifications = link.connect(&device).await.unwrap();

        assert!(printer.pause());
        assert_eq!(notifications.next().await, Some(FlowSignal::Pause.to_notification()));

        link.disconnect().await.unwrap();
        assert_eq!(notifications.next().await, None);
        assert!(!printer.pause());
    }

    #[tokio::test]
    async fn test_write_failures() {
        let printer = MockPrinter::new("MX06");
        printer.fail_writes(1);
        let mut link = MockLink::new(printer.clone());
        let device = link.scan("MX06", Duration::ZERO).await.unwrap();
        let _notifications = link.connect(&device).await.unwrap();

        assert!(matches!(link.write_chunk(&[1]).await, Err(CatprintError::Link(_))));
        assert!(link.write_chunk(&[1]).await.is_ok());
        assert_eq!(printer.chunks().len(), 1);
    }
}
