//! # Printer Transport Layer
//!
//! This module moves frames from the host to the printer.
//!
//! ## Layers
//!
//! | Layer | Type | Responsibility |
//! |-------|------|----------------|
//! | Link | [`Link`] | scan, connect, raw chunk writes, notification stream |
//! | Connection | [`Connection`] | owns one link, retry policy, flow-control listener |
//! | Transmitter | [`Transmitter`] | framing, chunking, flow-control gating |
//!
//! ## Available Links
//!
//! - [`ble`]: Bluetooth LE via `btleplug` (feature `ble`)
//! - [`mock`]: In-memory printer for tests and dry runs

#[cfg(feature = "ble")]
pub mod ble;
pub mod connection;
pub mod flow;
pub mod mock;
pub mod transmitter;

use async_trait::async_trait;
use futures_lite::Stream;
use std::fmt::Debug;
use std::pin::Pin;
use std::time::Duration;

use crate::error::CatprintError;

#[cfg(feature = "ble")]
pub use ble::BleLink;
pub use connection::{ConnectConfig, Connection};
pub use flow::FlowState;
pub use mock::MockLink;
pub use transmitter::{TransmitConfig, Transmitter};

/// Raw notification payloads pushed by the printer.
///
/// The stream ends when the link goes down.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// # Printer Link
///
/// The physical connection to one printer. Implementations only move bytes;
/// retries, framing and flow control live in [`Connection`] and
/// [`Transmitter`].
#[async_trait]
pub trait Link: Send + Sync {
    /// Handle identifying a discovered printer
    type Device: Clone + Debug + Send + Sync;

    /// Look for a printer advertising `name`.
    ///
    /// Fails with [`CatprintError::DeviceNotFound`] when nothing matches
    /// within `timeout`.
    async fn scan(&mut self, name: &str, timeout: Duration) -> Result<Self::Device, CatprintError>;

    /// Connect to `device` and subscribe to its notifications.
    async fn connect(&mut self, device: &Self::Device) -> Result<NotificationStream, CatprintError>;

    /// Drop the connection. Disconnecting an idle link is a no-op.
    async fn disconnect(&mut self) -> Result<(), CatprintError>;

    /// Whether the link is currently usable.
    async fn is_connected(&self) -> bool;

    /// Write one chunk to the printer's write characteristic.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CatprintError>;
}
