//! # Printer Connection
//!
//! Owns exactly one [`Link`] and everything tied to its lifetime:
//!
//! - the cached device handle, so discovery runs once per process
//! - the connect retry policy ([`ConnectConfig`])
//! - the notification listener task that turns printer notifications into
//!   [`FlowState`] updates
//!
//! ## Retry Policy
//!
//! ```text
//! attempt 1 ──fail──► sleep retry_delay ──► attempt 2 ──fail──► ... ──► ConnectionFailed
//!     │                                         │
//!     └─ scan first if no device is cached      └─ same
//! ```

use futures_lite::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{FlowState, Link, NotificationStream};
use crate::error::CatprintError;
use crate::printer::PrinterConfig;
use crate::protocol::notify::FlowSignal;

/// Default discovery timeout
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of connection attempts
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
/// Default pause between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Discovery and retry settings.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Advertised name to look for during discovery
    pub device_name: String,
    /// How long a single scan may take
    pub scan_timeout: Duration,
    /// Connection attempts before giving up (at least 1)
    pub attempts: u32,
    /// Pause between failed attempts
    pub retry_delay: Duration,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            device_name: PrinterConfig::MX06.name.to_string(),
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// A lazily (re)connected printer link.
pub struct Connection<L: Link> {
    link: L,
    config: ConnectConfig,
    device: Option<L::Device>,
    flow: FlowState,
    listener: Option<JoinHandle<()>>,
    connected: bool,
}

impl<L: Link> Connection<L> {
    pub fn new(link: L, config: ConnectConfig) -> Self {
        Self {
            link,
            config,
            device: None,
            flow: FlowState::new(),
            listener: None,
            connected: false,
        }
    }

    /// Flow-control state fed by this connection's listener
    pub fn flow(&self) -> &FlowState {
        &self.flow
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    /// Whether a connect succeeded and the link still reports up.
    pub async fn is_connected(&self) -> bool {
        self.connected && self.link.is_connected().await
    }

    /// Connect unless already connected.
    pub async fn ensure_connected(&mut self) -> Result<(), CatprintError> {
        if self.is_connected().await {
            return Ok(());
        }
        self.connect().await
    }

    /// Connect with retries.
    ///
    /// ## Errors
    ///
    /// [`CatprintError::ConnectionFailed`] carrying the last attempt's error
    /// once every attempt has failed.
    pub async fn connect(&mut self) -> Result<(), CatprintError> {
        let attempts = self.config.attempts.max(1);
        let mut last = CatprintError::NotConnected;

        for attempt in 1..=attempts {
            info!("Connecting to printer (attempt {}/{})...", attempt, attempts);
            match self.try_connect().await {
                Ok(()) => {
                    info!("Connected to printer");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection attempt {} failed: {}", attempt, e);
                    last = e;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(CatprintError::ConnectionFailed {
            attempts,
            last: Box::new(last),
        })
    }

    async fn try_connect(&mut self) -> Result<(), CatprintError> {
        let device = match &self.device {
            Some(device) => device.clone(),
            None => {
                info!("Scanning for printer {:?}...", self.config.device_name);
                let device = self
                    .link
                    .scan(&self.config.device_name, self.config.scan_timeout)
                    .await?;
                info!("Found printer: {:?}", device);
                self.device = Some(device.clone());
                device
            }
        };

        let notifications = self.link.connect(&device).await?;
        self.flow.resume();
        self.spawn_listener(notifications);
        self.connected = true;
        Ok(())
    }

    fn spawn_listener(&mut self, mut notifications: NotificationStream) {
        if let Some(previous) = self.listener.take() {
            previous.abort();
        }

        let flow = self.flow.clone();
        self.listener = Some(tokio::spawn(async move {
            while let Some(data) = notifications.next().await {
                match FlowSignal::decode(&data) {
                    Some(FlowSignal::Pause) => {
                        debug!("Printer paused transmission");
                        flow.pause();
                    }
                    Some(FlowSignal::Resume) => {
                        debug!("Printer resumed transmission");
                        flow.resume();
                    }
                    None => trace!("Ignoring notification {:02x?}", data),
                }
            }
            // Link is gone; wake any paused sender so its next write fails
            debug!("Notification stream closed");
            flow.resume();
        }));
    }

    /// Write one raw chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CatprintError> {
        if !self.connected {
            return Err(CatprintError::NotConnected);
        }
        self.link.write_chunk(chunk).await
    }

    /// Tear the link down. The cached device is kept for the next connect.
    pub async fn disconnect(&mut self) -> Result<(), CatprintError> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        let was_connected = std::mem::replace(&mut self.connected, false);
        self.link.disconnect().await?;
        if was_connected {
            info!("Disconnected from printer");
        }
        Ok(())
    }
}

impl<L: Link> Drop for Connection<L> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
