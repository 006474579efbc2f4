//! # Bluetooth LE Link
//!
//! Talks to the printer through the host's first Bluetooth adapter using
//! `btleplug` (BlueZ on Linux, CoreBluetooth on macOS, WinRT on Windows).
//!
//! ## GATT Layout
//!
//! | Characteristic | UUID | Use |
//! |----------------|------|-----|
//! | write | `0000AE01-0000-1000-8000-00805F9B34FB` | frame chunks, write without response |
//! | notify | `0000AE02-0000-1000-8000-00805F9B34FB` | status and flow control |
//!
//! ## Linux Setup
//!
//! No pairing is needed; the printer only has to be powered on and not
//! connected to another host (e.g. the vendor phone app). The user running
//! the server needs access to the BlueZ D-Bus API.

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures_lite::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Link, NotificationStream};
use crate::error::CatprintError;
use crate::printer::PrinterConfig;

/// How often discovered peripherals are re-checked while scanning
const SCAN_POLL: Duration = Duration::from_millis(250);

/// BLE link to a single printer.
pub struct BleLink {
    adapter: Option<Adapter>,
    peripheral: Option<Peripheral>,
    write_characteristic: Option<Characteristic>,
    write_uuid: Uuid,
    notify_uuid: Uuid,
}

impl BleLink {
    /// Create a link for the characteristics described by `printer`.
    pub fn new(printer: &PrinterConfig) -> Result<Self, CatprintError> {
        let parse = |uuid: &str| {
            Uuid::parse_str(uuid)
                .map_err(|e| CatprintError::Link(format!("Invalid characteristic UUID {}: {}", uuid, e)))
        };
        Ok(Self {
            adapter: None,
            peripheral: None,
            write_characteristic: None,
            write_uuid: parse(printer.write_characteristic)?,
            notify_uuid: parse(printer.notify_characteristic)?,
        })
    }

    async fn adapter(&mut self) -> Result<Adapter, CatprintError> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CatprintError::Link("No Bluetooth adapter found".to_string()))?;
        self.adapter = Some(adapter.clone());
        Ok(adapter)
    }

    fn characteristic(&self, peripheral: &Peripheral, uuid: Uuid) -> Result<Characteristic, CatprintError> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| CatprintError::Link(format!("Printer has no characteristic {}", uuid)))
    }
}

async fn find_named(adapter: &Adapter, name: &str) -> Result<Option<Peripheral>, CatprintError> {
    for peripheral in adapter.peripherals().await? {
        let Some(properties) = peripheral.properties().await? else {
            continue;
        };
        if properties.local_name.as_deref() == Some(name) {
            debug!("Found {} at {}", name, properties.address);
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

#[async_trait]
impl Link for BleLink {
    type Device = Peripheral;

    async fn scan(&mut self, name: &str, timeout: Duration) -> Result<Peripheral, CatprintError> {
        let adapter = self.adapter().await?;
        adapter.start_scan(ScanFilter::default()).await?;

        let deadline = Instant::now() + timeout;
        let found = loop {
            match find_named(&adapter, name).await {
                Ok(Some(peripheral)) => break Ok(Some(peripheral)),
                Ok(None) if Instant::now() >= deadline => break Ok(None),
                Ok(None) => tokio::time::sleep(SCAN_POLL).await,
                Err(e) => break Err(e),
            }
        };

        if let Err(e) = adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        found?.ok_or_else(|| CatprintError::DeviceNotFound(name.to_string()))
    }

    async fn connect(&mut self, device: &Peripheral) -> Result<NotificationStream, CatprintError> {
        if !device.is_connected().await? {
            device.connect().await?;
        }
        device.discover_services().await?;

        let write = self.characteristic(device, self.write_uuid)?;
        let notify = self.characteristic(device, self.notify_uuid)?;
        device.subscribe(&notify).await?;

        let notify_uuid = self.notify_uuid;
        let notifications = device
            .notifications()
            .await?
            .filter(move |n| n.uuid == notify_uuid)
            .map(|n| n.value);

        self.peripheral = Some(device.clone());
        self.write_characteristic = Some(write);
        Ok(Box::pin(notifications))
    }

    async fn disconnect(&mut self) -> Result<(), CatprintError> {
        self.write_characteristic = None;
        if let Some(peripheral) = self.peripheral.take() {
            if peripheral.is_connected().await.unwrap_or(false) {
                peripheral.disconnect().await?;
            }
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match &self.peripheral {
            Some(peripheral) => peripheral.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CatprintError> {
        let (Some(peripheral), Some(characteristic)) = (&self.peripheral, &self.write_characteristic) else {
            return Err(CatprintError::NotConnected);
        };
        peripheral
            .write(characteristic, chunk, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }
}
