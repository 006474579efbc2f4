//! # catprint - MX06 Thermal Printer Library
//!
//! catprint drives the small MX06 "cat" thermal printers over Bluetooth LE.
//! It provides:
//!
//! - **Protocol implementation**: `0x51 0x78` framing, CRC-8, command builders
//! - **Rasterizer**: text and image to 384-dot monochrome rows
//! - **Transport**: BLE link, reconnecting connection, flow-controlled transmitter
//! - **Job queue**: FIFO print queue drained by a single worker
//! - **HTTP server**: JSON and multipart endpoints that feed the queue
//!
//! ## Quick Start
//!
//! ```no_run
//! use catprint::{
//!     raster::{self, Orientation, TextContent},
//!     session::PrinterSession,
//!     transport::{ConnectConfig, Connection, MockLink, TransmitConfig, Transmitter},
//!     transport::mock::MockPrinter,
//!     printer::PrinterConfig,
//! };
//!
//! # async fn example() -> Result<(), catprint::CatprintError> {
//! // Open a connection (swap MockLink for BleLink with the `ble` feature)
//! let link = MockLink::new(MockPrinter::new("MX06"));
//! let mut connection = Connection::new(link, ConnectConfig::default());
//! connection.connect().await?;
//!
//! // Render text to device rows
//! let config = PrinterConfig::MX06;
//! let content = TextContent { text: "Hello", font_size: 40, font_ref: None };
//! let rows = raster::rasterize_text(&content, config.width_dots, Orientation::Inverted)?;
//!
//! // Prepare, print, finish
//! let transmitter = Transmitter::new(&mut connection, TransmitConfig::for_printer(&config));
//! PrinterSession::new(transmitter).run(&rows, 0x2EE0, 50).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Frame codec, CRC-8, command builders, notifications |
//! | [`raster`] | Text layout, fonts, thresholding, bit packing |
//! | [`transport`] | Link trait, BLE and mock links, connection, transmitter |
//! | [`session`] | Prepare / print / finish command sequence |
//! | [`queue`] | Jobs and the shared job queue |
//! | [`worker`] | Queue consumer that owns the printer |
//! | [`server`] | HTTP ingress |
//! | [`printer`] | Printer configurations |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - MX06 (58mm paper, 384 dots, 203 DPI, Bluetooth LE)
//!
//! Other printers speaking the same `0x51 0x78` protocol should work with
//! a matching [`PrinterConfig`].

pub mod error;
pub mod printer;
pub mod protocol;
pub mod queue;
pub mod raster;
pub mod server;
pub mod session;
pub mod transport;
pub mod worker;

// Re-exports for convenience
pub use error::CatprintError;
pub use printer::PrinterConfig;
pub use queue::{Job, JobQueue};
pub use transport::{Connection, Link};
