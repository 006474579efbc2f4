//! # Printer Module
//!
//! This module provides printer-specific configuration.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware specifications

pub mod config;

pub use config::PrinterConfig;
