//! # Error Types
//!
//! This module defines error types used throughout the catprint library.
//!
//! ## Propagation
//!
//! | Origin | Variant | Handled by |
//! |--------|---------|------------|
//! | Frame codec | [`CatprintError::Protocol`] | aborts the current job |
//! | Discovery | [`CatprintError::DeviceNotFound`] | retried inside `connect` |
//! | Connect retry budget | [`CatprintError::ConnectionFailed`] | worker, next job |
//! | Transmitter | [`CatprintError::NotConnected`], [`CatprintError::Link`] | aborts the session |
//! | Worker boundary | [`CatprintError::Job`] | logged, job counted as failed |

use thiserror::Error;

use crate::queue::JobId;

/// Main error type for catprint operations
#[derive(Debug, Error)]
pub enum CatprintError {
    /// Malformed frame, oversized payload, or out-of-order session command
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Discovery finished without seeing a device with the expected name
    #[error("No printer named {0:?} found")]
    DeviceNotFound(String),

    /// Every connection attempt failed
    #[error("Connection failed after {attempts} attempt(s): {last}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        last: Box<CatprintError>,
    },

    /// Send attempted without a live link
    #[error("Not connected to printer")]
    NotConnected,

    /// Transport-level failure (write, subscribe, disconnect)
    #[error("Link error: {0}")]
    Link(String),

    /// Image decoding or processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// A queued job failed; wraps the underlying cause
    #[error("Job {id} failed: {source}")]
    Job {
        id: JobId,
        #[source]
        source: Box<CatprintError>,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatprintError {
    /// Wrap an error at the per-job boundary.
    pub fn job(id: JobId, source: CatprintError) -> Self {
        CatprintError::Job {
            id,
            source: Box::new(source),
        }
    }
}

impl From<image::ImageError> for CatprintError {
    fn from(e: image::ImageError) -> Self {
        CatprintError::Image(e.to_string())
    }
}

#[cfg(feature = "ble")]
impl From<btleplug::Error> for CatprintError {
    fn from(e: btleplug::Error) -> Self {
        CatprintError::Link(e.to_string())
    }
}
