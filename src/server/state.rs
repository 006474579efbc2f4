//! Server state and configuration.

use crate::queue::JobQueue;

/// Default listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:5000")
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    /// Ingress side of the print queue; the worker holds another handle
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(queue: JobQueue) -> Self {
        Self { queue }
    }
}
