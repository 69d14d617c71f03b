//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use gratitude_backend::settings::RuntimeConfig;
use mockable::{Clock, DefaultClock};

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) runtime: RuntimeConfig,
    pub(crate) clock: Arc<dyn Clock>,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings.
    #[must_use]
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self {
            runtime,
            clock: Arc::new(DefaultClock),
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.runtime.bind_addr
    }
}
