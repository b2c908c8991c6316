//! Dashboard web server configuration.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// How often the built-in page re-requests the camera frame.
pub const DEFAULT_VIDEO_REFRESH_MS: u64 = 200;

/// Settings for the local dashboard server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Interface to listen on
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Send permissive CORS headers
    pub enable_cors: bool,
    /// Directory with a custom `index.html` and assets served under `/static`
    pub static_dir: Option<PathBuf>,
    /// Upper bound on simultaneous `/ws` subscribers
    pub max_websocket_connections: usize,
    /// Camera refresh period used by the built-in page
    pub video_refresh_ms: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            static_dir: None,
            max_websocket_connections: 100,
            video_refresh_ms: DEFAULT_VIDEO_REFRESH_MS,
        }
    }
}

impl WebConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    pub fn with_max_websocket_connections(mut self, max: usize) -> Self {
        self.max_websocket_connections = max;
        self
    }

    pub fn with_video_refresh_ms(mut self, refresh_ms: u64) -> Self {
        self.video_refresh_ms = refresh_ms;
        self
    }

    /// Parse `host:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DashboardError::config_error(format!("Invalid bind address: {}", e)))
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.max_websocket_connections == 0 {
            return Err(DashboardError::config_error(
                "max_websocket_connections must be at least 1",
            ));
        }
        if self.video_refresh_ms == 0 {
            return Err(DashboardError::config_error("video_refresh_ms must be positive"));
        }
        Ok(())
    }
}
