//! Server bind configuration.

use crate::error::{Result, ServerError};
use std::net::{IpAddr, SocketAddr};

/// Where the HTTP server binds.
///
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::new("127.0.0.1", 8080);
/// assert_eq!(config.address(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// HTTP port; 0 picks an ephemeral port
    pub http_port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// Parse the bind address. `host` must be an IP literal.
    pub fn http_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.address()))?;
        Ok(SocketAddr::new(ip, self.http_port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 8080)
    }
}
