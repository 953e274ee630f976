//! Server configuration.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::server::error::Error;

/// HTTP server configuration.
///
/// Every field has a default, so a JSON file only needs the ones it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The address to bind to. Port 0 picks an ephemeral port.
    pub addr: SocketAddr,
    /// The directory files are served from.
    pub root: PathBuf,
    /// The number of accept loops sharing the listening socket.
    pub acceptors: usize,
    /// Deadline for each line read from a connection.
    pub read_timeout_secs: u64,
    /// Blank lines tolerated before a request line.
    pub max_empty_lines: usize,
    /// Longest request or header line accepted, in bytes.
    pub max_line_length: usize,
    /// Header lines accepted per request.
    pub max_headers: usize,
    /// How long pool shutdown waits for running tasks.
    pub shutdown_grace_secs: u64,
    /// File served for targets ending in `/`.
    pub index_file: Option<String>,
    /// Extension to MIME type overrides.
    pub mime_types: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            root: PathBuf::from("wwwroot"),
            acceptors: 2,
            read_timeout_secs: 10,
            max_empty_lines: 10,
            max_line_length: 8192,
            max_headers: 100,
            shutdown_grace_secs: 30,
            index_file: Some("index.html".to_string()),
            mime_types: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read(path)?;
        Self::from_json_slice(&contents)
    }

    /// Parse a configuration from JSON bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
