//! Configuration management for Chatstore
//!
//! Loads settings from TOML file at ~/.chatstore/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend for the message store
    #[serde(default)]
    pub storage: Storage,

    /// Data directory (defaults to ~/.chatstore)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Store file configuration
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".chatstore"))
        .unwrap_or_else(|| PathBuf::from(".chatstore"))
}

/// Where messages live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// JSON file under `data_dir`
    #[default]
    File,
    /// Volatile in-memory store, lost on restart
    Memory,
}

impl std::str::FromStr for Storage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(Storage::File),
            "memory" => Ok(Storage::Memory),
            other => Err(CoreError::Config(format!(
                "Unknown storage '{}' (expected \"file\" or \"memory\")",
                other
            ))),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Store file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// File name of the store, relative to `data_dir`
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_file_name() -> String {
    "messages.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file_name: default_file_name(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: Storage::default(),
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Load configuration from file or use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".chatstore").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".chatstore/config.toml"))
    }

    /// Get the data directory, expanding ~ if present
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    /// Full path of the JSON store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.file_name)
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("CHATSTORE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CHATSTORE_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(data_dir) = std::env::var("CHATSTORE_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(storage) = std::env::var("CHATSTORE_STORAGE") {
            match storage.parse() {
                Ok(storage) => self.storage = storage,
                Err(e) => tracing::warn!("Ignoring CHATSTORE_STORAGE: {}", e),
            }
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Chatstore Configuration

# Where messages are kept
# "file"   = JSON file under data_dir (survives restarts)
# "memory" = in-process only (lost on restart)
storage = "file"

# Directory holding the store file
data_dir = "~/.chatstore"

[server]
# Port to listen on (default: 3000)
port = 3000

# Host to bind to
# "127.0.0.1" = localhost only
# "0.0.0.0" = all interfaces
host = "127.0.0.1"

[store]
# Store file name, relative to data_dir
file_name = "messages.json"
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
