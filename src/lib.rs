//! Chatstore - minimal HTTP service for storing and retrieving chat messages
//!
//! This crate provides:
//! - A message store with JSON-file and in-memory backends
//! - The `/classes/messages` request handler (append on POST, list on GET)
//! - Read-time ordering via `?order=field` / `?order=-field`
//! - An axum HTTP server wrapping the handler
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use chatstore::{Config, Core};
//!
//! let config = Config::from_file("~/.chatstore/config.toml").unwrap();
//! let core = Core::new(config);
//! // core.start_api_server().await.unwrap();
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! chatstore --config ~/.chatstore/config.toml
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{CoreError, RequestError, Result};
pub use handlers::MessageHandler;
pub use store::MessageStore;

use std::sync::Arc;

/// Core service that owns the store and serves it over HTTP
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Message store shared by every request
    store: Arc<MessageStore>,
}

impl Core {
    /// Create a new Core instance with the store selected by the configuration
    pub fn new(config: Config) -> Self {
        let store = Arc::new(MessageStore::from_config(&config));
        Core { config, store }
    }

    /// Create a Core instance around an existing store
    pub fn with_store(config: Config, store: Arc<MessageStore>) -> Self {
        Core { config, store }
    }

    /// Get a reference to the store
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    /// Request handler bound to this core's store
    pub fn handler(&self) -> MessageHandler {
        MessageHandler::new(self.store.clone())
    }

    /// Start the HTTP API server
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!(
            "Starting API server on {} (store: {})",
            addr,
            self.store.describe()
        );
        api::serve(addr, self.handler()).await
    }
}
