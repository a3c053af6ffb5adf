//! MessageStore: abstracts the storage backend behind the request handler.
//!
//! Uses enum dispatch to support multiple backends without trait objects.
//! - `File` variant: JSON file on disk (storage = "file")
//! - `Memory` variant: in-process document (storage = "memory")
//!
//! Appends are serialized per store; reads see the last committed document
//! and never wait on a writer.

mod file;
mod memory;
pub mod message;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use message::{Message, StoreDocument};

use crate::config::{Config, Storage};
use crate::error::Result;
use serde_json::{Map, Value};

pub enum MessageStore {
    /// JSON file backend
    File(FileStore),
    /// In-memory backend
    Memory(MemoryStore),
}

impl MessageStore {
    /// Build the backend selected by the configuration
    pub fn from_config(config: &Config) -> Self {
        match config.storage {
            Storage::File => MessageStore::File(FileStore::new(config.store_path())),
            Storage::Memory => MessageStore::Memory(MemoryStore::new()),
        }
    }

    pub fn memory() -> Self {
        MessageStore::Memory(MemoryStore::new())
    }

    /// Current store document. Never fails: an unreadable store is empty.
    pub async fn load(&self) -> StoreDocument {
        match self {
            MessageStore::File(store) => store.load().await,
            MessageStore::Memory(store) => store.load().await,
        }
    }

    /// All messages in append order
    pub async fn list(&self) -> Vec<Message> {
        self.load().await.results
    }

    /// Stamp and append a message. Returns once the store is durably updated.
    pub async fn append(&self, fields: Map<String, Value>) -> Result<Message> {
        match self {
            MessageStore::File(store) => store.append(fields).await,
            MessageStore::Memory(store) => store.append(fields).await,
        }
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            MessageStore::File(store) => format!("file {}", store.path().display()),
            MessageStore::Memory(_) => "memory".to_string(),
        }
    }
}
