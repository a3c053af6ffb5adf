//! In-memory backend.
//!
//! Volatile storage used when `storage = "memory"`. All data is lost on restart.

use super::message::{Message, StoreDocument};
use crate::error::Result;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    doc: RwLock<StoreDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self) -> StoreDocument {
        self.doc.read().await.clone()
    }

    /// The write lock covers id assignment and push, so appends are serialized.
    pub async fn append(&self, fields: Map<String, Value>) -> Result<Message> {
        self.doc.write().await.push_new(fields)
    }
}
