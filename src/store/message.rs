//! Message and store document types

use crate::error::{CoreError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the system-assigned identity
pub const OBJECT_ID: &str = "objectId";
/// Field holding the append timestamp
pub const CREATED_AT: &str = "createdAt";
/// Field holding the last-update timestamp (always equal to `createdAt`)
pub const UPDATED_AT: &str = "updatedAt";

/// One chat entry: the caller's fields plus `objectId`, `createdAt` and `updatedAt`.
///
/// Caller fields are kept verbatim and in their original key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Merge the system fields into `fields`. System fields win over caller
    /// fields of the same name.
    pub fn stamp(mut fields: Map<String, Value>, object_id: u64, now: DateTime<Utc>) -> Self {
        let timestamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true));

        fields.insert(OBJECT_ID.to_string(), Value::from(object_id));
        fields.insert(CREATED_AT.to_string(), timestamp.clone());
        fields.insert(UPDATED_AT.to_string(), timestamp);

        Message(fields)
    }

    /// The assigned identity, if this entry carries a non-negative integer one
    pub fn object_id(&self) -> Option<u64> {
        self.0.get(OBJECT_ID).and_then(Value::as_u64)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Message(fields)
    }
}

/// The whole store as persisted and served: `{"results": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub results: Vec<Message>,
}

impl StoreDocument {
    /// Identity for the next append: highest existing `objectId` plus one.
    /// Entries without a usable `objectId` count as 0. Fails once the id space
    /// is exhausted rather than reusing an identity.
    pub fn next_object_id(&self) -> Result<u64> {
        self.results
            .iter()
            .map(|m| m.object_id().unwrap_or(0))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| CoreError::Storage("objectId space exhausted".to_string()))
    }

    /// Stamp `fields` with the next identity and the current time, then append.
    pub fn push_new(&mut self, fields: Map<String, Value>) -> Result<Message> {
        let message = Message::stamp(fields, self.next_object_id()?, Utc::now());
        self.results.push(message.clone());
        Ok(message)
    }
}
