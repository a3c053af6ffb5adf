//! JSON file backend.
//!
//! The whole store lives in one file as `{"results": [...]}`. Every append
//! rewrites the file: the new document goes to a sibling temp file which is
//! then renamed over the target, so readers only ever see committed state.

use super::message::{Message, StoreDocument};
use crate::error::{CoreError, Result};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct FileStore {
    path: PathBuf,
    /// Held across load-append-persist so concurrent POSTs cannot lose updates
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        FileStore {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the committed store. Any read or parse failure yields an empty store.
    pub async fn load(&self) -> StoreDocument {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Store file {} not found, starting empty", self.path.display());
                return StoreDocument::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read store file; treating as empty"
                );
                return StoreDocument::default();
            }
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return StoreDocument::default();
        }

        match serde_json::from_slice::<StoreDocument>(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to parse store file; treating as empty"
                );
                StoreDocument::default()
            }
        }
    }

    /// Append a message and persist the whole store before returning.
    pub async fn append(&self, fields: Map<String, Value>) -> Result<Message> {
        let _guard = self.write_lock.lock().await;

        let mut doc = self.load().await;
        let message = doc.push_new(fields)?;
        self.persist(&doc).await?;

        Ok(message)
    }

    async fn persist(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    CoreError::Storage(format!(
                        "failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let payload = serde_json::to_vec(doc)?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|e| CoreError::Storage(format!("failed to write store payload: {}", e)))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CoreError::Storage(format!(
                "failed to replace store file {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("messages.json"));
        assert!(store.load().await.results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_corrupt_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        let store = FileStore::new(path.clone());

        std::fs::write(&path, "").unwrap();
        assert!(store.load().await.results.is_empty());

        std::fs::write(&path, "{not json").unwrap();
        assert!(store.load().await.results.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::create_dir(&path).unwrap();

        let err = std::fs::read(&path).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::NotFound);

        let store = FileStore::new(path);
        assert!(store.load().await.results.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_ids_do_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        let original = format!(r#"{{"results":[{{"objectId":{}}}]}}"#, u64::MAX);
        std::fs::write(&path, &original).unwrap();

        let store = FileStore::new(path.clone());
        let result = store.append(Map::new()).await;

        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_append_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("messages.json");

        let store = FileStore::new(path.clone());
        store.append(fields(json!({"message": "first"}))).await.unwrap();
        store.append(fields(json!({"message": "second"}))).await.unwrap();

        let reopened = FileStore::new(path.clone());
        let doc = reopened.load().await;
        assert_eq!(doc.results.len(), 2);
        assert_eq!(doc.results[1].get("message"), Some(&json!("second")));
        assert_eq!(doc.results[1].object_id(), Some(2));

        let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["results"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_append_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("messages.json"));
        store.append(Map::new()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("messages.json")]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("messages.json")));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(fields(json!({ "n": i }))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let doc = store.load().await;
        assert_eq!(doc.results.len(), 16);
        let mut ids: Vec<u64> = doc.results.iter().filter_map(Message::object_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unwritable_location_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = FileStore::new(blocker.join("messages.json"));
        let result = store.append(Map::new()).await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
    }
}
