//! Local key-value persistence
//!
//! A single JSON object on disk. Holds the saved-query slot and the recent
//! query list; the rendering engine itself never touches it.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::DataError;

pub const SAVED_QUERY_KEY: &str = "savedQuery";
pub const QUERY_HISTORY_KEY: &str = "queryHistory";

/// JSON-file backed key-value store
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Discarding corrupt store {:?}: {}", path, e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!("Cannot read store {:?}: {}", path, e);
                Map::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed read; a value of the wrong shape reads as absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring malformed store entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Write `value` under `key` and flush the whole store to disk
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), DataError> {
        self.entries.insert(key.to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), DataError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), DataError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn saved_query(&self) -> Option<String> {
        self.get(SAVED_QUERY_KEY)
    }

    pub fn save_query(&mut self, question: &str) -> Result<(), DataError> {
        self.set(SAVED_QUERY_KEY, &question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = LocalStore::open(&path);
        store.save_query("aylık satışlar").unwrap();
        store.set(QUERY_HISTORY_KEY, &vec!["a", "b"]).unwrap();

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.saved_query().as_deref(), Some("aylık satışlar"));
        assert_eq!(
            reopened.get::<Vec<String>>(QUERY_HISTORY_KEY),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(&path);
        assert_eq!(store.saved_query(), None);
    }

    #[test]
    fn test_wrong_shape_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("store.json"));
        store.set(QUERY_HISTORY_KEY, &42).unwrap();
        assert_eq!(store.get::<Vec<String>>(QUERY_HISTORY_KEY), None);

        store.remove(QUERY_HISTORY_KEY).unwrap();
        assert_eq!(store.get::<u32>(QUERY_HISTORY_KEY), None);
    }
}
