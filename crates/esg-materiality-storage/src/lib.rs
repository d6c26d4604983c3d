use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use esg_materiality_core::PersistedAssessment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Fixed key the assessment blob lives under; strategy seeding reads it back
/// from the same key.
pub const ASSESSMENT_STORAGE_KEY: &str = "materialityAssessment";

pub trait StorageBackend: Send {
    fn save(&mut self, key: &str, assessment: &PersistedAssessment) -> Result<(), StorageError>;
    fn load(&self, key: &str) -> Result<Option<PersistedAssessment>, StorageError>;
    fn clear(&mut self, key: &str) -> Result<bool, StorageError>;
    fn keys(&self) -> Vec<String>;
    fn stats(&self) -> Value;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidInput(
            "storage key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn decode(blob: Option<&Value>) -> Result<Option<PersistedAssessment>, StorageError> {
    match blob {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    entries: BTreeMap<String, Value>,
}

/// Key -> blob map written to a single JSON file after every mutation.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let persisted = Persisted::default();
            let bytes = serde_json::to_vec_pretty(&persisted)?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        debug!(path = %path.display(), keys = persisted.entries.len(), "opened json store");

        Ok(Self {
            path,
            entries: persisted.entries,
        })
    }

    /// Writes `entries` to disk and only then adopts them, so a failed
    /// write leaves the in-memory view matching the file.
    fn commit(&mut self, entries: BTreeMap<String, Value>) -> Result<(), StorageError> {
        let persisted = Persisted { entries };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        fs::write(&self.path, bytes)?;
        debug!(path = %self.path.display(), keys = persisted.entries.len(), "persisted json store");
        self.entries = persisted.entries;
        Ok(())
    }
}

impl StorageBackend for JsonFileStore {
    fn save(&mut self, key: &str, assessment: &PersistedAssessment) -> Result<(), StorageError> {
        validate_key(key)?;
        let blob = serde_json::to_value(assessment)?;
        let mut next = self.entries.clone();
        next.insert(key.to_string(), blob);
        self.commit(next)
    }

    fn load(&self, key: &str) -> Result<Option<PersistedAssessment>, StorageError> {
        validate_key(key)?;
        decode(self.entries.get(key))
    }

    fn clear(&mut self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)?;
        Ok(true)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn stats(&self) -> Value {
        serde_json::json!({
            "backend": "json",
            "count": self.entries.len(),
            "path": self.path,
        })
    }
}

/// Process-lifetime store with the same contract as [`JsonFileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStore {
    fn save(&mut self, key: &str, assessment: &PersistedAssessment) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries
            .insert(key.to_string(), serde_json::to_value(assessment)?);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<PersistedAssessment>, StorageError> {
        validate_key(key)?;
        decode(self.entries.get(key))
    }

    fn clear(&mut self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn stats(&self) -> Value {
        serde_json::json!({
            "backend": "memory",
            "count": self.entries.len(),
        })
    }
}
