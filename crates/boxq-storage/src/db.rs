//! Database - JSON file persistence for application state.
//!
//! Boxes and globals are stored hex encoded under two columns of a single
//! `state.json` file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::global_state::StateValue;
use crate::state::AppState;

const STATE_FILE: &str = "state.json";

/// On-disk layout of [`AppState`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    /// box name (hex) -> contents (hex)
    boxes: BTreeMap<String, String>,
    /// key (hex) -> value
    globals: BTreeMap<String, StoredValue>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum StoredValue {
    Uint(u64),
    Bytes(String),
}

impl From<&AppState> for StoredState {
    fn from(state: &AppState) -> Self {
        let boxes = state
            .boxes
            .iter()
            .map(|(name, data)| (hex::encode(name), hex::encode(data)))
            .collect();
        let globals = state
            .globals
            .iter()
            .map(|(key, value)| {
                let stored = match value {
                    StateValue::Uint(v) => StoredValue::Uint(*v),
                    StateValue::Bytes(b) => StoredValue::Bytes(hex::encode(b)),
                };
                (hex::encode(key), stored)
            })
            .collect();
        Self { boxes, globals }
    }
}

impl TryFrom<StoredState> for AppState {
    type Error = StorageError;

    fn try_from(stored: StoredState) -> Result<Self, Self::Error> {
        let mut state = AppState::new();
        for (name, data) in stored.boxes {
            state.boxes.insert(hex::decode(name)?, hex::decode(data)?);
        }
        for (key, value) in stored.globals {
            let value = match value {
                StoredValue::Uint(v) => StateValue::Uint(v),
                StoredValue::Bytes(b) => StateValue::Bytes(hex::decode(b)?),
            };
            state.globals.insert(hex::decode(key)?, value);
        }
        Ok(state)
    }
}

/// Database - Simple JSON file-based storage
pub struct Database {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// Load the stored state, or an empty state if nothing was saved yet.
    pub fn load(&self) -> Result<AppState, StorageError> {
        let _guard = self.lock.read();
        let data_file = self.path.join(STATE_FILE);
        if !data_file.exists() {
            return Ok(AppState::new());
        }

        let content = fs::read_to_string(&data_file)?;
        let stored: StoredState = serde_json::from_str(&content)
            .map_err(|e| StorageError::Deserialization(e.to_string()))?;
        let state = AppState::try_from(stored)?;
        tracing::debug!(
            "Loaded {} boxes and {} globals from {}",
            state.boxes.len(),
            state.globals.len(),
            data_file.display()
        );
        Ok(state)
    }

    /// Persist the full state, replacing what was stored before.
    pub fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&StoredState::from(state))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let _guard = self.lock.write();
        // Write-then-rename so a crash mid-write never truncates the previous state
        let tmp_file = self.path.join(format!("{STATE_FILE}.tmp"));
        fs::write(&tmp_file, content)?;
        fs::rename(&tmp_file, self.path.join(STATE_FILE))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
