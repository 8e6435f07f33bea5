//! Application global state: a small key-value map of uint or bytes values.

use crate::error::{display_key, StorageError};
use serde::{Deserialize, Serialize};

/// A global state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StateValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

/// Key-value application state.
pub trait GlobalState {
    fn get(&self, key: &[u8]) -> Option<StateValue>;

    fn put(&mut self, key: &[u8], value: StateValue) -> Result<(), StorageError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;

    /// Read a uint global. A missing key reads as zero.
    fn get_uint(&self, key: &[u8]) -> Result<u64, StorageError> {
        match self.get(key) {
            None => Ok(0),
            Some(StateValue::Uint(v)) => Ok(v),
            Some(StateValue::Bytes(_)) => Err(StorageError::TypeMismatch { key: display_key(key) }),
        }
    }

    fn put_uint(&mut self, key: &[u8], value: u64) -> Result<(), StorageError> {
        self.put(key, StateValue::Uint(value))
    }
}
