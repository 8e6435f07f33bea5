//! In-memory application state.

use std::collections::BTreeMap;

use crate::box_store::{check_range, validate_create, ByteStore};
use crate::error::{display_key, StorageError};
use crate::global_state::{GlobalState, StateValue};

/// Boxes and globals of a single application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub(crate) boxes: BTreeMap<Vec<u8>, Vec<u8>>,
    pub(crate) globals: BTreeMap<Vec<u8>, StateValue>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all boxes, in byte order.
    pub fn box_names(&self) -> impl Iterator<Item = &[u8]> {
        self.boxes.keys().map(Vec::as_slice)
    }

    /// Full contents of a box.
    pub fn box_contents(&self, name: &[u8]) -> Option<&[u8]> {
        self.boxes.get(name).map(Vec::as_slice)
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }
}

impl ByteStore for AppState {
    fn create_box(&mut self, name: &[u8], size: usize) -> Result<bool, StorageError> {
        let created = validate_create(self.box_len(name), name, size)?;
        if created {
            self.boxes.insert(name.to_vec(), vec![0u8; size]);
        }
        Ok(created)
    }

    fn box_len(&self, name: &[u8]) -> Option<usize> {
        self.boxes.get(name).map(Vec::len)
    }

    fn extract(&self, name: &[u8], offset: usize, len: usize) -> Result<Vec<u8>, StorageError> {
        let data = self
            .boxes
            .get(name)
            .ok_or_else(|| StorageError::BoxNotFound(display_key(name)))?;
        check_range(offset, len, data.len())?;
        Ok(data[offset..offset + len].to_vec())
    }

    fn replace(&mut self, name: &[u8], offset: usize, bytes: &[u8]) -> Result<(), StorageError> {
        let data = self
            .boxes
            .get_mut(name)
            .ok_or_else(|| StorageError::BoxNotFound(display_key(name)))?;
        check_range(offset, bytes.len(), data.len())?;
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn delete_box(&mut self, name: &[u8]) -> Result<bool, StorageError> {
        Ok(self.boxes.remove(name).is_some())
    }
}

impl GlobalState for AppState {
    fn get(&self, key: &[u8]) -> Option<StateValue> {
        self.globals.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: StateValue) -> Result<(), StorageError> {
        self.globals.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.globals.remove(key);
        Ok(())
    }
}
