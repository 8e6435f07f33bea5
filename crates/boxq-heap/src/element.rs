//! Element codec.
//!
//! A heap element is `key (8, BE) || sequence (8, BE) || payload`, padded
//! with zeros up to the queue's element size.

use crate::error::HeapError;
use crate::order::{SortKey, SORT_PREFIX_LEN};

/// A decoded heap element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: u64,
    pub sequence: u64,
    pub payload: Vec<u8>,
}

impl Entry {
    pub fn new(key: u64, sequence: u64) -> Self {
        Self {
            key,
            sequence,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::new(self.key, self.sequence)
    }

    /// Encode into exactly `element_size` bytes.
    pub fn encode(&self, element_size: usize) -> Result<Vec<u8>, HeapError> {
        let needed = SORT_PREFIX_LEN + self.payload.len();
        if element_size < SORT_PREFIX_LEN || needed > element_size {
            return Err(HeapError::InvalidElementSize {
                expected: element_size,
                got: needed,
            });
        }

        let mut out = Vec::with_capacity(element_size);
        out.extend_from_slice(&self.sort_key().to_bytes());
        out.extend_from_slice(&self.payload);
        out.resize(element_size, 0);
        Ok(out)
    }

    /// Decode an element. Everything after the sort prefix is payload,
    /// including any zero padding.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeapError> {
        let sort_key = SortKey::from_element(bytes).ok_or(HeapError::InvalidElementSize {
            expected: SORT_PREFIX_LEN,
            got: bytes.len(),
        })?;
        Ok(Self {
            key: sort_key.key,
            sequence: sort_key.sequence,
            payload: bytes[SORT_PREFIX_LEN..].to_vec(),
        })
    }
}
