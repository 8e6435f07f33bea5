use thiserror::Error;

/// Errors that can occur in storage operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Box not found: {0}")]
    BoxNotFound(String),

    #[error("Box {name} already exists with size {existing}, requested {requested}")]
    BoxSizeMismatch {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error("Box too large: {size} > {limit}")]
    BoxTooLarge { size: usize, limit: usize },

    #[error("Box access out of bounds: offset {offset} + len {len} > size {size}")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    #[error("Global {key} holds bytes, expected uint")]
    TypeMismatch { key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<hex::FromHexError> for StorageError {
    fn from(e: hex::FromHexError) -> Self {
        StorageError::Deserialization(e.to_string())
    }
}

/// Render a box or global key for error messages.
pub(crate) fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_graphic()) => s.to_string(),
        _ => format!("0x{}", hex::encode(key)),
    }
}
