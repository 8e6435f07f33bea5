//! Box storage.
//!
//! A box is a named, fixed-size, zero-initialised byte region. Boxes are
//! created once with their final size and afterwards only read and written
//! in place at byte offsets.

use crate::error::{display_key, StorageError};

/// Largest box a single application may create.
pub const MAX_BOX_SIZE: usize = 32 * 1024;

/// Byte-addressable box storage.
pub trait ByteStore {
    /// Create a zero-filled box.
    ///
    /// Returns `Ok(false)` when a box with the same name and size already
    /// exists, leaving its contents untouched.
    fn create_box(&mut self, name: &[u8], size: usize) -> Result<bool, StorageError>;

    /// Size of the box, if it exists.
    fn box_len(&self, name: &[u8]) -> Option<usize>;

    /// Read `len` bytes starting at `offset`.
    fn extract(&self, name: &[u8], offset: usize, len: usize) -> Result<Vec<u8>, StorageError>;

    /// Overwrite bytes starting at `offset`. The box never grows.
    fn replace(&mut self, name: &[u8], offset: usize, bytes: &[u8]) -> Result<(), StorageError>;

    /// Delete a box. Returns whether it existed.
    fn delete_box(&mut self, name: &[u8]) -> Result<bool, StorageError>;
}

/// Validate a requested box size against [`MAX_BOX_SIZE`].
pub fn check_box_size(size: usize) -> Result<(), StorageError> {
    if size > MAX_BOX_SIZE {
        return Err(StorageError::BoxTooLarge { size, limit: MAX_BOX_SIZE });
    }
    Ok(())
}

/// Validate `[offset, offset + len)` against a box of `size` bytes.
pub fn check_range(offset: usize, len: usize, size: usize) -> Result<(), StorageError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StorageError::OutOfBounds { offset, len, size }),
    }
}

/// Shared `create_box` semantics: `Ok(true)` when the box must be created,
/// `Ok(false)` when an identical box already exists.
pub(crate) fn validate_create(
    existing_len: Option<usize>,
    name: &[u8],
    size: usize,
) -> Result<bool, StorageError> {
    check_box_size(size)?;
    match existing_len {
        Some(len) if len == size => Ok(false),
        Some(len) => Err(StorageError::BoxSizeMismatch {
            name: display_key(name),
            existing: len,
            requested: size,
        }),
        None => Ok(true),
    }
}
