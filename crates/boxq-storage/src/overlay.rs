//! Write-buffering overlay.
//!
//! An [`Overlay`] collects every box and global write of one application
//! call on top of a base store. Reads see the buffered writes. Nothing
//! reaches the base until [`Overlay::commit`]; dropping the overlay
//! discards the buffered writes, which is how an aborted call leaves no
//! trace behind.

use std::collections::BTreeMap;

use crate::box_store::{check_range, validate_create, ByteStore};
use crate::error::{display_key, StorageError};
use crate::global_state::{GlobalState, StateValue};

/// Buffered view over a base store.
pub struct Overlay<'a, B: ?Sized> {
    base: &'a mut B,
    /// Dirty boxes: full contents, `None` for a deleted box
    boxes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// Dirty globals: `None` for a deleted key
    globals: BTreeMap<Vec<u8>, Option<StateValue>>,
}

impl<'a, B> Overlay<'a, B>
where
    B: ByteStore + GlobalState + ?Sized,
{
    pub fn new(base: &'a mut B) -> Self {
        Self {
            base,
            boxes: BTreeMap::new(),
            globals: BTreeMap::new(),
        }
    }

    /// Whether any write has been buffered.
    pub fn is_dirty(&self) -> bool {
        !self.boxes.is_empty() || !self.globals.is_empty()
    }

    /// Number of boxes touched by buffered writes.
    pub fn dirty_boxes(&self) -> usize {
        self.boxes.len()
    }

    /// Apply every buffered write to the base store.
    pub fn commit(self) -> Result<(), StorageError> {
        let Overlay { base, boxes, globals } = self;

        for (name, entry) in boxes {
            match entry {
                Some(data) => {
                    match base.box_len(&name) {
                        Some(len) if len == data.len() => {}
                        Some(_) => {
                            base.delete_box(&name)?;
                            base.create_box(&name, data.len())?;
                        }
                        None => {
                            base.create_box(&name, data.len())?;
                        }
                    }
                    base.replace(&name, 0, &data)?;
                }
                None => {
                    base.delete_box(&name)?;
                }
            }
        }

        for (key, entry) in globals {
            match entry {
                Some(value) => base.put(&key, value)?,
                None => base.delete(&key)?,
            }
        }

        Ok(())
    }

    /// Copy a box into the dirty set so it can be modified in place.
    fn dirty_box(&mut self, name: &[u8]) -> Result<&mut Vec<u8>, StorageError> {
        if !self.boxes.contains_key(name) {
            let size = self
                .base
                .box_len(name)
                .ok_or_else(|| StorageError::BoxNotFound(display_key(name)))?;
            let data = self.base.extract(name, 0, size)?;
            self.boxes.insert(name.to_vec(), Some(data));
        }

        match self.boxes.get_mut(name) {
            Some(Some(data)) => Ok(data),
            _ => Err(StorageError::BoxNotFound(display_key(name))),
        }
    }
}

impl<'a, B> ByteStore for Overlay<'a, B>
where
    B: ByteStore + GlobalState + ?Sized,
{
    fn create_box(&mut self, name: &[u8], size: usize) -> Result<bool, StorageError> {
        let created = validate_create(self.box_len(name), name, size)?;
        if created {
            self.boxes.insert(name.to_vec(), Some(vec![0u8; size]));
        }
        Ok(created)
    }

    fn box_len(&self, name: &[u8]) -> Option<usize> {
        match self.boxes.get(name) {
            Some(Some(data)) => Some(data.len()),
            Some(None) => None,
            None => self.base.box_len(name),
        }
    }

    fn extract(&self, name: &[u8], offset: usize, len: usize) -> Result<Vec<u8>, StorageError> {
        match self.boxes.get(name) {
            Some(Some(data)) => {
                check_range(offset, len, data.len())?;
                Ok(data[offset..offset + len].to_vec())
            }
            Some(None) => Err(StorageError::BoxNotFound(display_key(name))),
            None => self.base.extract(name, offset, len),
        }
    }

    fn replace(&mut self, name: &[u8], offset: usize, bytes: &[u8]) -> Result<(), StorageError> {
        let data = self.dirty_box(name)?;
        check_range(offset, bytes.len(), data.len())?;
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn delete_box(&mut self, name: &[u8]) -> Result<bool, StorageError> {
        let existed = self.box_len(name).is_some();
        self.boxes.insert(name.to_vec(), None);
        Ok(existed)
    }
}

impl<'a, B> GlobalState for Overlay<'a, B>
where
    B: ByteStore + GlobalState + ?Sized,
{
    fn get(&self, key: &[u8]) -> Option<StateValue> {
        match self.globals.get(key) {
            Some(entry) => entry.clone(),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: StateValue) -> Result<(), StorageError> {
        self.globals.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        self.globals.insert(key.to_vec(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use proptest::prelude::*;

    fn base_with_box() -> AppState {
        let mut state = AppState::new();
        state.create_box(b"q", 8).unwrap();
        state.replace(b"q", 0, &[1, 2, 3, 4]).unwrap();
        state.put_uint(b"q", 4).unwrap();
        state
    }

    #[test]
    fn test_reads_fall_through() {
        let mut base = base_with_box();
        let overlay = Overlay::new(&mut base);
        assert!(!overlay.is_dirty());
        assert_eq!(overlay.extract(b"q", 0, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(overlay.get_uint(b"q").unwrap(), 4);
    }

    #[test]
    fn test_writes_are_buffered() {
        let mut base = base_with_box();
        {
            let mut overlay = Overlay::new(&mut base);
            overlay.replace(b"q", 0, &[9]).unwrap();
            overlay.put_uint(b"q", 5).unwrap();
            assert!(overlay.is_dirty());
            assert_eq!(overlay.extract(b"q", 0, 2).unwrap(), vec![9, 2]);
            assert_eq!(overlay.get_uint(b"q").unwrap(), 5);
            // dropped without commit
        }
        assert_eq!(base.extract(b"q", 0, 2).unwrap(), vec![1, 2]);
        assert_eq!(base.get_uint(b"q").unwrap(), 4);
    }

    #[test]
    fn test_commit_applies_writes() {
        let mut base = base_with_box();
        let mut overlay = Overlay::new(&mut base);
        overlay.replace(b"q", 6, &[7, 7]).unwrap();
        overlay.create_box(b"fresh", 4).unwrap();
        overlay.replace(b"fresh", 0, &[5]).unwrap();
        overlay.put_uint(b"q", 6).unwrap();
        overlay.delete(b"missing").unwrap();
        assert_eq!(overlay.dirty_boxes(), 2);
        overlay.commit().unwrap();

        assert_eq!(base.extract(b"q", 0, 8).unwrap(), vec![1, 2, 3, 4, 0, 0, 7, 7]);
        assert_eq!(base.extract(b"fresh", 0, 4).unwrap(), vec![5, 0, 0, 0]);
        assert_eq!(base.get_uint(b"q").unwrap(), 6);
    }

    #[test]
    fn test_delete_then_recreate() {
        let mut base = base_with_box();
        let mut overlay = Overlay::new(&mut base);
        assert!(overlay.delete_box(b"q").unwrap());
        assert_eq!(overlay.box_len(b"q"), None);
        assert!(overlay.extract(b"q", 0, 1).is_err());

        assert!(overlay.create_box(b"q", 16).unwrap());
        overlay.commit().unwrap();
        assert_eq!(base.box_len(b"q"), Some(16));
        assert_eq!(base.extract(b"q", 0, 4).unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_out_of_bounds_write_rejected() {
        let mut base = base_with_box();
        let mut overlay = Overlay::new(&mut base);
        assert!(matches!(
            overlay.replace(b"q", 7, &[1, 1]),
            Err(StorageError::OutOfBounds { .. })
        ));
        assert!(overlay.replace(b"nope", 0, &[1]).is_err());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Create(u8, usize),
        Replace(u8, usize, Vec<u8>),
        Delete(u8),
        PutUint(u8, u64),
        DeleteGlobal(u8),
    }

    fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
        let name = 0u8..4;
        let op = prop_oneof![
            20 => (name.clone(), 0usize..24).prop_map(|(n, s)| Op::Create(n, s)),
            40 => (name.clone(), 0usize..24, prop::collection::vec(any::<u8>(), 0..8))
                .prop_map(|(n, o, b)| Op::Replace(n, o, b)),
            10 => name.clone().prop_map(Op::Delete),
            20 => (name.clone(), any::<u64>()).prop_map(|(n, v)| Op::PutUint(n, v)),
            10 => name.prop_map(Op::DeleteGlobal),
        ];
        prop::collection::vec(op, 0..64)
    }

    fn apply<S>(store: &mut S, op: &Op) -> Result<(), StorageError>
    where
        S: ByteStore + GlobalState + ?Sized,
    {
        match op {
            Op::Create(n, size) => store.create_box(&[*n], *size).map(|_| ()),
            Op::Replace(n, offset, bytes) => store.replace(&[*n], *offset, bytes),
            Op::Delete(n) => store.delete_box(&[*n]).map(|_| ()),
            Op::PutUint(n, v) => store.put_uint(&[*n], *v),
            Op::DeleteGlobal(n) => store.delete(&[*n]),
        }
    }

    proptest! {
        #[test]
        fn prop_overlay_matches_direct_writes(setup in ops_strategy(), ops in ops_strategy()) {
            let mut base = AppState::new();
            for op in &setup {
                let _ = apply(&mut base, op);
            }
            let mut direct = base.clone();
            let untouched = base.clone();

            let mut overlay = Overlay::new(&mut base);
            for op in &ops {
                prop_assert_eq!(apply(&mut overlay, op), apply(&mut direct, op));
                for n in 0..4u8 {
                    prop_assert_eq!(overlay.box_len(&[n]), direct.box_len(&[n]));
                    prop_assert_eq!(overlay.get(&[n]), direct.get(&[n]));
                }
            }
            drop(overlay);
            prop_assert_eq!(&base, &untouched);

            let mut overlay = Overlay::new(&mut base);
            for op in &ops {
                let _ = apply(&mut overlay, op);
            }
            overlay.commit().unwrap();
            prop_assert_eq!(base, direct);
        }
    }
}
