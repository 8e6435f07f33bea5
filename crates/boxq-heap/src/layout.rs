//! Slot addressing.
//!
//! The box is an array of fixed-size slots; slot `i` occupies bytes
//! `[i * element_size, (i + 1) * element_size)`. Slot 0 is the root.

/// Parent of a non-root slot.
///
/// Split by parity so that no intermediate value goes negative.
/// Must not be called with the root.
#[inline]
pub fn parent(idx: u64) -> u64 {
    debug_assert!(idx != 0, "root has no parent");
    if idx % 2 == 0 {
        (idx - 2) / 2
    } else {
        (idx - 1) / 2
    }
}

#[inline]
pub fn left_child(idx: u64) -> u64 {
    idx * 2 + 1
}

#[inline]
pub fn right_child(idx: u64) -> u64 {
    idx * 2 + 2
}

/// Byte offset of a slot, `None` on overflow.
#[inline]
pub fn slot_offset(idx: u64, element_size: usize) -> Option<usize> {
    usize::try_from(idx).ok()?.checked_mul(element_size)
}

/// Number of whole slots in a box.
#[inline]
pub fn capacity(box_size: usize, element_size: usize) -> u64 {
    if element_size == 0 {
        return 0;
    }
    (box_size / element_size) as u64
}
