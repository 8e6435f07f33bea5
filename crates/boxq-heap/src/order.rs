//! Element ordering.
//!
//! Only the first 16 bytes of an element take part in ordering: an 8-byte
//! big-endian key followed by an 8-byte big-endian sequence number.
//! - Ascending: smallest key first, ties broken by smallest sequence
//! - Descending: largest key first, ties still broken by smallest sequence
//!
//! Either way, among equal keys the element inserted first wins.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Bytes of an element that take part in ordering.
pub const SORT_PREFIX_LEN: usize = 16;

const KEY_LEN: usize = 8;

/// Direction of the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Min-heap
    #[default]
    Ascending,
    /// Max-heap
    Descending,
}

impl SortOrder {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Ascending)
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// Returns true when `a` must move above `b`, i.e. `a` and `b` are out of
/// order if `a` sits below `b`.
///
/// An empty operand or one shorter than the sort prefix never compares as
/// unsorted.
pub fn unsorted(a: &[u8], b: &[u8], order: SortOrder) -> bool {
    let (Some(a), Some(b)) = (a.get(..SORT_PREFIX_LEN), b.get(..SORT_PREFIX_LEN)) else {
        return false;
    };

    match order {
        SortOrder::Ascending => a < b,
        SortOrder::Descending => {
            // Invert the sequence bytes so the older element still compares greater
            let a = inverted_sequence(a);
            let b = inverted_sequence(b);
            a > b
        }
    }
}

fn inverted_sequence(prefix: &[u8]) -> [u8; SORT_PREFIX_LEN] {
    let mut out = [0u8; SORT_PREFIX_LEN];
    out.copy_from_slice(prefix);
    for byte in &mut out[KEY_LEN..] {
        *byte = !*byte;
    }
    out
}

/// Decoded sort prefix of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub key: u64,
    pub sequence: u64,
}

impl SortKey {
    pub fn new(key: u64, sequence: u64) -> Self {
        Self { key, sequence }
    }

    /// Read the sort prefix of an element.
    pub fn from_element(element: &[u8]) -> Option<Self> {
        let key = element.get(..KEY_LEN)?;
        let sequence = element.get(KEY_LEN..SORT_PREFIX_LEN)?;
        Some(Self {
            key: u64::from_be_bytes(key.try_into().ok()?),
            sequence: u64::from_be_bytes(sequence.try_into().ok()?),
        })
    }

    /// Priority comparison: `Less` means `self` comes out of the heap first.
    pub fn priority_cmp(&self, other: &Self, order: SortOrder) -> Ordering {
        let by_key = match order {
            SortOrder::Ascending => self.key.cmp(&other.key),
            SortOrder::Descending => other.key.cmp(&self.key),
        };
        by_key.then(self.sequence.cmp(&other.sequence))
    }

    /// Numeric form of [`unsorted`].
    pub fn unsorted(&self, other: &Self, order: SortOrder) -> bool {
        self.priority_cmp(other, order) == Ordering::Less
    }

    pub fn to_bytes(&self) -> [u8; SORT_PREFIX_LEN] {
        let mut out = [0u8; SORT_PREFIX_LEN];
        out[..KEY_LEN].copy_from_slice(&self.key.to_be_bytes());
        out[KEY_LEN..].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }
}
