//! boxq Heap - Binary heap priority queue stored in a fixed-size box.
//!
//! This crate provides:
//! - [`PriorityQueue`], the shape of a heap, and [`HeapHandle`], its
//!   operations bound to application storage and a compute budget
//! - The sort-prefix comparator shared by min and max heaps
//! - [`Entry`], the `key || sequence || payload` element codec
//! - [`HeapConfig`], TOML queue configuration
//!
//! # Example
//!
//! ```
//! use boxq_heap::{Entry, PriorityQueue, SortOrder};
//! use boxq_storage::AppState;
//! use boxq_vm::Unmetered;
//!
//! let queue = PriorityQueue::with_element_size(b"jobs".to_vec(), 160, SortOrder::Ascending, 16)?;
//! let mut state = AppState::new();
//! let mut budget = Unmetered::new();
//! let mut heap = queue.bind(&mut state, &mut budget);
//! heap.initialize()?;
//!
//! heap.insert(&Entry::new(5, 0).encode(16)?)?;
//! heap.insert(&Entry::new(2, 1).encode(16)?)?;
//! assert_eq!(Entry::decode(&heap.pop()?)?.key, 2);
//! # Ok::<(), boxq_heap::HeapError>(())
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod heap;
pub mod layout;
pub mod order;

pub use config::{HeapConfig, DEFAULT_BUDGET_PER_LEVEL};
pub use element::Entry;
pub use error::HeapError;
pub use heap::{HeapHandle, PriorityQueue};
pub use order::{unsorted, SortKey, SortOrder, SORT_PREFIX_LEN};

#[cfg(test)]
mod proptests;
