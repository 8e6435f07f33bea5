use boxq_storage::StorageError;
use boxq_types::TypesError;
use boxq_vm::VmError;
use thiserror::Error;

/// Errors that can occur in heap operations.
///
/// Every error aborts the enclosing application call; the heap never
/// exposes a partially applied operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HeapError {
    #[error("Heap is empty")]
    EmptyHeap,

    #[error("Element not found")]
    ElementNotFound,

    #[error("Heap is full: capacity {capacity}")]
    CapacityExceeded { capacity: u64 },

    #[error("Invalid element size: expected {expected}, got {got}")]
    InvalidElementSize { expected: usize, got: usize },

    #[error("Index {index} out of range (bound {bound})")]
    IndexOutOfRange { index: u64, bound: u64 },

    #[error("Heap order violated at slot {slot}")]
    InvariantViolated { slot: u64 },

    #[error("Slot {slot} is past the count but not zeroed")]
    StaleSlot { slot: u64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Type error: {0}")]
    Types(#[from] TypesError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("VM error: {0}")]
    Vm(#[from] VmError),
}
