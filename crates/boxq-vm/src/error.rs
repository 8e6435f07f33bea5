use boxq_storage::StorageError;
use thiserror::Error;

/// Errors that abort an application call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    #[error("Out of budget: used {used}, limit {limit}")]
    OutOfBudget { used: u64, limit: u64 },

    #[error("Budget exhausted: requested {requested}, remaining {remaining}, op-ups {inner_calls}")]
    BudgetExhausted {
        requested: u64,
        remaining: u64,
        inner_calls: u32,
    },

    #[error("Call targets app {got}, host runs app {expected}")]
    WrongApp { expected: u64, got: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
