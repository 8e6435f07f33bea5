//! boxq VM - Metered host for application calls.
//!
//! This crate provides:
//! - Compute budget metering with op-up top-ups
//! - The all-or-nothing application call boundary

pub mod budget;
pub mod error;
pub mod runtime;

pub use budget::{Budget, BudgetMeter, BudgetSchedule, Opcode, Unmetered};
pub use error::VmError;
pub use runtime::{AppHost, CallContext, CallReceipt, ExecutionContext};
