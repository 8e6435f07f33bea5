//! Application call host.
//!
//! [`AppHost`] owns the persistent state of one application and runs calls
//! against it one at a time. A call either returns `Ok` and all of its box
//! and global writes are committed, or returns `Err` and none of them are.
//! Calls take `&mut self`, so a call cannot start while another one is
//! still running.

use boxq_storage::{ByteStore, GlobalState, Overlay};
use boxq_types::Address;

use crate::budget::{BudgetMeter, BudgetSchedule};
use crate::error::VmError;

/// Execution context for an application call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Application being called
    pub app_id: u64,
    /// Account that sent the call
    pub sender: Address,
    /// Budget schedule for this call
    pub schedule: BudgetSchedule,
    /// Whether this is a static call (no state changes)
    pub is_static: bool,
}

impl ExecutionContext {
    pub fn new(app_id: u64, sender: Address) -> Self {
        Self {
            app_id,
            sender,
            schedule: BudgetSchedule::default(),
            is_static: false,
        }
    }

    /// Set budget schedule.
    pub fn with_schedule(mut self, schedule: BudgetSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set as static call.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// State and budget available to application code during a call.
pub struct CallContext<'a, B: ?Sized> {
    /// Buffered view of the application's boxes and globals
    pub storage: Overlay<'a, B>,
    /// Compute budget of this call
    pub budget: BudgetMeter,
    pub exec: ExecutionContext,
}

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallReceipt<T> {
    /// Value returned by the application code
    pub value: T,
    /// Budget units consumed
    pub budget_used: u64,
    /// Op-up inner calls issued
    pub inner_calls: u32,
    /// Whether state writes were committed
    pub committed: bool,
}

/// Runs application calls against owned state.
pub struct AppHost<B> {
    app_id: u64,
    state: B,
    calls: u64,
}

impl<B> AppHost<B>
where
    B: ByteStore + GlobalState,
{
    pub fn new(app_id: u64, state: B) -> Self {
        Self { app_id, state, calls: 0 }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Committed state.
    pub fn state(&self) -> &B {
        &self.state
    }

    pub fn into_state(self) -> B {
        self.state
    }

    /// Number of calls that committed.
    pub fn committed_calls(&self) -> u64 {
        self.calls
    }

    /// Run `f` as one all-or-nothing call.
    pub fn call<T, E, F>(&mut self, ctx: &ExecutionContext, f: F) -> Result<CallReceipt<T>, E>
    where
        F: FnOnce(&mut CallContext<'_, B>) -> Result<T, E>,
        E: From<VmError> + std::fmt::Display,
    {
        if ctx.app_id != self.app_id {
            return Err(VmError::WrongApp {
                expected: self.app_id,
                got: ctx.app_id,
            }
            .into());
        }

        let mut call = CallContext {
            storage: Overlay::new(&mut self.state),
            budget: BudgetMeter::new(ctx.schedule),
            exec: ctx.clone(),
        };

        let value = match f(&mut call) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    "App {} call from {:x} reverted after {} budget units: {}",
                    ctx.app_id,
                    ctx.sender,
                    call.budget.used(),
                    e
                );
                return Err(e);
            }
        };

        let CallContext { storage, budget, .. } = call;
        let committed = !ctx.is_static;
        if committed {
            let dirty = storage.dirty_boxes();
            storage.commit().map_err(VmError::from)?;
            self.calls += 1;
            tracing::debug!(
                "App {} call committed: {} boxes touched, {} budget units, {} op-ups",
                ctx.app_id,
                dirty,
                budget.used(),
                budget.inner_calls()
            );
        }

        Ok(CallReceipt {
            value,
            budget_used: budget.used(),
            inner_calls: budget.inner_calls(),
            committed,
        })
    }
}
