//! Compute budget metering.
//!
//! Every application call starts with `app_call_budget` units. Code that
//! knows it is about to do a bounded but expensive step calls
//! [`Budget::ensure_budget`], which tops the budget up by issuing op-up
//! inner calls, each granting `opup_grant` units for `opup_cost` units,
//! until either enough budget remains or `max_inner_calls` is reached.

use serde::{Deserialize, Serialize};

use crate::error::VmError;

/// Metered primitive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    BoxRead,
    BoxWrite,
    Compare,
    GlobalRead,
    GlobalWrite,
}

/// Budget schedule for metered operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSchedule {
    // Box access
    pub box_read: u64,        // 2
    pub box_write: u64,       // 2

    // Byte-string comparison
    pub compare: u64,         // 4

    // Global state
    pub global_read: u64,     // 1
    pub global_write: u64,    // 1

    // Allowance
    pub app_call_budget: u64, // 700
    pub opup_grant: u64,      // 700
    pub opup_cost: u64,       // 10
    pub max_inner_calls: u32, // 256
}

impl Default for BudgetSchedule {
    fn default() -> Self {
        Self {
            box_read: 2,
            box_write: 2,
            compare: 4,
            global_read: 1,
            global_write: 1,
            app_call_budget: 700,
            opup_grant: 700,
            opup_cost: 10,
            max_inner_calls: 256,
        }
    }
}

impl BudgetSchedule {
    /// Cost of a single primitive.
    pub fn cost(&self, op: Opcode) -> u64 {
        match op {
            Opcode::BoxRead => self.box_read,
            Opcode::BoxWrite => self.box_write,
            Opcode::Compare => self.compare,
            Opcode::GlobalRead => self.global_read,
            Opcode::GlobalWrite => self.global_write,
        }
    }

    /// Largest budget a single call can ever reach.
    pub fn ceiling(&self) -> u64 {
        self.app_call_budget
            .saturating_add(self.opup_grant.saturating_mul(self.max_inner_calls as u64))
    }
}

/// Budget consumed by application code.
pub trait Budget {
    /// Consume `units`, failing if they are not available.
    fn charge(&mut self, units: u64) -> Result<(), VmError>;

    /// Consume the cost of one primitive.
    fn charge_op(&mut self, op: Opcode) -> Result<(), VmError>;

    /// Make sure at least `units` remain, acquiring more budget if needed.
    fn ensure_budget(&mut self, units: u64) -> Result<(), VmError>;

    fn remaining(&self) -> u64;
}

/// Budget tracking during a metered call.
#[derive(Debug, Clone)]
pub struct BudgetMeter {
    /// Current allowance, grows with every op-up call
    limit: u64,
    /// Units already consumed
    used: u64,
    /// Op-up inner calls issued so far
    inner_calls: u32,
    schedule: BudgetSchedule,
}

impl BudgetMeter {
    pub fn new(schedule: BudgetSchedule) -> Self {
        Self {
            limit: schedule.app_call_budget,
            used: 0,
            inner_calls: 0,
            schedule,
        }
    }

    pub fn with_default_schedule() -> Self {
        Self::new(BudgetSchedule::default())
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn inner_calls(&self) -> u32 {
        self.inner_calls
    }

    pub fn schedule(&self) -> &BudgetSchedule {
        &self.schedule
    }

    fn op_up(&mut self, requested: u64) -> Result<(), VmError> {
        if self.inner_calls >= self.schedule.max_inner_calls {
            return Err(VmError::BudgetExhausted {
                requested,
                remaining: self.remaining(),
                inner_calls: self.inner_calls,
            });
        }
        self.charge(self.schedule.opup_cost)?;
        self.limit = self.limit.saturating_add(self.schedule.opup_grant);
        self.inner_calls += 1;
        tracing::trace!(
            "op-up #{}: limit {} used {}",
            self.inner_calls,
            self.limit,
            self.used
        );
        Ok(())
    }
}

impl Budget for BudgetMeter {
    fn charge(&mut self, units: u64) -> Result<(), VmError> {
        let new_used = self.used.checked_add(units).ok_or(VmError::OutOfBudget {
            used: u64::MAX,
            limit: self.limit,
        })?;

        if new_used > self.limit {
            Err(VmError::OutOfBudget {
                used: new_used,
                limit: self.limit,
            })
        } else {
            self.used = new_used;
            Ok(())
        }
    }

    fn charge_op(&mut self, op: Opcode) -> Result<(), VmError> {
        self.charge(self.schedule.cost(op))
    }

    fn ensure_budget(&mut self, units: u64) -> Result<(), VmError> {
        while self.remaining() < units {
            self.op_up(units)?;
        }
        Ok(())
    }

    fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Budget for unmetered execution: counts usage, never fails.
#[derive(Debug, Clone, Default)]
pub struct Unmetered {
    used: u64,
}

impl Unmetered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

impl Budget for Unmetered {
    fn charge(&mut self, units: u64) -> Result<(), VmError> {
        self.used = self.used.saturating_add(units);
        Ok(())
    }

    fn charge_op(&mut self, _op: Opcode) -> Result<(), VmError> {
        self.charge(1)
    }

    fn ensure_budget(&mut self, _units: u64) -> Result<(), VmError> {
        Ok(())
    }

    fn remaining(&self) -> u64 {
        u64::MAX
    }
}
