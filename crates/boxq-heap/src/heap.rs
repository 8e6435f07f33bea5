//! Binary heap stored in a box.
//!
//! A [`PriorityQueue`] is a description of a heap: box name, box size,
//! element size and direction. It owns no state. Binding it to a storage
//! view and a budget yields a [`HeapHandle`], which performs the actual
//! operations. The element count lives in a uint global keyed by the box
//! name; slots at or past the count are kept zeroed.
//!
//! Every sift level and every scanned slot first asks the budget for
//! `budget_per_level` units so that a long walk tops up with op-up calls
//! instead of running dry halfway through.

use boxq_storage::AppStorage;
use boxq_types::TypeSpec;
use boxq_vm::{Budget, Opcode};

use crate::config::{validate_layout, HeapConfig, DEFAULT_BUDGET_PER_LEVEL};
use crate::error::HeapError;
use crate::layout::{self, left_child, parent, right_child};
use crate::order::{unsorted, SortOrder};

/// Shape of a box-backed binary heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityQueue {
    name: Vec<u8>,
    box_size: usize,
    element_size: usize,
    order: SortOrder,
    budget_per_level: u64,
}

impl PriorityQueue {
    /// Queue whose elements are encoded as `element`.
    pub fn new(
        name: impl Into<Vec<u8>>,
        box_size: usize,
        order: SortOrder,
        element: &TypeSpec,
    ) -> Result<Self, HeapError> {
        Self::with_element_size(name, box_size, order, element.byte_len()?)
    }

    pub fn with_element_size(
        name: impl Into<Vec<u8>>,
        box_size: usize,
        order: SortOrder,
        element_size: usize,
    ) -> Result<Self, HeapError> {
        let name = name.into();
        if name.is_empty() {
            return Err(HeapError::InvalidConfig("box name is empty".to_string()));
        }
        validate_layout(box_size, element_size)?;
        Ok(Self {
            name,
            box_size,
            element_size,
            order,
            budget_per_level: DEFAULT_BUDGET_PER_LEVEL,
        })
    }

    pub fn from_config(config: &HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        let queue = Self::new(
            config.name.as_bytes(),
            config.box_size,
            config.order,
            &config.element,
        )?;
        Ok(queue.with_budget_per_level(config.budget_per_level))
    }

    pub fn with_budget_per_level(mut self, units: u64) -> Self {
        self.budget_per_level = units;
        self
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn box_size(&self) -> usize {
        self.box_size
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn budget_per_level(&self) -> u64 {
        self.budget_per_level
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> u64 {
        layout::capacity(self.box_size, self.element_size)
    }

    /// Global key holding the element count.
    pub fn counter_key(&self) -> &[u8] {
        &self.name
    }

    /// Attach the queue to storage and a budget.
    pub fn bind<'a>(
        &'a self,
        storage: &'a mut dyn AppStorage,
        budget: &'a mut dyn Budget,
    ) -> HeapHandle<'a> {
        HeapHandle {
            queue: self,
            storage,
            budget,
        }
    }
}

/// A [`PriorityQueue`] bound to storage and a budget.
pub struct HeapHandle<'a> {
    queue: &'a PriorityQueue,
    storage: &'a mut dyn AppStorage,
    budget: &'a mut dyn Budget,
}

impl<'a> HeapHandle<'a> {
    pub fn queue(&self) -> &PriorityQueue {
        self.queue
    }

    /// Create the backing box, zero-filled. Returns false if it already
    /// existed with the same size.
    pub fn initialize(&mut self) -> Result<bool, HeapError> {
        let created = self
            .storage
            .create_box(&self.queue.name, self.queue.box_size)?;
        if created {
            tracing::debug!(
                "Created heap box {} ({} slots of {} bytes)",
                String::from_utf8_lossy(&self.queue.name),
                self.queue.capacity(),
                self.queue.element_size
            );
        }
        Ok(created)
    }

    /// Number of live elements.
    pub fn count(&mut self) -> Result<u64, HeapError> {
        self.read_count()
    }

    pub fn capacity(&self) -> u64 {
        self.queue.capacity()
    }

    pub fn is_empty(&mut self) -> Result<bool, HeapError> {
        Ok(self.read_count()? == 0)
    }

    /// Add an element.
    pub fn insert(&mut self, element: &[u8]) -> Result<(), HeapError> {
        self.check_element(element)?;

        let count = self.read_count()?;
        let capacity = self.queue.capacity();
        if count >= capacity {
            return Err(HeapError::CapacityExceeded { capacity });
        }

        self.write_slot(count, element)?;
        let slot = self.restore_up(count)?;
        self.write_count(count + 1)?;

        tracing::debug!("Inserted into slot {} (count {})", slot, count + 1);
        Ok(())
    }

    /// Remove and return the top element.
    pub fn pop(&mut self) -> Result<Vec<u8>, HeapError> {
        let count = self.read_count()?;
        if count == 0 {
            return Err(HeapError::EmptyHeap);
        }

        let top = self.read_slot(0)?;
        let last = count - 1;
        self.write_count(last)?;
        self.swap(0, last)?;
        self.restore_down(0, last)?;
        self.zero_slot(last)?;

        tracing::debug!("Popped top (count {})", last);
        Ok(top)
    }

    /// Top element without removing it.
    pub fn peek(&mut self) -> Result<Vec<u8>, HeapError> {
        if self.read_count()? == 0 {
            return Err(HeapError::EmptyHeap);
        }
        self.read_slot(0)
    }

    /// Raw slot contents. Slots at or past the count read as zeros.
    pub fn get(&mut self, idx: u64) -> Result<Vec<u8>, HeapError> {
        let capacity = self.queue.capacity();
        if idx >= capacity {
            return Err(HeapError::IndexOutOfRange {
                index: idx,
                bound: capacity,
            });
        }
        self.read_slot(idx)
    }

    /// Slot of the first live element equal to `element`, scanning from
    /// the root.
    pub fn search(&mut self, element: &[u8]) -> Result<Option<u64>, HeapError> {
        let count = self.read_count()?;
        for idx in 0..count {
            self.budget.ensure_budget(self.queue.budget_per_level)?;
            let slot = self.read_slot(idx)?;
            self.budget.charge_op(Opcode::Compare)?;
            if slot == element {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }

    /// Remove the first live element equal to `element`.
    pub fn remove(&mut self, element: &[u8]) -> Result<(), HeapError> {
        let idx = self.search(element)?.ok_or(HeapError::ElementNotFound)?;
        self.remove_at(idx)?;
        Ok(())
    }

    /// Remove the element in slot `idx` and return it.
    pub fn remove_at(&mut self, idx: u64) -> Result<Vec<u8>, HeapError> {
        let count = self.read_count()?;
        if idx >= count {
            return Err(HeapError::IndexOutOfRange {
                index: idx,
                bound: count,
            });
        }

        let removed = self.read_slot(idx)?;
        let last = count - 1;
        self.write_count(last)?;
        self.swap(idx, last)?;
        if idx < last {
            // The moved element may belong above or below its new slot
            let slot = self.restore_down(idx, last)?;
            if slot == idx {
                self.restore_up(idx)?;
            }
        }
        self.zero_slot(last)?;

        tracing::debug!("Removed slot {} (count {})", idx, last);
        Ok(removed)
    }

    /// Overwrite the element in slot `idx` and restore heap order.
    pub fn update(&mut self, idx: u64, element: &[u8]) -> Result<(), HeapError> {
        self.check_element(element)?;

        let count = self.read_count()?;
        if idx >= count {
            return Err(HeapError::IndexOutOfRange {
                index: idx,
                bound: count,
            });
        }

        self.write_slot(idx, element)?;
        let slot = self.restore_up(idx)?;
        if slot == idx {
            self.restore_down(idx, count)?;
        }
        Ok(())
    }

    /// Live elements in slot order.
    pub fn elements(&mut self) -> Result<Vec<Vec<u8>>, HeapError> {
        let count = self.read_count()?;
        let mut out = Vec::with_capacity(count as usize);
        for idx in 0..count {
            self.budget.ensure_budget(self.queue.budget_per_level)?;
            out.push(self.read_slot(idx)?);
        }
        Ok(out)
    }

    /// Check heap order over live slots and that every slot past the count
    /// is zeroed.
    pub fn verify(&mut self) -> Result<(), HeapError> {
        let count = self.read_count()?;
        for idx in 1..count {
            self.budget.ensure_budget(self.queue.budget_per_level)?;
            if self.unsorted_at(idx, parent(idx))? {
                return Err(HeapError::InvariantViolated { slot: idx });
            }
        }
        for idx in count..self.queue.capacity() {
            self.budget.ensure_budget(self.queue.budget_per_level)?;
            if self.read_slot(idx)?.iter().any(|b| *b != 0) {
                return Err(HeapError::StaleSlot { slot: idx });
            }
        }
        Ok(())
    }

    fn check_element(&self, element: &[u8]) -> Result<(), HeapError> {
        if element.len() != self.queue.element_size {
            return Err(HeapError::InvalidElementSize {
                expected: self.queue.element_size,
                got: element.len(),
            });
        }
        Ok(())
    }

    fn read_count(&mut self) -> Result<u64, HeapError> {
        self.budget.charge_op(Opcode::GlobalRead)?;
        Ok(self.storage.get_uint(self.queue.counter_key())?)
    }

    fn write_count(&mut self, count: u64) -> Result<(), HeapError> {
        self.budget.charge_op(Opcode::GlobalWrite)?;
        self.storage.put_uint(self.queue.counter_key(), count)?;
        Ok(())
    }

    fn offset(&self, idx: u64) -> Result<usize, HeapError> {
        layout::slot_offset(idx, self.queue.element_size).ok_or(HeapError::IndexOutOfRange {
            index: idx,
            bound: self.queue.capacity(),
        })
    }

    fn read_slot(&mut self, idx: u64) -> Result<Vec<u8>, HeapError> {
        let offset = self.offset(idx)?;
        self.budget.charge_op(Opcode::BoxRead)?;
        Ok(self
            .storage
            .extract(&self.queue.name, offset, self.queue.element_size)?)
    }

    fn write_slot(&mut self, idx: u64, element: &[u8]) -> Result<(), HeapError> {
        let offset = self.offset(idx)?;
        self.budget.charge_op(Opcode::BoxWrite)?;
        self.storage.replace(&self.queue.name, offset, element)?;
        Ok(())
    }

    fn zero_slot(&mut self, idx: u64) -> Result<(), HeapError> {
        let zeros = vec![0u8; self.queue.element_size];
        self.write_slot(idx, &zeros)
    }

    fn swap(&mut self, i: u64, j: u64) -> Result<(), HeapError> {
        if i == j {
            return Ok(());
        }
        let a = self.read_slot(i)?;
        let b = self.read_slot(j)?;
        self.write_slot(i, &b)?;
        self.write_slot(j, &a)
    }

    /// Whether the element in slot `a` belongs above the one in slot `b`.
    fn unsorted_at(&mut self, a: u64, b: u64) -> Result<bool, HeapError> {
        let a = self.read_slot(a)?;
        let b = self.read_slot(b)?;
        self.budget.charge_op(Opcode::Compare)?;
        Ok(unsorted(&a, &b, self.queue.order))
    }

    /// Sift the element at `idx` toward the root. Returns its final slot.
    fn restore_up(&mut self, mut idx: u64) -> Result<u64, HeapError> {
        while idx != 0 {
            self.budget.ensure_budget(self.queue.budget_per_level)?;
            let p = parent(idx);
            if !self.unsorted_at(idx, p)? {
                break;
            }
            self.swap(idx, p)?;
            tracing::trace!("sift up {} -> {}", idx, p);
            idx = p;
        }
        Ok(idx)
    }

    /// Sift the element at `idx` toward the leaves, considering only the
    /// first `count` slots. Returns its final slot.
    fn restore_down(&mut self, mut idx: u64, count: u64) -> Result<u64, HeapError> {
        while idx < count {
            self.budget.ensure_budget(self.queue.budget_per_level)?;

            let left = left_child(idx);
            let right = right_child(idx);
            let mut winner = idx;
            if left < count && self.unsorted_at(left, winner)? {
                winner = left;
            }
            if right < count && self.unsorted_at(right, winner)? {
                winner = right;
            }
            if winner == idx {
                break;
            }

            self.swap(idx, winner)?;
            tracing::trace!("sift down {} -> {}", idx, winner);
            idx = winner;
        }
        Ok(idx)
    }
}
