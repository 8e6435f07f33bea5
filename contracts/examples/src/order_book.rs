//! Limit Order Book
//!
//! Two priority queues over one application's boxes:
//! - `bids`: highest price first
//! - `asks`: lowest price first
//!
//! Orders at the same price fill in the order they were placed. Every
//! order takes its sequence number from the `seq` global.

use borsh::{BorshDeserialize, BorshSerialize};
use boxq_heap::{Entry, HeapError, HeapHandle, PriorityQueue, SortOrder};
use boxq_storage::{AppStorage, StorageError};
use boxq_types::{Address, TypeSpec};
use boxq_vm::{Budget, Opcode, VmError};

/// ABI type of an order slot.
pub const ORDER_TYPE: &str = "(uint64,uint64,address,uint64)";

/// Encoded size of an order.
pub const ORDER_SIZE: usize = 56;

/// Global holding the next sequence number.
pub const SEQ_KEY: &[u8] = b"seq";

pub const BIDS_BOX: &[u8] = b"bids";
pub const ASKS_BOX: &[u8] = b"asks";

/// A resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Order {
    pub price: u64,
    pub seq: u64,
    pub owner: Address,
    pub amount: u64,
}

impl Order {
    pub fn encode(&self) -> Result<Vec<u8>, HeapError> {
        let mut payload = Vec::with_capacity(Address::LEN + 8);
        payload.extend_from_slice(self.owner.as_bytes());
        payload.extend_from_slice(&self.amount.to_be_bytes());
        Entry::new(self.price, self.seq)
            .with_payload(payload)
            .encode(ORDER_SIZE)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HeapError> {
        if bytes.len() != ORDER_SIZE {
            return Err(HeapError::InvalidElementSize {
                expected: ORDER_SIZE,
                got: bytes.len(),
            });
        }
        let entry = Entry::decode(bytes)?;
        let (owner, amount) = entry.payload.split_at(Address::LEN);
        let mut amount_bytes = [0u8; 8];
        amount_bytes.copy_from_slice(amount);
        Ok(Self {
            price: entry.key,
            seq: entry.sequence,
            owner: Address::from_slice(owner).map_err(HeapError::from)?,
            amount: u64::from_be_bytes(amount_bytes),
        })
    }
}

/// Side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// Fill Event
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct FillEvent {
    pub buyer: Address,
    pub seller: Address,
    /// Price of whichever order rested first
    pub price: u64,
    pub amount: u64,
    pub bid_seq: u64,
    pub ask_seq: u64,
}

/// Order Book Error Types
#[derive(Debug, Clone, PartialEq)]
pub enum OrderBookError {
    /// Amount is zero
    ZeroAmount,
    /// Owner is the zero address
    ZeroAddress,
    /// Caller does not own the order
    NotOwner,
    /// Order is not resting in the book
    OrderNotFound,
    /// Side of the book is full
    BookFull(Side),
    /// The `seq` global cannot advance
    SequenceOverflow,
    /// Heap failure
    Heap(HeapError),
}

impl std::fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderBookError::ZeroAmount => write!(f, "Zero amount"),
            OrderBookError::ZeroAddress => write!(f, "Zero address"),
            OrderBookError::NotOwner => write!(f, "Not order owner"),
            OrderBookError::OrderNotFound => write!(f, "Order not found"),
            OrderBookError::BookFull(side) => write!(f, "{:?} side is full", side),
            OrderBookError::SequenceOverflow => write!(f, "Sequence number overflow"),
            OrderBookError::Heap(e) => write!(f, "Heap error: {}", e),
        }
    }
}

impl std::error::Error for OrderBookError {}

impl From<HeapError> for OrderBookError {
    fn from(e: HeapError) -> Self {
        OrderBookError::Heap(e)
    }
}

impl From<VmError> for OrderBookError {
    fn from(e: VmError) -> Self {
        OrderBookError::Heap(HeapError::Vm(e))
    }
}

impl From<StorageError> for OrderBookError {
    fn from(e: StorageError) -> Self {
        OrderBookError::Heap(HeapError::Storage(e))
    }
}

/// Order book over two box-backed heaps.
#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: PriorityQueue,
    asks: PriorityQueue,
}

impl OrderBook {
    /// Book holding up to `capacity` orders per side.
    pub fn new(capacity: usize) -> Result<Self, OrderBookError> {
        let element: TypeSpec = ORDER_TYPE.parse().map_err(HeapError::from)?;
        let box_size = capacity
            .checked_mul(ORDER_SIZE)
            .ok_or_else(|| HeapError::InvalidConfig(format!("capacity {} overflows", capacity)))?;
        Ok(Self {
            bids: PriorityQueue::new(BIDS_BOX, box_size, SortOrder::Descending, &element)?,
            asks: PriorityQueue::new(ASKS_BOX, box_size, SortOrder::Ascending, &element)?,
        })
    }

    pub fn capacity(&self) -> u64 {
        self.bids.capacity()
    }

    fn queue(&self, side: Side) -> &PriorityQueue {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn heap<'a>(
        &'a self,
        side: Side,
        storage: &'a mut dyn AppStorage,
        budget: &'a mut dyn Budget,
    ) -> HeapHandle<'a> {
        self.queue(side).bind(storage, budget)
    }

    /// Create both boxes.
    pub fn create(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<(), OrderBookError> {
        self.heap(Side::Bid, storage, budget).initialize()?;
        self.heap(Side::Ask, storage, budget).initialize()?;
        tracing::info!("Order book created with {} slots per side", self.capacity());
        Ok(())
    }

    fn next_seq(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<u64, OrderBookError> {
        budget.charge_op(Opcode::GlobalRead)?;
        let seq = storage.get_uint(SEQ_KEY)?;
        budget.charge_op(Opcode::GlobalWrite)?;
        let next = seq.checked_add(1).ok_or(OrderBookError::SequenceOverflow)?;
        storage.put_uint(SEQ_KEY, next)?;
        Ok(seq)
    }

    fn place(
        &self,
        side: Side,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        owner: Address,
        price: u64,
        amount: u64,
    ) -> Result<Order, OrderBookError> {
        if amount == 0 {
            return Err(OrderBookError::ZeroAmount);
        }
        if owner.is_zero() {
            return Err(OrderBookError::ZeroAddress);
        }

        let seq = self.next_seq(storage, budget)?;
        let order = Order {
            price,
            seq,
            owner,
            amount,
        };
        match self.heap(side, storage, budget).insert(&order.encode()?) {
            Ok(()) => {}
            Err(HeapError::CapacityExceeded { .. }) => return Err(OrderBookError::BookFull(side)),
            Err(e) => return Err(e.into()),
        }

        tracing::debug!("{:?} #{} placed: {} @ {}", side, seq, amount, price);
        Ok(order)
    }

    pub fn place_bid(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        owner: Address,
        price: u64,
        amount: u64,
    ) -> Result<Order, OrderBookError> {
        self.place(Side::Bid, storage, budget, owner, price, amount)
    }

    pub fn place_ask(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        owner: Address,
        price: u64,
        amount: u64,
    ) -> Result<Order, OrderBookError> {
        self.place(Side::Ask, storage, budget, owner, price, amount)
    }

    fn cancel(
        &self,
        side: Side,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        sender: Address,
        order: &Order,
    ) -> Result<(), OrderBookError> {
        if order.owner != sender {
            return Err(OrderBookError::NotOwner);
        }
        match self.heap(side, storage, budget).remove(&order.encode()?) {
            Ok(()) => Ok(()),
            Err(HeapError::ElementNotFound) => Err(OrderBookError::OrderNotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub fn cancel_bid(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        sender: Address,
        order: &Order,
    ) -> Result<(), OrderBookError> {
        self.cancel(Side::Bid, storage, budget, sender, order)
    }

    pub fn cancel_ask(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
        sender: Address,
        order: &Order,
    ) -> Result<(), OrderBookError> {
        self.cancel(Side::Ask, storage, budget, sender, order)
    }

    fn best(
        &self,
        side: Side,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<Option<Order>, OrderBookError> {
        match self.heap(side, storage, budget).peek() {
            Ok(bytes) => Ok(Some(Order::decode(&bytes)?)),
            Err(HeapError::EmptyHeap) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Highest bid.
    pub fn best_bid(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<Option<Order>, OrderBookError> {
        self.best(Side::Bid, storage, budget)
    }

    /// Lowest ask.
    pub fn best_ask(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<Option<Order>, OrderBookError> {
        self.best(Side::Ask, storage, budget)
    }

    /// Resting orders per side: `(bids, asks)`.
    pub fn depth(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<(u64, u64), OrderBookError> {
        let bids = self.heap(Side::Bid, storage, budget).count()?;
        let asks = self.heap(Side::Ask, storage, budget).count()?;
        Ok((bids, asks))
    }

    /// Cross the best bid against the best ask if they overlap.
    ///
    /// The partially filled side goes back into the book under its
    /// original sequence number, so it keeps its place in the queue.
    pub fn match_top(
        &self,
        storage: &mut dyn AppStorage,
        budget: &mut dyn Budget,
    ) -> Result<Option<FillEvent>, OrderBookError> {
        let (Some(bid), Some(ask)) = (
            self.best_bid(storage, budget)?,
            self.best_ask(storage, budget)?,
        ) else {
            return Ok(None);
        };
        if bid.price < ask.price {
            return Ok(None);
        }

        self.heap(Side::Bid, storage, budget).pop()?;
        self.heap(Side::Ask, storage, budget).pop()?;

        let amount = bid.amount.min(ask.amount);
        if bid.amount > amount {
            let rest = Order {
                amount: bid.amount - amount,
                ..bid
            };
            self.heap(Side::Bid, storage, budget).insert(&rest.encode()?)?;
        }
        if ask.amount > amount {
            let rest = Order {
                amount: ask.amount - amount,
                ..ask
            };
            self.heap(Side::Ask, storage, budget).insert(&rest.encode()?)?;
        }

        let price = if bid.seq < ask.seq { bid.price } else { ask.price };
        tracing::debug!(
            "Matched bid #{} with ask #{}: {} @ {}",
            bid.seq,
            ask.seq,
            amount,
            price
        );

        Ok(Some(FillEvent {
            buyer: bid.owner,
            seller: ask.owner,
            price,
            amount,
            bid_seq: bid.seq,
            ask_seq: ask.seq,
        }))
    }
}
