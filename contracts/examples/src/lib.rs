//! boxq Application Examples
//!
//! Applications built on box-backed priority queues.

pub mod order_book;

pub use order_book::{FillEvent, Order, OrderBook, OrderBookError, Side, ORDER_SIZE, ORDER_TYPE};

/// Contract version
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
