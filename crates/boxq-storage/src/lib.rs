//! boxq Storage - Box and global state storage for applications.
//!
//! This crate provides:
//! - The [`ByteStore`] box interface and the [`GlobalState`] key-value interface
//! - [`AppState`], the in-memory state of one application
//! - [`Overlay`], the write buffer that makes an application call all-or-nothing
//! - [`Database`], JSON file persistence

pub mod box_store;
pub mod db;
pub mod error;
pub mod global_state;
pub mod overlay;
pub mod state;

pub use box_store::{check_box_size, check_range, ByteStore, MAX_BOX_SIZE};
pub use db::Database;
pub use error::StorageError;
pub use global_state::{GlobalState, StateValue};
pub use overlay::Overlay;
pub use state::AppState;

/// Storage visible to application code: boxes plus globals.
pub trait AppStorage: ByteStore + GlobalState {}

impl<T: ByteStore + GlobalState + ?Sized> AppStorage for T {}
