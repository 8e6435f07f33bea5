//! boxq Types - Core type definitions shared across the boxq crates.
//!
//! This crate provides:
//! - 32-byte owner addresses with a hex text form
//! - ABI type descriptors used to size fixed-layout box elements

pub mod abi;
pub mod address;
pub mod error;

#[cfg(any(feature = "serde", feature = "borsh"))]
mod serialization;

pub use abi::TypeSpec;
pub use address::Address;
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Address, TypeSpec, TypesError};
}
