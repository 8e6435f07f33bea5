use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected 32, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid type string: {0}")]
    InvalidTypeString(String),

    #[error("Invalid uint width: {0} (must be a multiple of 8 in 8..=512)")]
    InvalidUintWidth(u16),

    #[error("Type has no static size: {0}")]
    DynamicType(String),

    #[error("Type size overflow")]
    SizeOverflow,
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}
