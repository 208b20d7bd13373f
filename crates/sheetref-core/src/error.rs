//! Error types for sheetref-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, building or editing addresses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Text does not match the address grammar (it may still be a defined name)
    #[error("Invalid address: {0}")]
    Parse(String),

    /// Bounds are out of order or outside the sheet limits
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Operation not allowed on the current formula/range layout
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Structured reference could not be resolved against the table lookup
    #[error("Unresolved table reference: {0}")]
    UnresolvedTable(String),
}

impl Error {
    pub(crate) fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }
}
