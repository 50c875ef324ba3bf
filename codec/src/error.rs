//! Error types for codec operations

use std::str::Utf8Error;
use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("end of data: {needed} bytes needed, {available} available")]
    EndOfData { needed: usize, available: usize },
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("invalid bool: {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("checkpoint does not belong to the current buffer")]
    StaleCheckpoint,
}

impl Error {
    /// Returns true if the error was caused by reading past the available bytes.
    ///
    /// This is the only error that may go away if more data is provided.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::EndOfData { .. })
    }

    /// Returns true if the error was caused by a malformed value.
    pub fn is_invalid_encoding(&self) -> bool {
        matches!(self, Error::InvalidBool(_) | Error::InvalidUtf8(_))
    }
}
