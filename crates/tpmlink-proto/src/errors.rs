//! Wire-format error types.

use thiserror::Error;

/// Errors produced while parsing or writing wire headers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer is shorter than the fixed header.
    #[error("buffer too short for header: {len} bytes")]
    Truncated {
        /// Actual buffer length.
        len: usize,
    },
}

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
