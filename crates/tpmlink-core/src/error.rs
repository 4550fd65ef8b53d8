//! Error taxonomy for the transmit path.
//!
//! Callers see a three-way contract: success, a chip-reported status code
//! (the chip processed the command and answered with a nonzero code), or a
//! system/transport failure. [`TpmError`] encodes the last two arms;
//! [`TpmError::code`] and [`TransmitError::errno`] expose the numeric
//! positive/negative convention for callers that speak errno.

use std::io;

use thiserror::Error;

use crate::chip::ChipError;

/// Classic errno values backing [`TransmitError::errno`].
pub mod errno {
    /// I/O fault.
    pub const EIO: i32 = 5;
    /// Argument list (here: declared command length) too long.
    pub const E2BIG: i32 = 7;
    /// Bad address; used for framing violations.
    pub const EFAULT: i32 = 14;
    /// Invalid argument.
    pub const EINVAL: i32 = 22;
    /// No data available.
    pub const ENODATA: i32 = 61;
    /// Timer expired.
    pub const ETIME: i32 = 62;
    /// Operation not supported.
    pub const EOPNOTSUPP: i32 = 95;
    /// Operation canceled.
    pub const ECANCELED: i32 = 125;
}

/// Opaque failure from a handle-virtualization (space) transform.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SpaceError(pub String);

/// System/transport failures of a single transmit call.
///
/// None of these are chip-reported statuses; a well-formed response with a
/// nonzero return code is surfaced through [`TpmError::Chip`] instead.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// Command buffer below the fixed header size or shorter than its
    /// declared handle area.
    #[error("malformed command buffer")]
    InvalidCommand,

    /// Command header declares a zero length.
    #[error("command declares zero length")]
    NoData,

    /// Command header declares more bytes than the buffer holds.
    #[error("command length {declared} exceeds buffer capacity {capacity}")]
    Oversized {
        /// Length field from the command header.
        declared: usize,
        /// Usable buffer capacity.
        capacity: usize,
    },

    /// Locality request hook failed.
    #[error("failed to request locality")]
    Locality(#[source] ChipError),

    /// Command-ready transition hook failed.
    #[error("failed to enter command-ready state")]
    Ready(#[source] ChipError),

    /// Space transform rejected the command or response.
    #[error("space transform failed")]
    Space(#[from] SpaceError),

    /// Send hook failed.
    #[error("send failed")]
    Send(#[source] io::Error),

    /// Receive hook failed.
    #[error("receive failed")]
    Receive(#[source] io::Error),

    /// Response shorter than the fixed header.
    #[error("response shorter than header: {len} bytes")]
    ShortResponse {
        /// Received byte count.
        len: usize,
    },

    /// Received byte count disagrees with the response header's length
    /// field.
    #[error("response length mismatch: received {received}, header declares {declared}")]
    LengthMismatch {
        /// Received byte count.
        received: usize,
        /// Length field from the response header.
        declared: usize,
    },

    /// Chip reported the operation as canceled while polling.
    #[error("operation canceled by chip")]
    Canceled,

    /// Completion poll deadline elapsed.
    #[error("timed out waiting for completion")]
    TimedOut,
}

impl TransmitError {
    /// Negative errno equivalent of this failure.
    pub fn errno(&self) -> i32 {
        match self {
            Self::InvalidCommand => -errno::EINVAL,
            Self::NoData => -errno::ENODATA,
            Self::Oversized { .. } => -errno::E2BIG,
            Self::Locality(err) | Self::Ready(err) => chip_errno(err),
            Self::Space(_) => -errno::EIO,
            Self::Send(err) | Self::Receive(err) => io_errno(err),
            Self::ShortResponse { .. } | Self::LengthMismatch { .. } => -errno::EFAULT,
            Self::Canceled => -errno::ECANCELED,
            Self::TimedOut => -errno::ETIME,
        }
    }
}

fn io_errno(err: &io::Error) -> i32 {
    err.raw_os_error().map_or(-errno::EIO, |code| -code)
}

fn chip_errno(err: &ChipError) -> i32 {
    match err {
        ChipError::Unsupported => -errno::EOPNOTSUPP,
        ChipError::Io(io) => io_errno(io),
    }
}

/// Result of a complete command exchange.
#[derive(Debug, Error)]
pub enum TpmError {
    /// The chip processed the command and answered with a nonzero status.
    #[error("chip returned status {code:#x}")]
    Chip {
        /// Return code from the response header.
        code: u32,
    },

    /// The exchange itself failed before a usable response existed.
    #[error(transparent)]
    Transport(#[from] TransmitError),
}

impl TpmError {
    /// Numeric form of the three-way contract: positive chip status,
    /// negative errno. (Success is the `Ok` arm and needs no code.)
    pub fn code(&self) -> i32 {
        match self {
            Self::Chip { code } => *code as i32,
            Self::Transport(err) => err.errno(),
        }
    }
}
