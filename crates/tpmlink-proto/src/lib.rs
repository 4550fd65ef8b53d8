//! Wire format for the TPM command transport.
//!
//! Every exchange with the chip begins with a fixed 10-byte big-endian
//! header: a 2-byte tag, a 4-byte total length at offset 2, and a 4-byte
//! command code (outbound) or return code (inbound) at offset 6. The header
//! is parsed through compile-time verified layouts via `zerocopy`, so a
//! malformed buffer can never be reinterpreted as a valid frame.
//!
//! This crate carries no transport logic. It defines the header layout,
//! the transmit flag bitmask, the command/return-code constants, and the
//! optional command-attributes table a chip may expose for filtering
//! unsupported commands before they reach hardware.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cc_table;
pub mod codes;
pub mod errors;
pub mod flags;
pub mod header;

pub use cc_table::{CcAttrs, CcTable};
pub use errors::{ProtocolError, Result};
pub use flags::TransmitFlags;
pub use header::{CommandHeader, HEADER_SIZE, MAX_COMMAND_SIZE, ResponseHeader};
