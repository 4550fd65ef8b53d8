//! Fixed 10-byte command/response header.
//!
//! The command and response layouts are byte-identical except for the
//! meaning of the final field: an ordinal on the way out, a return code on
//! the way back. Both are kept as distinct types so call sites say which
//! direction they are looking at.

use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codes::{rc, tags};
use crate::errors::{ProtocolError, Result};

/// Size of the fixed header: tag (2) + length (4) + ordinal/code (4).
pub const HEADER_SIZE: usize = 10;

/// Largest command or response the transport will carry, matching the
/// chip-side buffer. Longer caller buffers are clamped to this.
pub const MAX_COMMAND_SIZE: usize = 4096;

/// Outbound command header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CommandHeader {
    /// Session tag.
    pub tag: U16<BigEndian>,
    /// Total command length in bytes, header included.
    pub length: U32<BigEndian>,
    /// Command ordinal.
    pub ordinal: U32<BigEndian>,
}

impl CommandHeader {
    /// Parse a command header from the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        Self::read_from_prefix(buf)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::Truncated { len: buf.len() })
    }

    /// Session tag as a native integer.
    pub fn tag(&self) -> u16 {
        self.tag.get()
    }

    /// Declared total length as a native integer.
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    /// Command ordinal as a native integer.
    pub fn ordinal(&self) -> u32 {
        self.ordinal.get()
    }
}

/// Inbound response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ResponseHeader {
    /// Session tag.
    pub tag: U16<BigEndian>,
    /// Total response length in bytes, header included.
    pub length: U32<BigEndian>,
    /// Chip-reported return code.
    pub return_code: U32<BigEndian>,
}

impl ResponseHeader {
    /// Parse a response header from the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        Self::read_from_prefix(buf)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::Truncated { len: buf.len() })
    }

    /// Header-only response carrying the resource-manager layered
    /// "unsupported command" code, synthesized when a command is filtered
    /// out before reaching hardware.
    pub fn unsupported_command() -> Self {
        Self {
            tag: U16::new(tags::NO_SESSIONS),
            length: U32::new(HEADER_SIZE as u32),
            return_code: U32::new(rc::COMMAND_CODE | rc::LAYER_RESMGR),
        }
    }

    /// Write this header over the front of `buf`.
    ///
    /// # Errors
    ///
    /// Fails if `buf` is shorter than [`HEADER_SIZE`].
    pub fn write_to(&self, buf: &mut [u8]) -> Result<()> {
        self.write_to_prefix(buf).map_err(|_| ProtocolError::Truncated { len: buf.len() })
    }

    /// Session tag as a native integer.
    pub fn tag(&self) -> u16 {
        self.tag.get()
    }

    /// Declared total length as a native integer.
    pub fn length(&self) -> u32 {
        self.length.get()
    }

    /// Return code as a native integer.
    pub fn return_code(&self) -> u32 {
        self.return_code.get()
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::codes::cc;

    #[test]
    fn command_header_layout() {
        // GetRandom, 12 bytes total, no sessions
        let raw = hex!("8001 0000000c 0000017b 0020");
        let header = CommandHeader::parse(&raw).unwrap();

        assert_eq!(header.tag(), tags::NO_SESSIONS);
        assert_eq!(header.length(), 12);
        assert_eq!(header.ordinal(), cc::GET_RANDOM);
    }

    #[test]
    fn response_header_layout() {
        let raw = hex!("8001 0000000a 00000922");
        let header = ResponseHeader::parse(&raw).unwrap();

        assert_eq!(header.length(), HEADER_SIZE as u32);
        assert_eq!(header.return_code(), rc::RETRY);
    }

    #[test]
    fn truncated_buffers_rejected() {
        for len in 0..HEADER_SIZE {
            let raw = vec![0u8; len];
            assert!(matches!(
                CommandHeader::parse(&raw),
                Err(ProtocolError::Truncated { .. })
            ));
            assert!(ResponseHeader::parse(&raw).is_err());
        }
    }

    #[test]
    fn synthesized_unsupported_response() {
        let mut buf = [0u8; HEADER_SIZE];
        ResponseHeader::unsupported_command().write_to(&mut buf).unwrap();

        assert_eq!(buf, hex!("8001 0000000a 000b0143"));
    }
}
