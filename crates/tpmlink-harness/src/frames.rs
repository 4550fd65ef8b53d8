//! Builders for literal command and response frames.

use tpmlink_proto::codes::{rc, tags};
use tpmlink_proto::HEADER_SIZE;

/// Build a command frame of `total_len` bytes whose length field declares
/// the full frame. Bytes past the header are zero.
pub fn command(ordinal: u32, total_len: usize) -> Vec<u8> {
    assert!(total_len >= HEADER_SIZE);
    let mut buf = vec![0u8; total_len];
    buf[0..2].copy_from_slice(&tags::NO_SESSIONS.to_be_bytes());
    buf[2..6].copy_from_slice(&(total_len as u32).to_be_bytes());
    buf[6..10].copy_from_slice(&ordinal.to_be_bytes());
    buf
}

/// Header-only response carrying the given return code.
pub fn response(code: u32) -> Vec<u8> {
    response_with_body(code, &[])
}

/// Response with `body` bytes after the header; the length field covers
/// both.
pub fn response_with_body(code: u32, body: &[u8]) -> Vec<u8> {
    let total = HEADER_SIZE + body.len();
    let mut buf = vec![0u8; total];
    buf[0..2].copy_from_slice(&tags::NO_SESSIONS.to_be_bytes());
    buf[2..6].copy_from_slice(&(total as u32).to_be_bytes());
    buf[6..10].copy_from_slice(&code.to_be_bytes());
    buf[HEADER_SIZE..].copy_from_slice(body);
    buf
}

/// Header-only success response.
pub fn success() -> Vec<u8> {
    response(rc::SUCCESS)
}
