//! Command framing pre-checks.
//!
//! Purely inspects the buffer; rejection happens before any hardware
//! interaction. The attribute-table checks only apply on the
//! resource-managed path (a space is supplied) of a TPM 2.0 chip that has
//! actually enumerated its command set.

use tpmlink_proto::{CommandHeader, HEADER_SIZE};
use tracing::debug;

use crate::chip::Chip;

/// Outcome of the pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Command may be sent.
    Accept,
    /// Buffer below the header size or shorter than its declared handles.
    Malformed,
    /// Command code absent from the chip's attribute table; the facade
    /// synthesizes an "unsupported command" response instead of sending.
    Unsupported,
}

pub(crate) fn validate_command(chip: &Chip, has_space: bool, cmd: &[u8]) -> Verdict {
    if cmd.len() < HEADER_SIZE {
        return Verdict::Malformed;
    }

    if !has_space || !chip.is_tpm2() {
        return Verdict::Accept;
    }

    let Some(table) = chip.cc_table().filter(|table| !table.is_empty()) else {
        return Verdict::Accept;
    };

    let Ok(header) = CommandHeader::parse(cmd) else {
        return Verdict::Malformed;
    };
    let ordinal = header.ordinal();

    let Some(attrs) = table.find(ordinal) else {
        debug!(ordinal = format_args!("{ordinal:#06x}"), "invalid command");
        return Verdict::Unsupported;
    };

    let needed = HEADER_SIZE + 4 * attrs.handle_count();
    if cmd.len() < needed {
        debug!(len = cmd.len(), needed, "insufficient command length");
        return Verdict::Malformed;
    }

    Verdict::Accept
}
