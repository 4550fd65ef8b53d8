//! Locality and power-state sequencing guards.
//!
//! Acquisition order in the facade is clock gate, locality, command-ready;
//! the guards release in reverse declaration order on every exit path.
//! Teardown failures are logged and suppressed so they never mask the
//! error that actually ended the attempt.

use tracing::warn;
use tpmlink_proto::TransmitFlags;

use crate::chip::{Chip, ChipError};
use crate::error::TransmitError;

/// Holds locality 0 for the duration of one attempt.
///
/// Inert when the call is nested, when an outer call already holds a
/// locality, or when the chip has no locality hooks.
pub(crate) struct LocalityGuard<'a> {
    chip: &'a Chip,
    held: Option<u8>,
}

impl<'a> LocalityGuard<'a> {
    pub(crate) fn acquire(chip: &'a Chip, flags: TransmitFlags) -> Result<Self, TransmitError> {
        if flags.skips_sequencing() || chip.locality().is_some() {
            return Ok(Self { chip, held: None });
        }

        match chip.ops().request_locality(0) {
            Ok(granted) => {
                chip.set_locality(Some(granted));
                Ok(Self { chip, held: Some(granted) })
            }
            Err(ChipError::Unsupported) => Ok(Self { chip, held: None }),
            Err(err) => Err(TransmitError::Locality(err)),
        }
    }
}

impl Drop for LocalityGuard<'_> {
    fn drop(&mut self) {
        let Some(index) = self.held else { return };

        if let Err(err) = self.chip.ops().relinquish_locality(index)
            && !matches!(err, ChipError::Unsupported)
        {
            warn!(index, error = %err, "failed to relinquish locality");
        }
        self.chip.set_locality(None);
    }
}

/// Returns the chip to idle when the attempt ends, however it ends.
pub(crate) struct IdleGuard<'a> {
    chip: &'a Chip,
    armed: bool,
}

impl<'a> IdleGuard<'a> {
    pub(crate) fn enter_ready(chip: &'a Chip, flags: TransmitFlags) -> Result<Self, TransmitError> {
        if flags.skips_sequencing() {
            return Ok(Self { chip, armed: false });
        }

        match chip.ops().cmd_ready() {
            Ok(()) | Err(ChipError::Unsupported) => Ok(Self { chip, armed: true }),
            Err(err) => Err(TransmitError::Ready(err)),
        }
    }
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.chip.ops().go_idle()
            && !matches!(err, ChipError::Unsupported)
        {
            warn!(error = %err, "failed to return chip to idle");
        }
    }
}

/// Gates the chip clock around an attempt.
pub(crate) struct ClockGate<'a> {
    chip: &'a Chip,
}

impl<'a> ClockGate<'a> {
    pub(crate) fn engage(chip: &'a Chip) -> Self {
        chip.ops().clk_enable(true);
        Self { chip }
    }
}

impl Drop for ClockGate<'_> {
    fn drop(&mut self) {
        self.chip.ops().clk_enable(false);
    }
}
