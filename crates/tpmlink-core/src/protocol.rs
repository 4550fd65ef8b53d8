//! Per-version protocol collaborator.
//!
//! The chip's family flag selects one of two [`Protocol`] implementations
//! at construction time. They answer the three questions the transport
//! cannot answer itself: how to transform handles before send, how to
//! reconcile them after receive, and how long a given ordinal may take.
//!
//! The handle-virtualization layer itself is an opaque collaborator behind
//! the [`Space`] trait; TPM 1.2 has no such layer, so its implementation
//! ignores the space entirely.

use std::time::Duration;

use tpmlink_proto::codes::{cc, ord};

use crate::error::SpaceError;

/// Opaque handle-virtualization hook pair.
///
/// A space rewrites volatile handles in outbound commands and reconciles
/// them on the response. The transport invokes the hooks at fixed points
/// and otherwise treats the space as a black box.
pub trait Space: Send {
    /// Transform the outbound command in place before send.
    fn prepare(&mut self, ordinal: u32, buf: &mut [u8]) -> Result<(), SpaceError>;

    /// Reconcile the response in place after a successful receive. May
    /// shrink or grow the response within the buffer via `len`.
    fn commit(&mut self, ordinal: u32, buf: &mut [u8], len: &mut usize) -> Result<(), SpaceError>;
}

/// Version-specific transmit collaborator.
pub trait Protocol: Send + Sync {
    /// Pre-transmit hook on the outbound buffer.
    fn prepare(
        &self,
        space: Option<&mut (dyn Space + '_)>,
        ordinal: u32,
        buf: &mut [u8],
    ) -> Result<(), SpaceError>;

    /// Post-receive hook on the response buffer.
    fn commit(
        &self,
        space: Option<&mut (dyn Space + '_)>,
        ordinal: u32,
        buf: &mut [u8],
        len: &mut usize,
    ) -> Result<(), SpaceError>;

    /// Maximum time the chip may take to answer `ordinal`.
    fn max_duration(&self, ordinal: u32) -> Duration;
}

/// Duration classes for ordinal classification.
///
/// Ordinals not covered by the classification tables get `fallback`, a
/// deliberately generous budget for chips that implement vendor commands
/// the tables know nothing about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    /// Quick state or register reads.
    pub short: Duration,
    /// Commands involving the RNG or modest crypto.
    pub medium: Duration,
    /// Self tests and similar.
    pub long: Duration,
    /// Key-generation class commands.
    pub long_long: Duration,
    /// Anything unclassified.
    pub fallback: Duration,
}

/// TPM 1.2 collaborator. No handle virtualization; the space argument is
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct Tpm1Protocol {
    durations: Durations,
}

impl Default for Tpm1Protocol {
    fn default() -> Self {
        Self {
            durations: Durations {
                short: Duration::from_millis(750),
                medium: Duration::from_secs(2),
                long: Duration::from_secs(300),
                long_long: Duration::from_secs(300),
                fallback: Duration::from_secs(120),
            },
        }
    }
}

impl Tpm1Protocol {
    /// Use measured durations instead of the defaults.
    pub fn with_durations(durations: Durations) -> Self {
        Self { durations }
    }
}

impl Protocol for Tpm1Protocol {
    fn prepare(
        &self,
        _space: Option<&mut (dyn Space + '_)>,
        _ordinal: u32,
        _buf: &mut [u8],
    ) -> Result<(), SpaceError> {
        Ok(())
    }

    fn commit(
        &self,
        _space: Option<&mut (dyn Space + '_)>,
        _ordinal: u32,
        _buf: &mut [u8],
        _len: &mut usize,
    ) -> Result<(), SpaceError> {
        Ok(())
    }

    fn max_duration(&self, ordinal: u32) -> Duration {
        match ordinal {
            ord::OIAP | ord::PCR_EXTEND | ord::PCR_READ | ord::GET_CAPABILITY | ord::STARTUP => {
                self.durations.short
            }
            ord::SEAL | ord::UNSEAL | ord::GET_RANDOM => self.durations.medium,
            ord::SELF_TEST_FULL | ord::CONTINUE_SELF_TEST => self.durations.long,
            _ => self.durations.fallback,
        }
    }
}

/// TPM 2.0 collaborator. Delegates handle transforms to the supplied
/// space, if any.
#[derive(Debug, Clone, Copy)]
pub struct Tpm2Protocol {
    durations: Durations,
}

impl Default for Tpm2Protocol {
    fn default() -> Self {
        Self {
            durations: Durations {
                short: Duration::from_millis(20),
                medium: Duration::from_millis(750),
                long: Duration::from_secs(2),
                long_long: Duration::from_secs(300),
                fallback: Duration::from_secs(120),
            },
        }
    }
}

impl Tpm2Protocol {
    /// Use measured durations instead of the defaults.
    pub fn with_durations(durations: Durations) -> Self {
        Self { durations }
    }
}

impl Protocol for Tpm2Protocol {
    fn prepare(
        &self,
        space: Option<&mut (dyn Space + '_)>,
        ordinal: u32,
        buf: &mut [u8],
    ) -> Result<(), SpaceError> {
        match space {
            Some(space) => space.prepare(ordinal, buf),
            None => Ok(()),
        }
    }

    fn commit(
        &self,
        space: Option<&mut (dyn Space + '_)>,
        ordinal: u32,
        buf: &mut [u8],
        len: &mut usize,
    ) -> Result<(), SpaceError> {
        match space {
            Some(space) => space.commit(ordinal, buf, len),
            None => Ok(()),
        }
    }

    fn max_duration(&self, ordinal: u32) -> Duration {
        match ordinal {
            cc::STARTUP
            | cc::SHUTDOWN
            | cc::PCR_READ
            | cc::PCR_EXTEND
            | cc::NV_READ
            | cc::GET_CAPABILITY
            | cc::CONTEXT_SAVE
            | cc::CONTEXT_LOAD => self.durations.short,
            cc::GET_RANDOM | cc::UNSEAL => self.durations.medium,
            cc::SELF_TEST => self.durations.long,
            cc::CREATE => self.durations.long_long,
            _ => self.durations.fallback,
        }
    }
}
