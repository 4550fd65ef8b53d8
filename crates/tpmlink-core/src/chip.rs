//! Chip handle and the device operations contract.
//!
//! A [`Chip`] represents one TPM device session: the device-specific
//! operation callbacks, the protocol-version collaborator selected at
//! construction, the transaction mutex, and the currently held locality.
//! The device layer owns the underlying hardware; this handle borrows its
//! operations for the duration of each call.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tpmlink_proto::{CcTable, TransmitFlags};

use crate::env::{Clock, SystemClock};
use crate::protocol::{Protocol, Tpm1Protocol, Tpm2Protocol};

/// Failure from a chip operation callback.
#[derive(Debug, Error)]
pub enum ChipError {
    /// The chip does not implement this hook. Optional hooks report this
    /// through their default implementations; the sequencers treat it as a
    /// no-op success.
    #[error("operation not supported by this chip")]
    Unsupported,

    /// The hardware access itself failed.
    #[error("device I/O failure")]
    Io(#[from] io::Error),
}

/// Device-specific operation callbacks.
///
/// `send`/`recv`/`status`/`cancel` are mandatory; the locality, power and
/// clock hooks are optional and default to [`ChipError::Unsupported`] (or a
/// no-op for the clock gate), which the transport treats as "this chip has
/// no such state to manage".
pub trait ChipOps: Send + Sync {
    /// Hand a complete command to the chip.
    fn send(&self, buf: &[u8]) -> io::Result<()>;

    /// Read the response into `buf`, returning the byte count.
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Current status byte.
    fn status(&self) -> u8;

    /// Ask the chip to abandon the in-flight command.
    fn cancel(&self);

    /// True if `status` says the in-flight command was canceled.
    fn req_canceled(&self, status: u8) -> bool;

    /// Mask applied to the status byte when testing for completion.
    fn req_complete_mask(&self) -> u8;

    /// Masked status value that signals completion. Completion is
    /// `(status & mask) == val`, not a fixed bit position.
    fn req_complete_val(&self) -> u8;

    /// Request the given locality, returning the locality actually granted.
    fn request_locality(&self, _index: u8) -> Result<u8, ChipError> {
        Err(ChipError::Unsupported)
    }

    /// Give up a previously granted locality.
    fn relinquish_locality(&self, _index: u8) -> Result<(), ChipError> {
        Err(ChipError::Unsupported)
    }

    /// Bring the chip into command-ready state.
    fn cmd_ready(&self) -> Result<(), ChipError> {
        Err(ChipError::Unsupported)
    }

    /// Return the chip to its idle state.
    fn go_idle(&self) -> Result<(), ChipError> {
        Err(ChipError::Unsupported)
    }

    /// Gate the chip clock around a transaction.
    fn clk_enable(&self, _enable: bool) {}
}

/// Protocol family implemented by the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// TPM 1.2
    Tpm1,
    /// TPM 2.0
    Tpm2,
}

/// Timing knobs for the poll and retry loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// First retry delay; doubles on every subsequent retry.
    pub retry_delay: Duration,
    /// Retrying stops once the next delay would exceed this ceiling.
    pub retry_ceiling: Duration,
    /// Sleep between status polls.
    pub poll_interval: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(20),
            retry_ceiling: Duration::from_secs(2),
            poll_interval: Duration::from_millis(1),
        }
    }
}

/// One TPM device session.
///
/// Exactly one transaction may be in flight per chip; the transaction
/// mutex is the sole serialization mechanism and is held for the full
/// duration of a call, retries included. The held locality lives behind a
/// guarded accessor so the nested/unlocked call paths never contend with
/// the transaction mutex itself.
pub struct Chip {
    ops: Arc<dyn ChipOps>,
    protocol: Box<dyn Protocol>,
    clock: Arc<dyn Clock>,
    family: Family,
    interrupt_driven: bool,
    cc_table: Option<CcTable>,
    timing: TimingConfig,
    tx_lock: Mutex<()>,
    locality: Mutex<Option<u8>>,
}

impl Chip {
    /// Create a chip handle, selecting the per-version collaborator from
    /// the family flag once here instead of branching at every call site.
    pub fn new(ops: Arc<dyn ChipOps>, family: Family) -> Self {
        let protocol: Box<dyn Protocol> = match family {
            Family::Tpm1 => Box::new(Tpm1Protocol::default()),
            Family::Tpm2 => Box::new(Tpm2Protocol::default()),
        };
        Self {
            ops,
            protocol,
            clock: Arc::new(SystemClock),
            family,
            interrupt_driven: false,
            cc_table: None,
            timing: TimingConfig::default(),
            tx_lock: Mutex::new(()),
            locality: Mutex::new(None),
        }
    }

    /// Replace the clock; tests inject a virtual one.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install the command-attributes table enumerated from the chip.
    pub fn with_cc_table(mut self, table: CcTable) -> Self {
        self.cc_table = Some(table);
        self
    }

    /// Mark the chip as interrupt-driven: completion is assumed after
    /// send and the poller is skipped.
    pub fn with_interrupts(mut self) -> Self {
        self.interrupt_driven = true;
        self
    }

    /// Override the poll/retry timing.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the per-version collaborator, e.g. to supply measured
    /// command durations instead of the defaults.
    pub fn with_protocol(mut self, protocol: Box<dyn Protocol>) -> Self {
        self.protocol = protocol;
        self
    }

    /// True for TPM 2.0 chips.
    pub fn is_tpm2(&self) -> bool {
        self.family == Family::Tpm2
    }

    /// Protocol family.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Locality currently held, if any.
    pub fn locality(&self) -> Option<u8> {
        *self.locality.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_locality(&self, value: Option<u8>) {
        *self.locality.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// Acquire the transaction mutex unless the flags say the caller
    /// already holds it or the call is nested under an outer one.
    pub(crate) fn lock_for(&self, flags: TransmitFlags) -> Option<MutexGuard<'_, ()>> {
        if flags.skips_locking() {
            None
        } else {
            Some(self.tx_lock.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }

    pub(crate) fn ops(&self) -> &dyn ChipOps {
        &*self.ops
    }

    pub(crate) fn protocol(&self) -> &dyn Protocol {
        &*self.protocol
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    pub(crate) fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub(crate) fn cc_table(&self) -> Option<&CcTable> {
        self.cc_table.as_ref()
    }

    pub(crate) fn interrupt_driven(&self) -> bool {
        self.interrupt_driven
    }
}

impl std::fmt::Debug for Chip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chip")
            .field("family", &self.family)
            .field("interrupt_driven", &self.interrupt_driven)
            .field("locality", &self.locality())
            .finish_non_exhaustive()
    }
}
