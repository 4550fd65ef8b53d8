//! TPM transport core logic
//!
//! The single entry point callers use is [`Chip::transmit_cmd`] (or the
//! lower-level [`Chip::transmit`]): one well-formed command/response
//! exchange with a half-duplex chip that has no interrupt signaling and can
//! take anywhere from microseconds to minutes to answer.
//!
//! # Architecture
//!
//! The transmit path is built from small, separately testable pieces that
//! the facade composes in a fixed order: command validation, locality and
//! power-state sequencing, a polling-based completion wait, and a bounded
//! retry loop for the chip's "come back later" statuses. Time is supplied
//! through an injected [`env::Clock`] so tests drive the poll and retry
//! loops with a virtual clock instead of wall-clock sleeping.
//!
//! Resource ordering (mutex, clock gate, locality, command-ready state) is
//! enforced structurally with scoped guards: every exit path releases in
//! strict reverse order, and teardown failures are logged without masking
//! the first error encountered.
//!
//! # Components
//!
//! - [`chip`]: chip handle and the device operations contract
//! - [`protocol`]: per-version collaborator (prepare/commit hooks, durations)
//! - `validate`: command framing pre-checks
//! - `poll`: completion poller state machine
//! - `retry`: outbound snapshot and backoff policy
//! - `transmit`: the transaction facade
//! - [`mod@env`]: clock abstraction (time, sleep)
//! - [`error`]: error taxonomy and errno mapping

pub mod chip;
pub mod env;
pub mod error;
mod poll;
pub mod protocol;
mod retry;
mod sequence;
mod transmit;
mod validate;

pub use chip::{Chip, ChipError, ChipOps, Family, TimingConfig};
pub use env::{Clock, SystemClock};
pub use error::{SpaceError, TpmError, TransmitError};
pub use protocol::{Durations, Protocol, Space, Tpm1Protocol, Tpm2Protocol};
