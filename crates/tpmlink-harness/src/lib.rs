//! Deterministic test harness for the transport.
//!
//! Scripted in-memory implementations of the device operations, the clock,
//! and the handle-virtualization hooks, so the full transmit path runs
//! under virtual time with every hardware interaction recorded.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod frames;
pub mod mock_chip;
pub mod space;

pub use clock::VirtualClock;
pub use mock_chip::MockChip;
pub use space::MangleSpace;
