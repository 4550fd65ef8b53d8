//! Clock abstraction.
//!
//! The poller and the retry loop are the only places the transport blocks.
//! Both take their notion of time from this trait so production uses the
//! system clock while tests substitute a virtual one and observe the exact
//! sleep sequence instead of waiting it out.

use std::time::{Duration, Instant};

/// Source of time and the sleep primitive.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
