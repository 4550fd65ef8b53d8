//! Virtual clock.
//!
//! `sleep` advances the clock by the requested duration instead of
//! blocking, so a poll or retry loop that would take minutes of wall time
//! finishes instantly, and the recorded sleeps expose exactly what the
//! transport waited for.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tpmlink_core::Clock;

struct ClockState {
    now: Instant,
    sleeps: Vec<Duration>,
}

/// Clock whose time only moves when someone sleeps on it.
pub struct VirtualClock {
    state: Mutex<ClockState>,
}

impl VirtualClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self { state: Mutex::new(ClockState { now: Instant::now(), sleeps: Vec::new() }) }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sleeps.clone()
    }

    /// Total virtual time slept.
    pub fn slept(&self) -> Duration {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sleeps.iter().sum()
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).now += by;
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.sleeps.push(duration);
        state.now += duration;
    }
}
