//! Completion poller state machine.
//!
//! The chip has no interrupt signaling in the general case, so after send
//! the transport polls the status byte until the chip reports completion,
//! cancellation, or the command's duration budget runs out. The decision
//! logic is pure: the caller reads the status and supplies the current
//! instant, this type answers with the next step. The only sleeping
//! happens in the driver loop through the injected clock.

use std::time::{Duration, Instant};

/// Next step the driver loop must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollStep {
    /// Chip reports the request complete; go receive the response.
    Receive,
    /// Not done yet; sleep this long and poll again.
    Sleep(Duration),
    /// Chip reports the operation canceled.
    Canceled,
    /// Duration budget elapsed without completion.
    TimedOut,
}

/// Decision logic for one send's completion wait.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CompletionPoller {
    deadline: Instant,
    interval: Duration,
    complete_mask: u8,
    complete_val: u8,
}

impl CompletionPoller {
    pub(crate) fn new(
        start: Instant,
        budget: Duration,
        interval: Duration,
        complete_mask: u8,
        complete_val: u8,
    ) -> Self {
        Self { deadline: start + budget, interval, complete_mask, complete_val }
    }

    /// Classify one status read. Completion wins over cancellation when a
    /// status byte happens to signal both.
    pub(crate) fn step(&self, status: u8, canceled: bool, now: Instant) -> PollStep {
        if status & self.complete_mask == self.complete_val {
            return PollStep::Receive;
        }
        if canceled {
            return PollStep::Canceled;
        }
        if now >= self.deadline {
            return PollStep::TimedOut;
        }
        PollStep::Sleep(self.interval)
    }
}
