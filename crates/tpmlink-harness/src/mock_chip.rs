//! Scripted in-memory chip.
//!
//! Implements the device operations against queues of canned responses and
//! status bytes, recording every hook invocation so tests can assert on
//! exactly what the transport did to the "hardware".

use std::collections::VecDeque;
use std::io;
use std::sync::{Mutex, PoisonError};

use tpmlink_core::{ChipError, ChipOps};
use tpmlink_proto::codes::{rc, tags};
use tpmlink_proto::HEADER_SIZE;

/// Status byte the default chip reports: command complete.
pub const STATUS_COMPLETE: u8 = 0xC0;
/// Status byte for a chip still working.
pub const STATUS_BUSY: u8 = 0x00;

struct MockState {
    sent: Vec<Vec<u8>>,
    recv_count: usize,
    responses: VecDeque<Vec<u8>>,
    fallback_response: Vec<u8>,
    statuses: VecDeque<u8>,
    idle_status: u8,
    canceled: bool,
    cancel_count: usize,
    locality_hooks: bool,
    locality_error: bool,
    relinquish_error: bool,
    power_hooks: bool,
    ready_error: bool,
    send_error: bool,
    recv_error: bool,
    locality_requests: Vec<u8>,
    locality_relinquishes: Vec<u8>,
    cmd_ready_calls: usize,
    go_idle_calls: usize,
    clk_events: Vec<bool>,
}

/// Scripted chip with recorded interactions.
///
/// By default every optional hook is absent, the status byte reports
/// completion immediately, and `recv` answers a header-only success frame
/// once the scripted response queue runs dry.
pub struct MockChip {
    state: Mutex<MockState>,
}

fn success_frame() -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_SIZE];
    buf[0..2].copy_from_slice(&tags::NO_SESSIONS.to_be_bytes());
    buf[2..6].copy_from_slice(&(HEADER_SIZE as u32).to_be_bytes());
    buf[6..10].copy_from_slice(&rc::SUCCESS.to_be_bytes());
    buf
}

impl MockChip {
    /// Chip with no optional hooks and instant completion.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                sent: Vec::new(),
                recv_count: 0,
                responses: VecDeque::new(),
                fallback_response: success_frame(),
                statuses: VecDeque::new(),
                idle_status: STATUS_COMPLETE,
                canceled: false,
                cancel_count: 0,
                locality_hooks: false,
                locality_error: false,
                relinquish_error: false,
                power_hooks: false,
                ready_error: false,
                send_error: false,
                recv_error: false,
                locality_requests: Vec::new(),
                locality_relinquishes: Vec::new(),
                cmd_ready_calls: 0,
                go_idle_calls: 0,
                clk_events: Vec::new(),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enable the locality request/relinquish hooks.
    pub fn with_locality(self) -> Self {
        self.state().locality_hooks = true;
        self
    }

    /// Enable the command-ready/go-idle hooks.
    pub fn with_power_hooks(self) -> Self {
        self.state().power_hooks = true;
        self
    }

    /// Make `request_locality` fail with an I/O error. Implies the hooks
    /// are present.
    pub fn failing_locality(self) -> Self {
        {
            let mut state = self.state();
            state.locality_hooks = true;
            state.locality_error = true;
        }
        self
    }

    /// Make `relinquish_locality` fail with an I/O error.
    pub fn failing_relinquish(self) -> Self {
        self.state().relinquish_error = true;
        self
    }

    /// Make `cmd_ready` fail with an I/O error. Implies the hooks are
    /// present.
    pub fn failing_ready(self) -> Self {
        {
            let mut state = self.state();
            state.power_hooks = true;
            state.ready_error = true;
        }
        self
    }

    /// Make `send` fail with an I/O error.
    pub fn failing_send(self) -> Self {
        self.state().send_error = true;
        self
    }

    /// Make `recv` fail with an I/O error.
    pub fn failing_recv(self) -> Self {
        self.state().recv_error = true;
        self
    }

    /// Queue one response frame; frames are consumed in order.
    pub fn push_response(&self, frame: Vec<u8>) {
        self.state().responses.push_back(frame);
    }

    /// Replace the frame answered once the queue is empty.
    pub fn set_fallback_response(&self, frame: Vec<u8>) {
        self.state().fallback_response = frame;
    }

    /// Queue status bytes; once consumed, `idle` repeats forever.
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = u8>, idle: u8) {
        let mut state = self.state();
        state.statuses.extend(statuses);
        state.idle_status = idle;
    }

    /// Report the in-flight command as canceled on the next poll.
    pub fn set_canceled(&self) {
        self.state().canceled = true;
    }

    /// Every command handed to `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state().sent.clone()
    }

    /// Number of `send` calls.
    pub fn send_count(&self) -> usize {
        self.state().sent.len()
    }

    /// Number of `recv` calls.
    pub fn recv_count(&self) -> usize {
        self.state().recv_count
    }

    /// Number of `cancel` calls.
    pub fn cancel_count(&self) -> usize {
        self.state().cancel_count
    }

    /// Locality indices requested, in order.
    pub fn locality_requests(&self) -> Vec<u8> {
        self.state().locality_requests.clone()
    }

    /// Locality indices relinquished, in order.
    pub fn locality_relinquishes(&self) -> Vec<u8> {
        self.state().locality_relinquishes.clone()
    }

    /// Number of `cmd_ready` calls.
    pub fn cmd_ready_calls(&self) -> usize {
        self.state().cmd_ready_calls
    }

    /// Number of `go_idle` calls.
    pub fn go_idle_calls(&self) -> usize {
        self.state().go_idle_calls
    }

    /// Clock-gate transitions, in order.
    pub fn clk_events(&self) -> Vec<bool> {
        self.state().clk_events.clone()
    }
}

impl Default for MockChip {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipOps for MockChip {
    fn send(&self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        if state.send_error {
            return Err(io::Error::from_raw_os_error(5));
        }
        state.sent.push(buf.to_vec());
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.recv_count += 1;
        if state.recv_error {
            return Err(io::Error::from_raw_os_error(5));
        }
        let frame = state.responses.pop_front().unwrap_or_else(|| state.fallback_response.clone());
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }

    fn status(&self) -> u8 {
        let mut state = self.state();
        state.statuses.pop_front().unwrap_or(state.idle_status)
    }

    fn cancel(&self) {
        self.state().cancel_count += 1;
    }

    fn req_canceled(&self, _status: u8) -> bool {
        self.state().canceled
    }

    fn req_complete_mask(&self) -> u8 {
        STATUS_COMPLETE
    }

    fn req_complete_val(&self) -> u8 {
        STATUS_COMPLETE
    }

    fn request_locality(&self, index: u8) -> Result<u8, ChipError> {
        let mut state = self.state();
        if !state.locality_hooks {
            return Err(ChipError::Unsupported);
        }
        if state.locality_error {
            return Err(ChipError::Io(io::Error::from_raw_os_error(5)));
        }
        state.locality_requests.push(index);
        Ok(index)
    }

    fn relinquish_locality(&self, index: u8) -> Result<(), ChipError> {
        let mut state = self.state();
        if !state.locality_hooks {
            return Err(ChipError::Unsupported);
        }
        state.locality_relinquishes.push(index);
        if state.relinquish_error {
            return Err(ChipError::Io(io::Error::from_raw_os_error(5)));
        }
        Ok(())
    }

    fn cmd_ready(&self) -> Result<(), ChipError> {
        let mut state = self.state();
        if !state.power_hooks {
            return Err(ChipError::Unsupported);
        }
        if state.ready_error {
            return Err(ChipError::Io(io::Error::from_raw_os_error(5)));
        }
        state.cmd_ready_calls += 1;
        Ok(())
    }

    fn go_idle(&self) -> Result<(), ChipError> {
        let mut state = self.state();
        if !state.power_hooks {
            return Err(ChipError::Unsupported);
        }
        state.go_idle_calls += 1;
        Ok(())
    }

    fn clk_enable(&self, enable: bool) {
        self.state().clk_events.push(enable);
    }
}
