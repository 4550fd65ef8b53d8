//! Transaction facade.
//!
//! [`Chip::transmit`] runs the bounded retry loop around single attempts;
//! [`Chip::transmit_cmd`] adds the minimum-response-length check and
//! splits the result into the three-way success / chip-status / transport
//! contract. Each attempt sequences validation, locality, power state,
//! the space prepare hook, send, the completion poll, receive, and the
//! space commit hook, with guards unwinding everything in reverse order.

use tracing::{error, warn};
use tpmlink_proto::codes::{cc, rc};
use tpmlink_proto::{
    CommandHeader, HEADER_SIZE, MAX_COMMAND_SIZE, ResponseHeader, TransmitFlags,
};

use crate::chip::Chip;
use crate::error::{TpmError, TransmitError};
use crate::poll::{CompletionPoller, PollStep};
use crate::protocol::Space;
use crate::retry::{Backoff, Snapshot};
use crate::sequence::{ClockGate, IdleGuard, LocalityGuard};
use crate::validate::{Verdict, validate_command};

impl Chip {
    /// Run one command exchange, retrying internally while the chip
    /// answers "retry requested" or "self-test running".
    ///
    /// Returns the response length on success, including when the chip's
    /// last answer was still a busy status after the retry budget ran out;
    /// the caller reads the response code and decides. Transport failures
    /// are never retried.
    ///
    /// The buffer carries the command in and the response out. On entry it
    /// must hold at least the 10-byte header; capacity beyond 4096 bytes
    /// is not used.
    pub fn transmit(
        &self,
        mut space: Option<&mut dyn Space>,
        buf: &mut [u8],
        flags: TransmitFlags,
    ) -> Result<usize, TransmitError> {
        // The ordinal sits where the return code will be once the buffer
        // holds a response, so it has to be read up front.
        let sent_ordinal = CommandHeader::parse(buf).map(|h| h.ordinal()).unwrap_or_default();
        let snapshot = Snapshot::capture(buf, space.is_some());
        let mut backoff = Backoff::new(self.timing());

        let _tx = self.lock_for(flags);

        loop {
            let len = self.try_transmit(space.as_mut().map(|s| &mut **s), buf, flags)?;

            let code =
                ResponseHeader::parse(&buf[..len]).map(|h| h.return_code()).unwrap_or(rc::SUCCESS);
            if code != rc::RETRY && code != rc::TESTING {
                return Ok(len);
            }
            // A self-test command answered with "still testing" returns
            // immediately so boot is not serialized behind the test.
            if code == rc::TESTING && sent_ordinal == cc::SELF_TEST {
                return Ok(len);
            }

            if backoff.exhausted() {
                if code == rc::RETRY {
                    warn!("chip still busy, retry budget exhausted");
                } else {
                    warn!("self test still running, retry budget exhausted");
                }
                return Ok(len);
            }

            self.clock().sleep(backoff.step());
            // The space may have rewritten handles during the failed
            // attempt; resend the original bytes.
            snapshot.restore(buf);
        }
    }

    /// Run one command exchange and interpret the response header.
    ///
    /// Returns the response length when the chip answered success and the
    /// response carries at least `min_rsp_body_len` bytes past the header.
    /// A nonzero chip status becomes [`TpmError::Chip`]; everything else is
    /// a transport failure. Chip statuses are logged against `desc` except
    /// for the two benign TPM 1.2 "disabled"/"deactivated" codes.
    pub fn transmit_cmd(
        &self,
        space: Option<&mut dyn Space>,
        buf: &mut [u8],
        min_rsp_body_len: usize,
        flags: TransmitFlags,
        desc: Option<&str>,
    ) -> Result<usize, TpmError> {
        let len = self.transmit(space, buf, flags)?;

        let header = ResponseHeader::parse(&buf[..len])
            .map_err(|_| TransmitError::ShortResponse { len })?;
        let code = header.return_code();
        if code != rc::SUCCESS {
            if code != rc::TPM1_DISABLED
                && code != rc::TPM1_DEACTIVATED
                && let Some(desc) = desc
            {
                error!(code = format_args!("{code:#x}"), "chip error while {desc}");
            }
            return Err(TpmError::Chip { code });
        }

        if len < HEADER_SIZE + min_rsp_body_len {
            return Err(TransmitError::ShortResponse { len }.into());
        }

        Ok(len)
    }

    /// One attempt: validate, sequence, send, wait, receive, reconcile.
    fn try_transmit(
        &self,
        mut space: Option<&mut (dyn Space + '_)>,
        buf: &mut [u8],
        flags: TransmitFlags,
    ) -> Result<usize, TransmitError> {
        match validate_command(self, space.is_some(), buf) {
            Verdict::Malformed => return Err(TransmitError::InvalidCommand),
            Verdict::Unsupported => {
                // Filtered before hardware: hand back a synthesized
                // response carrying the layered "unsupported command" code.
                ResponseHeader::unsupported_command()
                    .write_to(buf)
                    .map_err(|_| TransmitError::InvalidCommand)?;
                return Ok(HEADER_SIZE);
            }
            Verdict::Accept => {}
        }

        let capacity = buf.len().min(MAX_COMMAND_SIZE);
        let buf = &mut buf[..capacity];

        let header = CommandHeader::parse(buf).map_err(|_| TransmitError::InvalidCommand)?;
        let count = header.length() as usize;
        let ordinal = header.ordinal();
        if count == 0 {
            return Err(TransmitError::NoData);
        }
        if count > capacity {
            error!(count, capacity, "invalid command length");
            return Err(TransmitError::Oversized { declared: count, capacity });
        }

        // Guards unwind in reverse declaration order on every exit path;
        // their teardown failures are logged, never propagated. The clock
        // gate is per attempt even for nested calls; only locality and
        // power sequencing honor the nesting flag.
        let _clk = ClockGate::engage(self);
        let _locality = LocalityGuard::acquire(self, flags)?;
        let _idle = IdleGuard::enter_ready(self, flags)?;

        self.protocol().prepare(space.as_mut().map(|s| &mut **s), ordinal, buf)?;

        self.ops().send(&buf[..count]).map_err(|err| {
            error!(error = %err, "send failed");
            TransmitError::Send(err)
        })?;

        if !self.interrupt_driven() {
            self.wait_for_completion(ordinal)?;
        }

        let mut len = self.receive(buf)?;

        self.protocol().commit(space, ordinal, buf, &mut len).map_err(|err| {
            error!(error = %err, "commit failed");
            TransmitError::from(err)
        })?;

        Ok(len)
    }

    /// Poll the status byte until completion, cancellation, or the
    /// ordinal's duration budget runs out. The only blocking in the
    /// transport happens here, in poll-interval increments.
    fn wait_for_completion(&self, ordinal: u32) -> Result<(), TransmitError> {
        let ops = self.ops();
        let poller = CompletionPoller::new(
            self.clock().now(),
            self.protocol().max_duration(ordinal),
            self.timing().poll_interval,
            ops.req_complete_mask(),
            ops.req_complete_val(),
        );

        loop {
            let status = ops.status();
            match poller.step(status, ops.req_canceled(status), self.clock().now()) {
                PollStep::Receive => return Ok(()),
                PollStep::Sleep(interval) => self.clock().sleep(interval),
                PollStep::Canceled => {
                    error!("operation canceled");
                    return Err(TransmitError::Canceled);
                }
                PollStep::TimedOut => {
                    // Best effort; the chip may ignore it.
                    ops.cancel();
                    error!("operation timed out");
                    return Err(TransmitError::TimedOut);
                }
            }
        }
    }

    /// Receive the response and re-validate its framing.
    fn receive(&self, buf: &mut [u8]) -> Result<usize, TransmitError> {
        let len = self.ops().recv(buf).map_err(|err| {
            error!(error = %err, "receive failed");
            TransmitError::Receive(err)
        })?;

        if len < HEADER_SIZE {
            return Err(TransmitError::ShortResponse { len });
        }
        let header =
            ResponseHeader::parse(&buf[..len]).map_err(|_| TransmitError::ShortResponse { len })?;
        let declared = header.length() as usize;
        if len != declared {
            return Err(TransmitError::LengthMismatch { received: len, declared });
        }

        Ok(len)
    }
}
