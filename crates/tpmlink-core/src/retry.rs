//! Outbound snapshot and retry backoff policy.
//!
//! A space may rewrite handles in the outbound buffer during an attempt,
//! so a retry must resend the original bytes, not the transformed ones.
//! The snapshot is captured exactly once per facade call, before the first
//! attempt, and restored before every resubmission.

use std::time::Duration;

use tpmlink_proto::HEADER_SIZE;

use crate::chip::TimingConfig;

/// Header plus up to three trailing 4-byte handle fields.
pub(crate) const SAVE_CAPACITY: usize = HEADER_SIZE + 3 * 4;

/// Immutable copy of the outbound header-and-handles prefix.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot {
    bytes: [u8; SAVE_CAPACITY],
    len: usize,
}

impl Snapshot {
    /// Capture the prefix of `buf`. Handles are only saved when a space is
    /// in play; without one nothing rewrites them, so the header suffices.
    pub(crate) fn capture(buf: &[u8], with_handles: bool) -> Self {
        let capacity = if with_handles { SAVE_CAPACITY } else { HEADER_SIZE };
        let len = capacity.min(buf.len());
        let mut bytes = [0u8; SAVE_CAPACITY];
        bytes[..len].copy_from_slice(&buf[..len]);
        Self { bytes, len }
    }

    /// Write the captured prefix back over `buf`.
    pub(crate) fn restore(&self, buf: &mut [u8]) {
        buf[..self.len].copy_from_slice(&self.bytes[..self.len]);
    }
}

/// Doubling backoff with a hard ceiling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Backoff {
    delay: Duration,
    ceiling: Duration,
}

impl Backoff {
    pub(crate) fn new(timing: &TimingConfig) -> Self {
        Self { delay: timing.retry_delay, ceiling: timing.retry_ceiling }
    }

    /// True once the next delay would exceed the ceiling; the retry loop
    /// stops and hands the caller the chip's last response.
    pub(crate) fn exhausted(&self) -> bool {
        self.delay > self.ceiling
    }

    /// Current delay to sleep; doubles for the next round.
    pub(crate) fn step(&mut self) -> Duration {
        let delay = self.delay;
        self.delay *= 2;
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_restores_original_prefix() {
        let original: Vec<u8> = (0u8..32).collect();
        let snapshot = Snapshot::capture(&original, true);

        let mut mangled = original.clone();
        mangled[..SAVE_CAPACITY].fill(0xFF);
        snapshot.restore(&mut mangled);

        assert_eq!(&mangled[..SAVE_CAPACITY], &original[..SAVE_CAPACITY]);
        // Bytes past the handle area are untouched by restore.
        assert_eq!(&mangled[SAVE_CAPACITY..], &original[SAVE_CAPACITY..]);
    }

    #[test]
    fn snapshot_without_space_saves_header_only() {
        let original: Vec<u8> = (0u8..32).collect();
        let snapshot = Snapshot::capture(&original, false);

        let mut mangled = original.clone();
        mangled.fill(0xFF);
        snapshot.restore(&mut mangled);

        assert_eq!(&mangled[..HEADER_SIZE], &original[..HEADER_SIZE]);
        assert!(mangled[HEADER_SIZE..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn snapshot_clamps_to_short_buffers() {
        let original = [0xABu8; 4];
        let snapshot = Snapshot::capture(&original, true);

        let mut buf = [0u8; 4];
        snapshot.restore(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn backoff_doubles_to_ceiling() {
        let timing = TimingConfig::default();
        let mut backoff = Backoff::new(&timing);
        let mut delays = Vec::new();

        while !backoff.exhausted() {
            delays.push(backoff.step());
        }

        let expected: Vec<Duration> =
            [20u64, 40, 80, 160, 320, 640, 1280].iter().map(|&ms| Duration::from_millis(ms)).collect();
        assert_eq!(delays, expected);
    }
}
