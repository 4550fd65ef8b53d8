//! Scripted handle-virtualization hooks.

use tpmlink_core::{Space, SpaceError};
use tpmlink_proto::HEADER_SIZE;

/// Space that overwrites the handle area on prepare.
///
/// Models a resource manager rewriting virtual handles in place: every
/// byte between the header and the end of the command becomes the fill
/// byte, so a retried command is visibly different unless the transport
/// restored the original bytes first.
pub struct MangleSpace {
    fill: u8,
    prepare_calls: usize,
    commit_calls: usize,
    fail_commit: bool,
}

impl MangleSpace {
    /// Space filling the handle area with `0xEE`.
    pub fn new() -> Self {
        Self { fill: 0xEE, prepare_calls: 0, commit_calls: 0, fail_commit: false }
    }

    /// Space whose commit hook always fails.
    pub fn failing_commit() -> Self {
        Self { fail_commit: true, ..Self::new() }
    }

    /// Number of prepare invocations.
    pub fn prepare_calls(&self) -> usize {
        self.prepare_calls
    }

    /// Number of commit invocations.
    pub fn commit_calls(&self) -> usize {
        self.commit_calls
    }
}

impl Default for MangleSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Space for MangleSpace {
    fn prepare(&mut self, _ordinal: u32, buf: &mut [u8]) -> Result<(), SpaceError> {
        self.prepare_calls += 1;
        if buf.len() > HEADER_SIZE {
            for byte in &mut buf[HEADER_SIZE..] {
                *byte = self.fill;
            }
        }
        Ok(())
    }

    fn commit(&mut self, _ordinal: u32, _buf: &mut [u8], _len: &mut usize) -> Result<(), SpaceError> {
        self.commit_calls += 1;
        if self.fail_commit {
            return Err(SpaceError("commit rejected".into()));
        }
        Ok(())
    }
}
