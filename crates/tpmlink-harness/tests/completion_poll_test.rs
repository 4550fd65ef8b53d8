//! Completion polling under virtual time: poll cadence, timeout with
//! cancellation, chip-initiated cancel, and the interrupt-driven skip.

use std::sync::Arc;
use std::time::Duration;

use tpmlink_core::{Chip, Family, TransmitError};
use tpmlink_harness::mock_chip::{STATUS_BUSY, STATUS_COMPLETE};
use tpmlink_harness::{frames, MockChip, VirtualClock};
use tpmlink_proto::codes::cc;
use tpmlink_proto::{TransmitFlags, HEADER_SIZE};

fn chip(ops: Arc<MockChip>, clock: Arc<VirtualClock>) -> Chip {
    Chip::new(ops, Family::Tpm2).with_clock(clock)
}

fn load(cmd: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 512];
    buf[..cmd.len()].copy_from_slice(cmd);
    buf
}

#[test]
fn polls_at_fixed_interval_until_complete() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    ops.script_statuses([STATUS_BUSY, STATUS_BUSY, STATUS_COMPLETE], STATUS_COMPLETE);
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    chip.transmit(None, &mut buf, TransmitFlags::empty()).expect("transmit should succeed");

    assert_eq!(clock.sleeps(), vec![Duration::from_millis(1), Duration::from_millis(1)]);
    assert_eq!(ops.recv_count(), 1);
}

#[test]
fn timeout_cancels_the_command() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    ops.script_statuses([], STATUS_BUSY);
    let chip = chip(ops.clone(), clock.clone());

    // Medium-class command: 750ms budget at a 1ms poll interval.
    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit(None, &mut buf, TransmitFlags::empty())
        .expect_err("transmit should time out");

    assert!(matches!(err, TransmitError::TimedOut));
    assert_eq!(err.errno(), -62);
    assert_eq!(ops.cancel_count(), 1);
    assert_eq!(ops.recv_count(), 0);
    assert_eq!(clock.slept(), Duration::from_millis(750));
}

#[test]
fn chip_initiated_cancel_stops_polling() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    ops.script_statuses([], STATUS_BUSY);
    ops.set_canceled();
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit(None, &mut buf, TransmitFlags::empty())
        .expect_err("transmit should report cancellation");

    assert!(matches!(err, TransmitError::Canceled));
    assert_eq!(err.errno(), -125);
    // The chip canceled on its own; the transport does not cancel again.
    assert_eq!(ops.cancel_count(), 0);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn interrupt_driven_chip_skips_the_poller() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    ops.script_statuses([], STATUS_BUSY);
    let chip = Chip::new(ops.clone(), Family::Tpm2).with_clock(clock.clone()).with_interrupts();

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    chip.transmit(None, &mut buf, TransmitFlags::empty()).expect("transmit should succeed");

    assert!(clock.sleeps().is_empty());
    assert_eq!(ops.recv_count(), 1);
}

#[test]
fn short_response_rejected() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    ops.push_response(vec![0x80, 0x01, 0x00, 0x00]);
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit(None, &mut buf, TransmitFlags::empty())
        .expect_err("framing violation should fail");

    assert!(matches!(err, TransmitError::ShortResponse { len: 4 }));
    assert_eq!(err.errno(), -14);
}

#[test]
fn response_length_field_must_match_received_bytes() {
    let ops = Arc::new(MockChip::new());
    let clock = Arc::new(VirtualClock::new());
    let mut frame = frames::success();
    // Header claims two bytes more than the chip delivers.
    frame[2..6].copy_from_slice(&((HEADER_SIZE as u32) + 2).to_be_bytes());
    ops.push_response(frame);
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit(None, &mut buf, TransmitFlags::empty())
        .expect_err("framing violation should fail");

    assert!(matches!(err, TransmitError::LengthMismatch { received: 10, declared: 12 }));
}

#[test]
fn send_failure_is_not_retried() {
    let ops = Arc::new(MockChip::new().failing_send());
    let clock = Arc::new(VirtualClock::new());
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err =
        chip.transmit(None, &mut buf, TransmitFlags::empty()).expect_err("send should fail");

    assert!(matches!(err, TransmitError::Send(_)));
    assert_eq!(err.errno(), -5);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn receive_failure_surfaces_as_transport_error() {
    let ops = Arc::new(MockChip::new().failing_recv());
    let clock = Arc::new(VirtualClock::new());
    let chip = chip(ops.clone(), clock.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err =
        chip.transmit(None, &mut buf, TransmitFlags::empty()).expect_err("receive should fail");

    assert!(matches!(err, TransmitError::Receive(_)));
}
