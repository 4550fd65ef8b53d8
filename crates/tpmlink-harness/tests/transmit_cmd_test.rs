//! Full-exchange facade: three-way result contract and the minimum
//! response length check.

use std::sync::Arc;

use tpmlink_core::{Chip, Family, TpmError, TransmitError};
use tpmlink_harness::{frames, MangleSpace, MockChip, VirtualClock};
use tpmlink_proto::codes::{cc, rc};
use tpmlink_proto::{TransmitFlags, HEADER_SIZE};

fn chip(ops: Arc<MockChip>) -> Chip {
    Chip::new(ops, Family::Tpm2).with_clock(Arc::new(VirtualClock::new()))
}

fn load(cmd: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 512];
    buf[..cmd.len()].copy_from_slice(cmd);
    buf
}

#[test]
fn success_with_sufficient_body() {
    let ops = Arc::new(MockChip::new());
    ops.push_response(frames::response_with_body(rc::SUCCESS, &[0xAA, 0xBB, 0xCC, 0xDD]));
    let chip = chip(ops);

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let len = chip
        .transmit_cmd(None, &mut buf, 4, TransmitFlags::empty(), Some("getting random bytes"))
        .expect("exchange should succeed");

    assert_eq!(len, HEADER_SIZE + 4);
    assert_eq!(&buf[HEADER_SIZE..len], &[0xAA, 0xBB, 0xCC, 0xDD]);
}

#[test]
fn chip_status_surfaces_as_positive_code() {
    let ops = Arc::new(MockChip::new());
    ops.push_response(frames::response(0x100));
    let chip = chip(ops);

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit_cmd(None, &mut buf, 0, TransmitFlags::empty(), Some("getting random bytes"))
        .expect_err("chip status should surface");

    assert!(matches!(err, TpmError::Chip { code: 0x100 }));
    assert_eq!(err.code(), 0x100);
}

#[test]
fn short_body_is_a_transport_error() {
    let ops = Arc::new(MockChip::new());
    let chip = chip(ops);

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit_cmd(None, &mut buf, 4, TransmitFlags::empty(), None)
        .expect_err("missing body should fail");

    assert!(matches!(
        err,
        TpmError::Transport(TransmitError::ShortResponse { len: HEADER_SIZE })
    ));
    assert_eq!(err.code(), -14);
}

#[test]
fn benign_tpm1_statuses_still_surface() {
    let ops = Arc::new(MockChip::new());
    ops.push_response(frames::response(rc::TPM1_DEACTIVATED));
    let chip = Chip::new(ops, Family::Tpm1).with_clock(Arc::new(VirtualClock::new()));

    let mut buf = load(&frames::command(0x65, HEADER_SIZE + 2));
    let err = chip
        .transmit_cmd(None, &mut buf, 0, TransmitFlags::empty(), Some("reading capability"))
        .expect_err("status should surface even when benign");

    assert!(matches!(err, TpmError::Chip { code } if code == rc::TPM1_DEACTIVATED));
}

#[test]
fn retries_happen_below_the_facade() {
    let ops = Arc::new(MockChip::new());
    ops.push_response(frames::response(rc::RETRY));
    ops.push_response(frames::success());
    let chip = chip(ops.clone());

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    chip.transmit_cmd(None, &mut buf, 0, TransmitFlags::empty(), None)
        .expect("exchange should succeed after retry");

    assert_eq!(ops.send_count(), 2);
}

#[test]
fn exhausted_retries_surface_the_busy_status() {
    let ops = Arc::new(MockChip::new());
    ops.set_fallback_response(frames::response(rc::RETRY));
    let chip = chip(ops);

    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit_cmd(None, &mut buf, 0, TransmitFlags::empty(), None)
        .expect_err("busy chip should surface its status");

    assert!(matches!(err, TpmError::Chip { code } if code == rc::RETRY));
}

#[test]
fn commit_failure_propagates() {
    let ops = Arc::new(MockChip::new());
    let chip = chip(ops);

    let mut space = MangleSpace::failing_commit();
    let mut buf = load(&frames::command(cc::GET_RANDOM, HEADER_SIZE + 2));
    let err = chip
        .transmit(Some(&mut space), &mut buf, TransmitFlags::empty())
        .expect_err("commit failure should propagate");

    assert!(matches!(err, TransmitError::Space(_)));
    assert_eq!(space.commit_calls(), 1);
}
