//! Header parsing must never panic, and a parsed header must agree with
//! the raw big-endian bytes it came from.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tpmlink_proto::{CommandHeader, HEADER_SIZE, ResponseHeader};

fuzz_target!(|data: &[u8]| {
    match CommandHeader::parse(data) {
        Ok(header) => {
            assert!(data.len() >= HEADER_SIZE);
            assert_eq!(header.tag(), u16::from_be_bytes([data[0], data[1]]));
            assert_eq!(
                header.length(),
                u32::from_be_bytes([data[2], data[3], data[4], data[5]])
            );
            assert_eq!(
                header.ordinal(),
                u32::from_be_bytes([data[6], data[7], data[8], data[9]])
            );
        }
        Err(_) => assert!(data.len() < HEADER_SIZE),
    }

    if let Ok(header) = ResponseHeader::parse(data) {
        let mut out = [0u8; HEADER_SIZE];
        header.write_to(&mut out).unwrap();
        assert_eq!(&out, &data[..HEADER_SIZE]);
    }
});
