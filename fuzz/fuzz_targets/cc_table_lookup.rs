//! Attribute table construction and lookup must never panic, and a code
//! inserted into the table must always be found with its attributes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tpmlink_proto::{CcAttrs, CcTable};

fuzz_target!(|data: &[u8]| {
    let mut entries = Vec::new();
    for chunk in data.chunks_exact(8) {
        let code = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let attrs = u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        entries.push((code, CcAttrs::new(attrs)));
    }

    let table = CcTable::new(entries.clone());
    assert!(table.len() <= entries.len());

    for (code, _) in &entries {
        let attrs = table.find(*code).expect("inserted code must be found");
        assert!(attrs.handle_count() <= 7);
    }
});
