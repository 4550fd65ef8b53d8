//! Optional per-chip command-attributes table.
//!
//! TPM 2.0 chips can enumerate the commands they implement along with an
//! attribute word per command. The transport uses the table for two checks
//! before touching hardware: is the command implemented at all, and does
//! the buffer actually carry the handles the attribute word declares.

/// Attribute word for one command code.
///
/// The only field the transport reads is the declared handle count in bits
/// 25..=27; the rest of the word is carried opaquely for the device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcAttrs(u32);

/// Bit position of the handle-count field inside the attribute word.
const CHANDLES_SHIFT: u32 = 25;

impl CcAttrs {
    /// Wrap a raw attribute word as enumerated from the chip.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Attribute word declaring `count` command handles, for tests and
    /// synthetic tables. Only the low three bits of `count` are encoded.
    pub const fn with_handles(count: u32) -> Self {
        Self((count & 0x7) << CHANDLES_SHIFT)
    }

    /// Number of 4-byte handles the command carries after the header.
    pub fn handle_count(self) -> usize {
        ((self.0 >> CHANDLES_SHIFT) & 0x7) as usize
    }

    /// The raw attribute word.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Command-code to attribute-word mapping, sorted for binary search.
#[derive(Debug, Clone, Default)]
pub struct CcTable {
    entries: Vec<(u32, CcAttrs)>,
}

impl CcTable {
    /// Build a table from enumerated entries. Input order does not matter;
    /// duplicate command codes keep the first occurrence.
    pub fn new(mut entries: Vec<(u32, CcAttrs)>) -> Self {
        entries.sort_by_key(|&(cc, _)| cc);
        entries.dedup_by_key(|&mut (cc, _)| cc);
        Self { entries }
    }

    /// Look up the attribute word for a command code.
    pub fn find(&self, cc: u32) -> Option<CcAttrs> {
        self.entries
            .binary_search_by_key(&cc, |&(code, _)| code)
            .ok()
            .map(|i| self.entries[i].1)
    }

    /// True if the chip enumerated no commands; an empty table disables
    /// filtering rather than rejecting everything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enumerated commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::cc;

    #[test]
    fn lookup_after_unsorted_construction() {
        let table = CcTable::new(vec![
            (cc::PCR_EXTEND, CcAttrs::with_handles(1)),
            (cc::GET_RANDOM, CcAttrs::with_handles(0)),
            (cc::UNSEAL, CcAttrs::with_handles(1)),
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.find(cc::PCR_EXTEND).map(CcAttrs::handle_count), Some(1));
        assert_eq!(table.find(cc::GET_RANDOM).map(CcAttrs::handle_count), Some(0));
        assert_eq!(table.find(cc::SELF_TEST), None);
    }

    #[test]
    fn handle_count_extraction() {
        // Handle count lives in bits 25..=27; other bits are opaque.
        let attrs = CcAttrs::new((0x3 << 25) | 0x0000_1182);
        assert_eq!(attrs.handle_count(), 3);

        assert_eq!(CcAttrs::with_handles(2).handle_count(), 2);
        assert_eq!(CcAttrs::with_handles(0).handle_count(), 0);
    }

    #[test]
    fn duplicate_codes_keep_first() {
        let table = CcTable::new(vec![
            (cc::UNSEAL, CcAttrs::with_handles(1)),
            (cc::UNSEAL, CcAttrs::with_handles(2)),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.find(cc::UNSEAL).map(CcAttrs::handle_count), Some(1));
    }
}
