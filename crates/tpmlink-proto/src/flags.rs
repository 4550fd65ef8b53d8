//! Per-call transmit flags.

use bitflags::bitflags;

bitflags! {
    /// Flags modifying how a single transmit call is sequenced.
    ///
    /// Both flags exist for the nested-call case where one logical
    /// operation issues several wire commands under a single outer lock.
    /// Nesting is one level deep by convention; the transport does not
    /// defend against deeper nesting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransmitFlags: u8 {
        /// The caller already holds the transaction mutex; do not lock.
        const UNLOCKED = 1 << 0;
        /// An outer call already performed locality and power sequencing;
        /// skip both (implies no locking either).
        const NESTED = 1 << 1;
    }
}

impl TransmitFlags {
    /// True if this call must not acquire the transaction mutex.
    pub fn skips_locking(self) -> bool {
        self.intersects(Self::UNLOCKED | Self::NESTED)
    }

    /// True if this call must not touch locality or power state.
    pub fn skips_sequencing(self) -> bool {
        self.contains(Self::NESTED)
    }
}
