//! Command ordinals, return codes, and session tags.
//!
//! Only the codes the transport itself inspects are defined here; command
//! builders live with the per-version collaborators, not in this crate.

/// Session tags (first two header bytes).
pub mod tags {
    /// Command or response without authorization sessions.
    pub const NO_SESSIONS: u16 = 0x8001;
    /// Command or response carrying authorization sessions.
    pub const SESSIONS: u16 = 0x8002;
}

/// TPM 2.0 command codes.
pub mod cc {
    /// TPM2_SelfTest
    pub const SELF_TEST: u32 = 0x0143;
    /// TPM2_Startup
    pub const STARTUP: u32 = 0x0144;
    /// TPM2_Shutdown
    pub const SHUTDOWN: u32 = 0x0145;
    /// TPM2_NV_Read
    pub const NV_READ: u32 = 0x014E;
    /// TPM2_Create
    pub const CREATE: u32 = 0x0153;
    /// TPM2_Unseal
    pub const UNSEAL: u32 = 0x015E;
    /// TPM2_ContextLoad
    pub const CONTEXT_LOAD: u32 = 0x0161;
    /// TPM2_ContextSave
    pub const CONTEXT_SAVE: u32 = 0x0162;
    /// TPM2_GetCapability
    pub const GET_CAPABILITY: u32 = 0x017A;
    /// TPM2_GetRandom
    pub const GET_RANDOM: u32 = 0x017B;
    /// TPM2_PCR_Read
    pub const PCR_READ: u32 = 0x017E;
    /// TPM2_PCR_Extend
    pub const PCR_EXTEND: u32 = 0x0182;
}

/// TPM 1.2 command ordinals.
pub mod ord {
    /// TPM_OIAP
    pub const OIAP: u32 = 0x0A;
    /// TPM_Extend
    pub const PCR_EXTEND: u32 = 0x14;
    /// TPM_PCRRead
    pub const PCR_READ: u32 = 0x15;
    /// TPM_Seal
    pub const SEAL: u32 = 0x17;
    /// TPM_Unseal
    pub const UNSEAL: u32 = 0x18;
    /// TPM_GetRandom
    pub const GET_RANDOM: u32 = 0x46;
    /// TPM_SelfTestFull
    pub const SELF_TEST_FULL: u32 = 0x50;
    /// TPM_ContinueSelfTest
    pub const CONTINUE_SELF_TEST: u32 = 0x53;
    /// TPM_GetCapability
    pub const GET_CAPABILITY: u32 = 0x65;
    /// TPM_Startup
    pub const STARTUP: u32 = 0x99;
}

/// Return codes the transport inspects.
pub mod rc {
    /// Command completed.
    pub const SUCCESS: u32 = 0;
    /// TPM 2.0: command not processed, resubmit after a delay.
    pub const RETRY: u32 = 0x922;
    /// TPM 2.0: self-test still running, command not processed.
    pub const TESTING: u32 = 0x90A;
    /// TPM 2.0: command code not supported by this chip.
    pub const COMMAND_CODE: u32 = 0x143;
    /// Resource-manager layer marker ORed into synthesized return codes so
    /// callers can tell them from codes the chip itself produced.
    pub const LAYER_RESMGR: u32 = 0x000B_0000;
    /// TPM 1.2: chip is deactivated.
    pub const TPM1_DEACTIVATED: u32 = 6;
    /// TPM 1.2: chip is disabled.
    pub const TPM1_DISABLED: u32 = 7;
}
