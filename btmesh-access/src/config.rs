//! Runtime-tunable bounds, standing in for the original's `CONFIG_BT_MESH_*`
//! Kconfig knobs. Capacity bounds that the original hard-codes at compile
//! time via const generics stay const generics here (they size on-stack
//! arenas); bounds that are genuinely policy knobs become fields here.

/// Maximum access-layer SDU length before a 4-byte MIC is appended,
/// mirroring `BT_MESH_TX_SDU_MAX` / `BT_MESH_RX_SDU_MAX` sizing in the
/// original transport/access boundary.
pub const MAX_SDU: usize = 380;

/// Size of the MIC reserved when producing non-partial composition pages.
pub const MIC_LEN: usize = 4;

/// Opcode byte that is always rejected (`0x7F`, reserved by the spec).
pub const RESERVED_OPCODE: u8 = 0x7F;

/// Randomized-delay windows for publication, in milliseconds.
pub const RANDOM_DELAY_SHORT_MS: u32 = 30;
pub const RANDOM_DELAY_LONG_MS: u32 = 480;
pub const RANDOM_DELAY_BASE_MS: u32 = 20;

#[derive(Copy, Clone, Debug)]
pub struct Config {
    /// Honor strict company-id filtering for vendor opcode lookups
    /// (`CONFIG_BT_MESH_MODEL_VND_MSG_CID_FORCE`).
    pub vendor_cid_strict: bool,
    /// Whether the node advertises the relay feature bit.
    pub relay: bool,
    pub proxy: bool,
    pub friend: bool,
    pub low_power: bool,
    /// Which composition/metadata pages this build serves (`page1.rs` §3,
    /// `wire.rs` §6); mirrors the corresponding Cargo features rather than
    /// being independently configurable at runtime.
    pub page1: bool,
    pub page2: bool,
    pub high_pages: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor_cid_strict: true,
            relay: cfg!(feature = "relay"),
            proxy: cfg!(feature = "proxy"),
            friend: cfg!(feature = "friend"),
            low_power: cfg!(feature = "low_power"),
            page1: cfg!(feature = "page1"),
            page2: cfg!(feature = "page2"),
            high_pages: cfg!(feature = "high_pages"),
        }
    }
}
