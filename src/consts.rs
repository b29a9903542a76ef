pub const DEFAULT_WIDTH: u16 = 1000;
pub const DEFAULT_HEIGHT: u16 = 600;

/// Highest palette index a nibble can carry in the snapshot.
pub const MAX_PALETTE_LIMIT: u8 = 15;
pub const DEFAULT_PALETTE_LIMIT: u8 = MAX_PALETTE_LIMIT;

/// x (u16 BE) + y (u16 BE) + color (u8)
pub const UPDATE_LEN: usize = 5;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = UPDATE_LEN;

pub const DEFAULT_OUTBOUND_QUEUE: usize = 1024;
pub const DEFAULT_BIND: &str = "127.0.0.1:2895";
