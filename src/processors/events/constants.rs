// Event names emitted by the factory and pair contracts
pub const PAIR_CREATED_EVENT: &str = "PairCreated";
pub const TRANSFER_EVENT: &str = "Transfer";
pub const SYNC_EVENT: &str = "Sync";
pub const MINT_EVENT: &str = "Mint";
pub const BURN_EVENT: &str = "Burn";
pub const SWAP_EVENT: &str = "Swap";

pub const ADDRESS_ZERO: &str = "0x0000000000000000000000000000000000000000";

// Snapshot granularity
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const SECONDS_PER_HOUR: i64 = 3_600;
