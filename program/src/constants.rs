// Autoraffle - Constants

/// Seed prefix for the raffle state PDA, followed by the creator's key
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Seed prefix for the lamport vault PDA, followed by the raffle key
pub const VAULT_SEED: &[u8] = b"vault";

/// Upper bound on entries per round; sizes the raffle account
pub const MAX_PLAYERS: usize = 256;

/// Blocks the oracle waits before answering a request
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;

/// Compute budget the oracle reserves for the fulfilment instruction
pub const DEFAULT_CALLBACK_COMPUTE_LIMIT: u32 = 500_000;

/// Only the first word is consumed by settlement
pub const DEFAULT_NUM_WORDS: u32 = 1;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
