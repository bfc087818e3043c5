//! Deployment defaults
//!
//! Every value here is only a default for `OrchestratorConfig`; deployments
//! override them in their own configuration.

/// Basis-point denominator (100% = 10_000)
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Gas limit = estimate × 1.20
pub const DEFAULT_GAS_LIMIT_MULTIPLIER_BPS: u32 = 12_000;

/// Swaps self-invalidate on-chain 20 minutes after submission
pub const DEFAULT_EXECUTION_DEADLINE_SECS: u64 = 1_200;

/// Accept down to 98% of the quoted output
pub const DEFAULT_SWAP_SLIPPAGE_FLOOR_BPS: u32 = 9_800;

/// Re-quote a swap if its quote is older than this at primary submission
pub const DEFAULT_REQUOTE_AFTER_SECS: u64 = 30;

/// Bounded wait for a single step's confirmation
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;

/// Extra attempts for idempotent chain reads (writes are never retried)
pub const DEFAULT_READ_RETRIES: u8 = 2;

/// Largest magnitude an on-chain uint256 can hold is 2^256 - 1
pub const MAX_ONCHAIN_BITS: u64 = 256;
