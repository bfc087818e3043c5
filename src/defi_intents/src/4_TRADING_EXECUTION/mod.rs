//! # Trading Execution Module
//!
//! Builds the write-side calls of an intent from state already read.
//!
//! ## Architecture
//! - **approvals/**: `AllowanceGuard` and exact-amount approval steps
//! - **slippage/**: `SlippageTolerance` and the minimum-out bound
//! - **swaps/**: router call construction from a fresh quote
//! - **gas/**: gas-limit buffer for primary steps
//!
//! ## Key Constraints
//! - **Exact approvals**: never approve more than the step spends
//! - **Integer bounds**: minimum out and gas buffers are integer arithmetic
//! - **No submission here**: this zone only builds calls; the orchestrator
//!   decides when a call reaches the ledger client

pub mod approvals;
pub mod gas;
pub mod slippage;
pub mod swaps;
