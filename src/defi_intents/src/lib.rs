//! DeFi Intents - Transaction Orchestration with Numbered Zones
//!
//! Turns a user's amount into a short sequence of on-chain steps (exact
//! approval, then the action), submits them one at a time through a
//! [`LedgerClient`], and keeps balances, allowances and form state in line
//! with what the chain confirmed.
//!
//! Architecture:
//! 1_INTENT_OPERATIONS - Intent state machine and orchestrator (only write path)
//! 2_CHAIN_STATE - Ledger client seam, retried reads, post-terminal refresh
//! 3_ROUTE_QUOTES - Swap paths, router quotes, reserve-based display price
//! 4_TRADING_EXECUTION - Approvals, slippage bound, swap call, gas buffer
//! 5_INFORMATIONAL - Status labels and form state
//! 6_INFRASTRUCTURE - Config, errors, math, clock, in-flight registry

// Import numbered modules with explicit paths
#[path = "1_INTENT_OPERATIONS/mod.rs"]
pub mod intent_operations_1;
use intent_operations_1 as _1_INTENT_OPERATIONS;

#[path = "2_CHAIN_STATE/mod.rs"]
pub mod chain_state_2;
use chain_state_2 as _2_CHAIN_STATE;

#[path = "3_ROUTE_QUOTES/mod.rs"]
pub mod route_quotes_3;
use route_quotes_3 as _3_ROUTE_QUOTES;

#[path = "4_TRADING_EXECUTION/mod.rs"]
pub mod trading_execution_4;
use trading_execution_4 as _4_TRADING_EXECUTION;

#[path = "5_INFORMATIONAL/mod.rs"]
pub mod informational_5;
use informational_5 as _5_INFORMATIONAL;

#[path = "6_INFRASTRUCTURE/mod.rs"]
pub mod infrastructure_6;
use infrastructure_6 as infrastructure;

pub mod types;

// ===== PUBLIC API =====

pub use _1_INTENT_OPERATIONS::intent::{IntentState, Step, StepOutcome, StepRole, TransactionIntent};
pub use _1_INTENT_OPERATIONS::orchestrator::{CancelToken, IntentHandle, IntentOrchestrator};
pub use _2_CHAIN_STATE::ledger::{Confirmation, LedgerClient, LedgerError, LedgerResult};
pub use _2_CHAIN_STATE::refresh::{ChainSnapshot, InvalidationTarget};
pub use _3_ROUTE_QUOTES::quotes::{Quote, QuoteEngine};
pub use _3_ROUTE_QUOTES::routes::{PricePairConfig, SwapPath, SwapRouteConfig};
pub use _4_TRADING_EXECUTION::approvals::{AllowanceGuard, AllowanceState};
pub use _4_TRADING_EXECUTION::slippage::{minimum_out, SlippageTolerance};
pub use _5_INFORMATIONAL::display::{status_label, status_tone, FormState, Tone};
pub use infrastructure::{
    ActionTarget, ClaimTarget, Clock, IntentError, OrchestratorConfig, Result, SystemClock,
};
pub use types::{
    Address, CallFunction, ContractCall, FailureReason, IntentKind, StatusUpdate, SubmitOptions,
    SwapDirection, Token, TokenAmount, TxRef,
};
