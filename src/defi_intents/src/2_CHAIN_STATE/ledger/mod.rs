//! # Ledger Client
//!
//! The only door to the chain. Reads are idempotent and safe to retry;
//! `submit` is a write and is never called twice for the same step.
//!
//! Implementations wrap an RPC provider plus a signer. Encoding calls to ABI,
//! nonce management and wallet prompts all live behind this trait.

use async_trait::async_trait;
use candid::Nat;
use std::fmt;
use crate::types::{Address, ContractCall, SubmitOptions, TxRef};

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Provider or network failure
    Transport { reason: String },
    /// Signer refused the request
    UserDeclined,
}

impl LedgerError {
    pub fn transport(reason: impl Into<String>) -> Self {
        LedgerError::Transport { reason: reason.into() }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Transport { reason } => write!(f, "transport error: {}", reason),
            LedgerError::UserDeclined => write!(f, "user declined"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Final state of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Reverted { reason: Option<String> },
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// ERC-20 `allowance(holder, spender)`
    async fn read_allowance(&self, holder: &Address, spender: &Address, token: &Address) -> LedgerResult<Nat>;

    /// ERC-20 `balanceOf(holder)`
    async fn read_balance(&self, holder: &Address, token: &Address) -> LedgerResult<Nat>;

    /// Router `getAmountsOut(amount_in, path)`: one amount per path entry,
    /// the last one being the output
    async fn read_quote(&self, router: &Address, path: &[Address], amount_in: &Nat) -> LedgerResult<Vec<Nat>>;

    /// Pair `getReserves()` as `(reserve0, reserve1)`
    async fn read_reserves(&self, pair: &Address) -> LedgerResult<(Nat, Nat)>;

    async fn estimate_gas(&self, call: &ContractCall) -> LedgerResult<u64>;

    /// Hand the call to the signer and broadcast it
    async fn submit(&self, call: &ContractCall, options: SubmitOptions) -> LedgerResult<TxRef>;

    /// Resolves once the transaction is mined
    async fn await_confirmation(&self, tx: &TxRef) -> LedgerResult<Confirmation>;
}
