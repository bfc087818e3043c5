//! # ERC-20 Approval Module
//!
//! Decides whether a spender needs an allowance before the primary call and
//! builds the approval step when it does.
//!
//! ## Approval Flow
//! 1. Read the holder's current allowance for the spender (fresh, every build)
//! 2. `current < required` means an approval step is prepended
//! 3. The approval covers exactly `required`, never an unlimited amount
//!
//! ## Safety
//! - A failed allowance read fails the build with `StateUnavailable`;
//!   sufficiency is never assumed
//! - Comparison is on integer base units, no rounding anywhere

use candid::Nat;
use tracing::{debug, info};
use crate::infrastructure::Result;
use crate::types::{Address, CallFunction, ContractCall, Token, TokenAmount};
use crate::_1_INTENT_OPERATIONS::intent::{Step, StepRole};
use crate::_2_CHAIN_STATE::ledger::LedgerClient;
use crate::_2_CHAIN_STATE::read_with_retries;

/// Allowance as read for one intent build. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceState {
    pub holder: Address,
    pub spender: Address,
    pub token: Token,
    pub current: Nat,
}

impl AllowanceState {
    pub fn covers(&self, required: &Nat) -> bool {
        &self.current >= required
    }
}

pub struct AllowanceGuard<'a> {
    ledger: &'a dyn LedgerClient,
    retries: u8,
}

impl<'a> AllowanceGuard<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, retries: u8) -> Self {
        Self { ledger, retries }
    }

    /// Read the current allowance
    pub async fn check(&self, holder: &Address, spender: &Address, token: &Token) -> Result<AllowanceState> {
        let ledger = self.ledger;
        let token_address = &token.address;
        let current = read_with_retries("allowance", self.retries, move || {
            ledger.read_allowance(holder, spender, token_address)
        })
        .await?;

        Ok(AllowanceState {
            holder: holder.clone(),
            spender: spender.clone(),
            token: token.clone(),
            current,
        })
    }

    /// `true` iff the current allowance is strictly below `required`
    pub async fn needs_approval(&self, holder: &Address, spender: &Address, required: &TokenAmount) -> Result<bool> {
        let state = self.check(holder, spender, &required.token).await?;
        let needed = !state.covers(&required.magnitude);

        debug!(
            "🔍 Allowance {} for {}: {} (required {}) -> {}",
            required.token.symbol,
            spender.short(),
            state.current.0,
            required.magnitude.0,
            if needed { "approve" } else { "sufficient" }
        );

        Ok(needed)
    }
}

/// Exact-amount approval of `required` for `spender`
pub fn build_approval_step(spender: &Address, required: &TokenAmount) -> Step {
    info!("📝 Approval step: {} for {}", required, spender.short());

    Step::new(
        StepRole::Approval,
        ContractCall {
            to: required.token.address.clone(),
            function: CallFunction::Approve {
                spender: spender.clone(),
                amount: required.magnitude.clone(),
            },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_is_exact() {
        let token = Token {
            symbol: "USDT".to_string(),
            address: "0x00000000000000000000000000000000000000aa".parse().unwrap(),
            decimals: 18,
        };
        let spender: Address = "0x00000000000000000000000000000000000000bb".parse().unwrap();
        let required = TokenAmount::parse(&token, "10").unwrap();

        let step = build_approval_step(&spender, &required);
        assert_eq!(step.role, StepRole::Approval);
        assert_eq!(step.call.to, token.address);
        assert_eq!(
            step.call.function,
            CallFunction::Approve { spender, amount: Nat::from(10_000_000_000_000_000_000u128) }
        );
    }

    #[test]
    fn test_covers_is_inclusive() {
        let state = AllowanceState {
            holder: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            spender: "0x0000000000000000000000000000000000000002".parse().unwrap(),
            token: Token {
                symbol: "USDT".to_string(),
                address: "0x0000000000000000000000000000000000000003".parse().unwrap(),
                decimals: 6,
            },
            current: Nat::from(5_000_000u64),
        };
        assert!(state.covers(&Nat::from(5_000_000u64)));
        assert!(!state.covers(&Nat::from(10_000_000u64)));
    }
}
