//! Post-terminal refresh of dependent chain state
//!
//! An intent declares which balances and allowances its success changes.
//! Once it reaches a terminal state those targets are re-read in parallel and
//! written into the `ChainSnapshot` the UI displays. A failed re-read drops the
//! entry instead of leaving a stale value behind.

use candid::Nat;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};
use crate::infrastructure::Result;
use crate::types::Address;
use super::ledger::LedgerClient;
use super::read_with_retries;

/// A piece of chain state an intent's success invalidates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvalidationTarget {
    Balance { token: Address },
    Allowance { token: Address, spender: Address },
}

impl fmt::Display for InvalidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationTarget::Balance { token } => write!(f, "balance({})", token.short()),
            InvalidationTarget::Allowance { token, spender } => {
                write!(f, "allowance({} -> {})", token.short(), spender.short())
            }
        }
    }
}

/// Last known balances and allowances of the connected user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSnapshot {
    pub balances: BTreeMap<Address, Nat>,
    /// Keyed by `(token, spender)`
    pub allowances: BTreeMap<(Address, Address), Nat>,
    /// Number of refresh rounds applied so far
    pub generation: u64,
}

impl ChainSnapshot {
    pub fn balance(&self, token: &Address) -> Option<&Nat> {
        self.balances.get(token)
    }

    pub fn allowance(&self, token: &Address, spender: &Address) -> Option<&Nat> {
        self.allowances.get(&(token.clone(), spender.clone()))
    }

    pub fn set(&mut self, target: &InvalidationTarget, value: Nat) {
        match target {
            InvalidationTarget::Balance { token } => {
                self.balances.insert(token.clone(), value);
            }
            InvalidationTarget::Allowance { token, spender } => {
                self.allowances.insert((token.clone(), spender.clone()), value);
            }
        }
    }

    pub fn forget(&mut self, target: &InvalidationTarget) {
        match target {
            InvalidationTarget::Balance { token } => {
                self.balances.remove(token);
            }
            InvalidationTarget::Allowance { token, spender } => {
                self.allowances.remove(&(token.clone(), spender.clone()));
            }
        }
    }

    /// Fold one refresh round into the snapshot
    pub fn apply(&mut self, results: Vec<(InvalidationTarget, Result<Nat>)>) {
        for (target, result) in results {
            match result {
                Ok(value) => self.set(&target, value),
                Err(_) => self.forget(&target),
            }
        }
        self.generation += 1;
    }
}

/// Read one target fresh from the ledger
pub async fn read_target(
    ledger: &dyn LedgerClient,
    holder: &Address,
    target: &InvalidationTarget,
    retries: u8,
) -> Result<Nat> {
    match target {
        InvalidationTarget::Balance { token } => {
            read_with_retries("balance", retries, move || ledger.read_balance(holder, token)).await
        }
        InvalidationTarget::Allowance { token, spender } => {
            read_with_retries("allowance", retries, move || ledger.read_allowance(holder, spender, token)).await
        }
    }
}

/// Re-read every target once, in parallel
///
/// Each target is read exactly once per call, duplicates included only once.
pub async fn refresh_targets(
    ledger: &dyn LedgerClient,
    holder: &Address,
    targets: &[InvalidationTarget],
    retries: u8,
) -> Vec<(InvalidationTarget, Result<Nat>)> {
    let mut unique: Vec<InvalidationTarget> = targets.to_vec();
    unique.sort();
    unique.dedup();

    info!("🔄 Refreshing {} chain values for {}", unique.len(), holder.short());

    let reads = unique.iter().map(|target| read_target(ledger, holder, target, retries));
    let results = join_all(reads).await;

    unique
        .into_iter()
        .zip(results)
        .inspect(|(target, result)| {
            if let Err(e) = result {
                warn!("⚠️ Could not refresh {}: {}", target, e);
            }
        })
        .collect()
}
