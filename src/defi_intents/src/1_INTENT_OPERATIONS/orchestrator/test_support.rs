//! In-memory ledger and clock for orchestrator tests

use async_trait::async_trait;
use candid::Nat;
use futures::channel::oneshot;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::infrastructure::{Clock, OrchestratorConfig};
use crate::types::{Address, CallFunction, ContractCall, SubmitOptions, TxRef};
use crate::_2_CHAIN_STATE::ledger::{Confirmation, LedgerClient, LedgerError, LedgerResult};
use super::{lock, IntentOrchestrator};

pub(crate) const START: u64 = 1_700_000_000;

pub(crate) fn addr(last: u8) -> Address {
    format!("0x{:040x}", last).parse().unwrap()
}

pub(crate) fn usdt() -> Address {
    addr(0xa1)
}

pub(crate) fn wbtc() -> Address {
    addr(0xa2)
}

pub(crate) fn kdia() -> Address {
    addr(0xa3)
}

pub(crate) fn vault() -> Address {
    addr(0xd1)
}

pub(crate) fn staking() -> Address {
    addr(0xd2)
}

pub(crate) fn router() -> Address {
    addr(0xfe)
}

pub(crate) fn pair() -> Address {
    addr(0xf1)
}

pub(crate) fn user() -> Address {
    addr(0x11)
}

/// `whole` tokens at 18 decimals
pub(crate) fn units(whole: u64) -> Nat {
    Nat::from(whole as u128 * 1_000_000_000_000_000_000u128)
}

pub(crate) const CONFIG: &str = r#"{
    "network": "test",
    "tokens": [
        { "symbol": "USDT", "address": "0x00000000000000000000000000000000000000a1", "decimals": 18 },
        { "symbol": "WBTC", "address": "0x00000000000000000000000000000000000000a2", "decimals": 8 },
        { "symbol": "KDIA", "address": "0x00000000000000000000000000000000000000a3", "decimals": 18 }
    ],
    "deposit": { "token": "USDT", "contract": "0x00000000000000000000000000000000000000d1" },
    "stake": { "token": "KDIA", "contract": "0x00000000000000000000000000000000000000d2" },
    "claim": { "contract": "0x00000000000000000000000000000000000000d1", "reward_token": "KDIA" },
    "swap": {
        "router": "0x00000000000000000000000000000000000000fe",
        "buy_path": ["USDT", "WBTC", "KDIA"],
        "sell_path": ["KDIA", "WBTC", "USDT"],
        "price_pair": {
            "pair": "0x00000000000000000000000000000000000000f1",
            "base_token": "KDIA",
            "bridge_token": "WBTC",
            "quote_token": "USDT"
        }
    }
}"#;

pub(crate) fn test_config() -> OrchestratorConfig {
    OrchestratorConfig::from_json(CONFIG).unwrap()
}

#[derive(Default)]
pub(crate) struct LedgerState {
    pub balances: HashMap<Address, Nat>,
    /// Keyed by `(token, spender)`
    pub allowances: HashMap<(Address, Address), Nat>,
    /// Router answer; `None` echoes the input at every hop
    pub quote_amounts: Option<Vec<Nat>>,
    pub quote_calls: usize,
    pub reserves: (Nat, Nat),
    pub gas_estimate: u64,
    pub fail_allowance_reads: bool,
    pub allowance_reads: usize,
    pub submit_failures: VecDeque<LedgerError>,
    pub submitted: Vec<(ContractCall, SubmitOptions)>,
    calls: HashMap<TxRef, ContractCall>,
    /// Token pulled by each funding contract
    funding: HashMap<Address, Address>,
    hold_confirmations: bool,
    waiting: VecDeque<oneshot::Sender<Confirmation>>,
    /// Outcomes released before anyone was waiting for them
    released: VecDeque<Confirmation>,
    /// Outcome of the next unheld confirmation
    pub revert_next: Option<Option<String>>,
}

pub(crate) struct MockLedger {
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        let mut state = LedgerState {
            gas_estimate: 100_000,
            ..Default::default()
        };
        state.funding.insert(vault(), usdt());
        state.funding.insert(staking(), kdia());
        Self { state: Mutex::new(state) }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut LedgerState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub fn set_balance(&self, token: Address, amount: Nat) {
        self.with(|s| s.balances.insert(token, amount));
    }

    pub fn set_allowance(&self, token: Address, spender: Address, amount: Nat) {
        self.with(|s| s.allowances.insert((token, spender), amount));
    }

    pub fn set_quote(&self, amounts: Vec<Nat>) {
        self.with(|s| s.quote_amounts = Some(amounts));
    }

    pub fn submitted(&self) -> Vec<(ContractCall, SubmitOptions)> {
        self.with(|s| s.submitted.clone())
    }

    /// Confirmations stay pending until `confirm_next`
    pub fn hold_confirmations(&self) {
        self.with(|s| s.hold_confirmations = true);
    }

    /// Resolve the oldest held confirmation, or the next one to be awaited
    pub fn confirm_next(&self, outcome: Confirmation) {
        let sender = self.with(|s| {
            let sender = s.waiting.pop_front();
            if sender.is_none() {
                s.released.push_back(outcome.clone());
            }
            sender
        });
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }

    fn apply_effects(&self, tx: &TxRef) {
        self.with(|s| {
            let Some(call) = s.calls.get(tx).cloned() else {
                return;
            };
            match call.function {
                CallFunction::Approve { spender, amount } => {
                    s.allowances.insert((call.to, spender), amount);
                }
                CallFunction::Deposit { amount } | CallFunction::Stake { amount } => {
                    if let Some(token) = s.funding.get(&call.to).cloned() {
                        debit(&mut s.balances, &token, &amount);
                        let allowance = s.allowances.entry((token, call.to)).or_insert_with(|| Nat::from(0u64));
                        if *allowance >= amount {
                            *allowance = Nat(allowance.0.clone() - amount.0.clone());
                        }
                    }
                }
                CallFunction::ClaimRewards => {
                    let reward = s.balances.entry(kdia()).or_insert_with(|| Nat::from(0u64));
                    *reward = Nat(reward.0.clone() + units(1).0);
                }
                CallFunction::SwapExactTokensForTokens { amount_in, amount_out_min, path, .. } => {
                    if let (Some(input), Some(output)) = (path.first(), path.last()) {
                        debit(&mut s.balances, input, &amount_in);
                        let out = s.balances.entry(output.clone()).or_insert_with(|| Nat::from(0u64));
                        *out = Nat(out.0.clone() + amount_out_min.0);
                    }
                }
            }
        });
    }
}

fn debit(balances: &mut HashMap<Address, Nat>, token: &Address, amount: &Nat) {
    if let Some(balance) = balances.get_mut(token) {
        if *balance >= *amount {
            *balance = Nat(balance.0.clone() - amount.0.clone());
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn read_allowance(&self, _holder: &Address, spender: &Address, token: &Address) -> LedgerResult<Nat> {
        self.with(|s| {
            s.allowance_reads += 1;
            if s.fail_allowance_reads {
                return Err(LedgerError::transport("allowance call timed out"));
            }
            Ok(s.allowances.get(&(token.clone(), spender.clone())).cloned().unwrap_or_else(|| Nat::from(0u64)))
        })
    }

    async fn read_balance(&self, _holder: &Address, token: &Address) -> LedgerResult<Nat> {
        Ok(self.with(|s| s.balances.get(token).cloned().unwrap_or_else(|| Nat::from(0u64))))
    }

    async fn read_quote(&self, _router: &Address, path: &[Address], amount_in: &Nat) -> LedgerResult<Vec<Nat>> {
        Ok(self.with(|s| {
            s.quote_calls += 1;
            s.quote_amounts
                .clone()
                .unwrap_or_else(|| vec![amount_in.clone(); path.len()])
        }))
    }

    async fn read_reserves(&self, _pair: &Address) -> LedgerResult<(Nat, Nat)> {
        Ok(self.with(|s| s.reserves.clone()))
    }

    async fn estimate_gas(&self, _call: &ContractCall) -> LedgerResult<u64> {
        Ok(self.with(|s| s.gas_estimate))
    }

    async fn submit(&self, call: &ContractCall, options: SubmitOptions) -> LedgerResult<TxRef> {
        self.with(|s| {
            if let Some(err) = s.submit_failures.pop_front() {
                return Err(err);
            }
            s.submitted.push((call.clone(), options));
            let tx = TxRef(format!("0x{:064x}", s.submitted.len()));
            s.calls.insert(tx.clone(), call.clone());
            Ok(tx)
        })
    }

    async fn await_confirmation(&self, tx: &TxRef) -> LedgerResult<Confirmation> {
        let pending = self.with(|s| {
            if s.hold_confirmations {
                if let Some(outcome) = s.released.pop_front() {
                    return Ok(outcome);
                }
                let (sender, receiver) = oneshot::channel();
                s.waiting.push_back(sender);
                Err(receiver)
            } else {
                Ok(match s.revert_next.take() {
                    Some(reason) => Confirmation::Reverted { reason },
                    None => Confirmation::Confirmed,
                })
            }
        });

        let outcome = match pending {
            Ok(outcome) => outcome,
            Err(receiver) => receiver
                .await
                .map_err(|_| LedgerError::transport("confirmation channel closed"))?,
        };

        if outcome == Confirmation::Confirmed {
            self.apply_effects(tx);
        }
        Ok(outcome)
    }
}

/// Settable clock; sleeps never finish unless timeouts are made instant
pub(crate) struct ManualClock {
    now: AtomicU64,
    instant_timeouts: AtomicBool,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
            instant_timeouts: AtomicBool::new(false),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn expire_timeouts(&self) {
        self.instant_timeouts.store(true, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        if self.instant_timeouts.load(Ordering::SeqCst) {
            future::ready(()).boxed()
        } else {
            future::pending().boxed()
        }
    }
}

pub(crate) struct Harness {
    pub orchestrator: IntentOrchestrator,
    pub ledger: Arc<MockLedger>,
    pub clock: Arc<ManualClock>,
}

pub(crate) fn harness() -> Harness {
    let ledger = Arc::new(MockLedger::new());
    let clock = Arc::new(ManualClock::new(START));
    let orchestrator = IntentOrchestrator::new(test_config(), ledger.clone(), clock.clone(), user()).unwrap();
    Harness { orchestrator, ledger, clock }
}
