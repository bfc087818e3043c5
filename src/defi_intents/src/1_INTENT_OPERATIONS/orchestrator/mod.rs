//! # Intent Orchestrator
//!
//! Entry point for the UI layer. Builds intents from user input, drives them
//! through the ledger client one step at a time, and keeps the displayed
//! balances, allowances and form state in line with the chain.
//!
//! ## Flow
//! 1. `build_intent`: parse, read balance/allowance/quote, assemble steps
//! 2. `submit_intent`: take the `(user, kind)` slot and return a status stream
//! 3. The stream submits each step, waits for its confirmation, and advances
//! 4. On a terminal state: refresh declared targets, reset the form, free the slot
//!
//! ## Guarantees
//! - Build-time failures never reach the write path
//! - A step is submitted at most once; only the user can retry
//! - Every terminal state returns the form to an idle, re-submittable state

mod intent_builder;
mod submission;

#[cfg(test)]
pub(crate) mod test_support;

use futures::stream::BoxStream;
use futures::task::AtomicWaker;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tracing::info;
use crate::infrastructure::{Clock, InFlightRegistry, OrchestratorConfig, Result, IntentError, SystemError};
use crate::types::{Address, IntentKind, StatusUpdate, SwapDirection, TokenAmount};
use crate::_1_INTENT_OPERATIONS::intent::{IntentState, TransactionIntent};
use crate::_2_CHAIN_STATE::ledger::LedgerClient;
use crate::_2_CHAIN_STATE::refresh::{refresh_targets, ChainSnapshot, InvalidationTarget};
use crate::_3_ROUTE_QUOTES::quotes::QuoteEngine;
use crate::_3_ROUTE_QUOTES::reserves::reserve_cross_rate;
use crate::_4_TRADING_EXECUTION::slippage::SlippageTolerance;
use crate::_5_INFORMATIONAL::display::FormState;

/// Lock that survives a panic in another holder
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

/// Shared cancellation flag for one intent
///
/// Takes effect at the next step boundary, or at once while a confirmation
/// is being awaited. A broadcast transaction is not recalled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<CancelState>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.waker.wake();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called
    pub fn cancelled(&self) -> Cancelled {
        Cancelled { token: self.clone() }
    }
}

pub struct Cancelled {
    token: CancelToken,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }
        self.token.state.waker.register(cx.waker());
        if self.token.is_cancelled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// UI-side reference to a built intent
#[derive(Debug, Clone)]
pub struct IntentHandle {
    pub id: String,
    pub kind: IntentKind,
    intent: Arc<Mutex<TransactionIntent>>,
    cancel: CancelToken,
}

impl IntentHandle {
    fn new(intent: TransactionIntent) -> Self {
        Self {
            id: intent.id.clone(),
            kind: intent.kind,
            intent: Arc::new(Mutex::new(intent)),
            cancel: CancelToken::default(),
        }
    }

    pub fn status(&self) -> StatusUpdate {
        lock(&self.intent).status()
    }

    pub fn state(&self) -> IntentState {
        lock(&self.intent).state().clone()
    }

    /// Copy of the intent as it stands now
    pub fn snapshot(&self) -> TransactionIntent {
        lock(&self.intent).clone()
    }

    pub fn cancel(&self) {
        info!("🛑 Cancel requested for {}", self.id);
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub(crate) fn with_intent<R>(&self, f: impl FnOnce(&mut TransactionIntent) -> R) -> R {
        f(&mut lock(&self.intent))
    }
}

pub(crate) struct OrchestratorInner {
    pub(crate) config: Arc<OrchestratorConfig>,
    pub(crate) ledger: Arc<dyn LedgerClient>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) user: Address,
    registry: InFlightRegistry,
    snapshot: Mutex<ChainSnapshot>,
    forms: Mutex<HashMap<IntentKind, FormState>>,
    next_id: AtomicU64,
}

impl OrchestratorInner {
    pub(crate) fn retries(&self) -> u8 {
        self.config.read_retries
    }

    pub(crate) fn quote_engine(&self) -> QuoteEngine<'_> {
        QuoteEngine::new(self.ledger.as_ref(), &self.config.swap.router, self.retries())
    }

    pub(crate) fn update_form(&self, kind: IntentKind, f: impl FnOnce(&mut FormState)) {
        f(lock(&self.forms).entry(kind).or_default());
    }

    pub(crate) async fn refresh(&self, targets: &[InvalidationTarget]) {
        if targets.is_empty() {
            return;
        }
        let results = refresh_targets(self.ledger.as_ref(), &self.user, targets, self.retries()).await;
        lock(&self.snapshot).apply(results);
    }

    fn next_intent_id(&self, kind: IntentKind) -> String {
        format!("{}-{}", kind, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Orchestrates intents for one connected user
#[derive(Clone)]
pub struct IntentOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl IntentOrchestrator {
    /// Validate `config` and bind it to a ledger client, a clock and a user
    ///
    /// Confirmation timeouts run on `clock`. `SystemClock` works on any
    /// executor; a custom clock must resolve its sleeps on the host's own.
    pub fn new(
        config: OrchestratorConfig,
        ledger: Arc<dyn LedgerClient>,
        clock: Arc<dyn Clock>,
        user: Address,
    ) -> Result<Self> {
        config.validate()?;
        info!("🚀 Orchestrator ready on {} for {}", config.network, user.short());

        Ok(Self {
            inner: Arc::new(OrchestratorInner {
                config: Arc::new(config),
                ledger,
                clock,
                user,
                registry: InFlightRegistry::new(),
                snapshot: Mutex::new(ChainSnapshot::default()),
                forms: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub fn user(&self) -> &Address {
        &self.inner.user
    }

    /// Build an intent of `kind` from the user's amount text
    ///
    /// `amount` is ignored for claims. `direction` only applies to swaps and
    /// defaults to buying.
    pub async fn build_intent(
        &self,
        kind: IntentKind,
        amount: &str,
        direction: Option<SwapDirection>,
    ) -> Result<IntentHandle> {
        match kind {
            IntentKind::Swap => self.build_swap(amount, direction.unwrap_or_default(), None).await,
            _ => self.finish_build(kind, amount, None).await,
        }
    }

    /// Swap build with an explicit slippage floor instead of the configured one
    pub async fn build_swap(
        &self,
        amount: &str,
        direction: SwapDirection,
        tolerance: Option<SlippageTolerance>,
    ) -> Result<IntentHandle> {
        self.finish_build(IntentKind::Swap, amount, Some((direction, tolerance))).await
    }

    async fn finish_build(
        &self,
        kind: IntentKind,
        amount: &str,
        swap: Option<(SwapDirection, Option<SlippageTolerance>)>,
    ) -> Result<IntentHandle> {
        let id = self.inner.next_intent_id(kind);
        info!("🧱 Building {} for {}", id, self.inner.user.short());

        let built = match (kind, swap) {
            (IntentKind::Deposit, _) => {
                intent_builder::build_funding_intent(&self.inner, id, kind, &self.inner.config.deposit, amount).await
            }
            (IntentKind::Stake, _) => {
                intent_builder::build_funding_intent(&self.inner, id, kind, &self.inner.config.stake, amount).await
            }
            (IntentKind::Claim, _) => intent_builder::build_claim_intent(&self.inner, id),
            (IntentKind::Swap, swap) => {
                let (direction, tolerance) = swap.unwrap_or_default();
                intent_builder::build_swap_intent(&self.inner, id, amount, direction, tolerance).await
            }
        };

        let mut intent = match built {
            Ok(intent) => intent,
            Err(e) => {
                info!("⚠️ {} build rejected: {}", kind, e);
                return Err(e);
            }
        };
        intent.ready()?;

        let input = intent.amount.as_ref().map(TokenAmount::to_display_string).unwrap_or_default();
        self.inner.update_form(kind, |form| form.input = input);

        info!(
            "✅ Built {} with {} step(s), status {:?}",
            intent.id,
            intent.steps().len(),
            intent.status()
        );
        Ok(IntentHandle::new(intent))
    }

    /// Start driving `handle` and observe its progress
    ///
    /// Fails with `OperationInProgress` while another intent of the same kind
    /// is in flight for this user, and with `IntentTerminal` for an intent that
    /// already finished. A failed intent whose step never reached the chain is
    /// re-armed and resumes from that step.
    pub fn submit_intent(&self, handle: &IntentHandle) -> Result<BoxStream<'static, StatusUpdate>> {
        let guard = self.inner.registry.acquire(&self.inner.user, handle.kind)?;

        handle.with_intent(|intent| -> Result<()> {
            let state = intent.state().clone();
            match state {
                IntentState::Failed(_) => intent.reopen_for_retry(),
                state if state.is_terminal() => Err(IntentError::System(SystemError::IntentTerminal {
                    intent_id: intent.id.clone(),
                    state: state.to_string(),
                })),
                _ => Ok(()),
            }
        })?;

        info!("📤 Submitting {}", handle.id);
        Ok(submission::status_stream(self.inner.clone(), handle.clone(), guard))
    }

    /// One-unit price along the swap path in `direction`. Display only.
    pub async fn price_estimate(&self, direction: SwapDirection) -> Result<Decimal> {
        let path = self.inner.config.swap_path(direction)?;
        self.inner.quote_engine().price_estimate(&path, self.inner.clock.now_secs()).await
    }

    /// Reserve-based price of the configured base token. Display only.
    pub async fn display_price(&self) -> Result<Decimal> {
        let config = &self.inner.config;
        let pair = config
            .swap
            .price_pair
            .as_ref()
            .ok_or_else(|| IntentError::invalid_config("swap.price_pair", "not configured"))?;
        let base = config.token(&pair.base_token)?;
        let bridge_path = config.price_bridge_path()?;
        let engine = self.inner.quote_engine();

        reserve_cross_rate(
            self.inner.ledger.as_ref(),
            &engine,
            &pair.pair,
            base,
            pair.base_is_token0,
            &bridge_path,
            self.inner.retries(),
            self.inner.clock.now_secs(),
        )
        .await
    }

    /// Re-read every balance and allowance the orchestrator tracks
    pub async fn refresh_all(&self) {
        let config = &self.inner.config;
        let mut targets: Vec<InvalidationTarget> = config
            .tokens
            .iter()
            .map(|t| InvalidationTarget::Balance { token: t.address.clone() })
            .collect();
        for (symbol, spender) in [
            (&config.deposit.token, &config.deposit.contract),
            (&config.stake.token, &config.stake.contract),
        ] {
            if let Ok(token) = config.token(symbol) {
                targets.push(InvalidationTarget::Allowance { token: token.address.clone(), spender: spender.clone() });
            }
        }
        if let Ok(path) = config.swap_path(SwapDirection::Buy) {
            targets.push(InvalidationTarget::Allowance {
                token: path.input().address.clone(),
                spender: config.swap.router.clone(),
            });
        }

        self.inner.refresh(&targets).await;
    }

    pub fn form(&self, kind: IntentKind) -> FormState {
        lock(&self.inner.forms).get(&kind).cloned().unwrap_or_default()
    }

    pub fn chain_snapshot(&self) -> ChainSnapshot {
        lock(&self.inner.snapshot).clone()
    }

    pub fn is_in_flight(&self, kind: IntentKind) -> bool {
        self.inner.registry.is_active(&self.inner.user, kind)
    }
}
