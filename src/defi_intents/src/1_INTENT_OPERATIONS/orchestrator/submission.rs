//! Step execution behind `submit_intent`
//!
//! The status stream is a small driver loop: emit the intent's status when it
//! changes, otherwise perform the one action the current state calls for
//! (submit a step or wait for its confirmation). The intent lock is never
//! held across an await.

use futures::future::{select_all, BoxFuture};
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use crate::infrastructure::{IntentGuard, Result};
use crate::types::{FailureReason, IntentKind, StatusUpdate, SubmitOptions};
use crate::_1_INTENT_OPERATIONS::intent::{IntentState, StepRole, TransactionIntent};
use crate::_2_CHAIN_STATE::ledger::{Confirmation, LedgerError, LedgerResult};
use crate::_2_CHAIN_STATE::read_with_retries;
use crate::_4_TRADING_EXECUTION::approvals::AllowanceGuard;
use crate::_4_TRADING_EXECUTION::gas::apply_gas_multiplier;
use crate::_4_TRADING_EXECUTION::swaps::build_swap_call;
use super::{IntentHandle, OrchestratorInner};

pub(super) fn status_stream(
    inner: Arc<OrchestratorInner>,
    handle: IntentHandle,
    guard: IntentGuard,
) -> BoxStream<'static, StatusUpdate> {
    let input = handle.with_intent(|i| i.amount.as_ref().map(|a| a.to_display_string()).unwrap_or_default());
    inner.update_form(handle.kind, |form| form.begin(&input));

    let run = IntentRun {
        inner,
        handle,
        guard: Some(guard),
        last: None,
        done: false,
    };

    stream::unfold(run, |mut run| async move {
        if run.done {
            return None;
        }
        let status = run.next_status().await;
        run.inner.update_form(run.handle.kind, |form| form.show(run.handle.kind, &status));
        if status.is_terminal() {
            run.finish().await;
            run.done = true;
        }
        Some((status, run))
    })
    .boxed()
}

enum Wake {
    Confirmation(LedgerResult<Confirmation>),
    TimedOut,
    Cancelled,
}

struct IntentRun {
    inner: Arc<OrchestratorInner>,
    handle: IntentHandle,
    guard: Option<IntentGuard>,
    last: Option<StatusUpdate>,
    done: bool,
}

impl IntentRun {
    fn kind(&self) -> IntentKind {
        self.handle.kind
    }

    /// Advance until the user-facing status changes
    async fn next_status(&mut self) -> StatusUpdate {
        if self.last.is_none() {
            self.last = Some(StatusUpdate::Validating);
            return StatusUpdate::Validating;
        }

        loop {
            let current = self.handle.status();
            if current.is_terminal() || self.last.as_ref() != Some(&current) {
                self.last = Some(current.clone());
                return current;
            }
            self.advance().await;
        }
    }

    /// Perform the single action the current state calls for
    async fn advance(&mut self) {
        let state = self.handle.state();

        if self.handle.cancel.is_cancelled() && !state.is_terminal() {
            self.transition("cancel", |i| i.cancel());
            return;
        }

        match state {
            IntentState::Building => self.transition("ready", |i| i.ready()),
            IntentState::AwaitingApprovalSubmit | IntentState::AwaitingPrimarySubmit => self.submit_step().await,
            IntentState::AwaitingApprovalConfirm | IntentState::AwaitingPrimaryConfirm => {
                self.await_confirmation().await
            }
            IntentState::Succeeded | IntentState::Cancelled | IntentState::Failed(_) => {}
        }
    }

    /// Apply a transition; a rejected one fails the intent instead of stalling it
    fn transition(&self, event: &str, f: impl FnOnce(&mut TransactionIntent) -> Result<()>) {
        let id = self.handle.id.clone();
        self.handle.with_intent(|intent| {
            if let Err(e) = f(intent) {
                error!("❌ {} rejected '{}': {}", id, event, e);
                if !intent.state().is_terminal() {
                    let _ = intent.fail(FailureReason::StateUnavailable { reason: e.to_string() });
                }
            }
        });
    }

    fn fail(&self, reason: FailureReason) {
        warn!("⚠️ {} failed: {}", self.handle.id, reason);
        self.transition("fail", |i| i.fail(reason));
    }

    async fn submit_step(&mut self) {
        let role = self.handle.with_intent(|i| i.step_to_submit().map(|s| s.role));
        let Some(role) = role else {
            return;
        };

        if role == StepRole::Primary {
            if !self.allowance_still_covers().await {
                return;
            }
            if self.kind() == IntentKind::Swap && !self.refresh_quote_if_stale().await {
                return;
            }
            if self.inner.config.gas_buffered(self.kind()) && !self.buffer_gas().await {
                return;
            }
        }

        // Last point where cancelling has no chain effect
        if self.handle.cancel.is_cancelled() {
            self.transition("cancel", |i| i.cancel());
            return;
        }

        let step = self.handle.with_intent(|i| i.step_to_submit().cloned());
        let Some(step) = step else {
            return;
        };

        info!("✍️ {} submitting {:?} step: {}", self.handle.id, step.role, step.call);

        match self.inner.ledger.submit(&step.call, step.options.clone()).await {
            Ok(tx) => {
                info!("📡 {} broadcast {}", self.handle.id, tx);
                let kind = self.kind();
                self.inner.update_form(kind, |form| form.track(tx.clone()));
                self.transition("submitted", |i| i.record_submitted(tx));
            }
            Err(LedgerError::UserDeclined) => {
                info!("🙅 {} declined in wallet", self.handle.id);
                self.transition("declined", |i| i.fail(FailureReason::UserDeclined));
            }
            Err(LedgerError::Transport { reason }) => {
                self.fail(FailureReason::TransportUnavailable { reason, broadcast: false });
            }
        }
    }

    /// Re-read the allowance a primary step without its own approval relies on
    ///
    /// Another intent may have spent it since the build. Returns `false` when
    /// the intent was failed instead.
    async fn allowance_still_covers(&mut self) -> bool {
        let required = self.handle.with_intent(|i| {
            if i.approval_step().is_some() {
                return None;
            }
            i.amount.clone().map(|amount| (i.primary_step().call.to.clone(), amount))
        });
        let Some((spender, amount)) = required else {
            return true;
        };

        let guard = AllowanceGuard::new(self.inner.ledger.as_ref(), self.inner.retries());
        match guard.needs_approval(&self.inner.user, &spender, &amount).await {
            Ok(false) => true,
            Ok(true) => {
                self.fail(FailureReason::AllowanceChanged);
                false
            }
            Err(e) => {
                self.fail(FailureReason::StateUnavailable { reason: e.to_string() });
                false
            }
        }
    }

    /// Take a new quote when the current one is older than the configured window
    ///
    /// Returns `false` when the intent was failed instead.
    async fn refresh_quote_if_stale(&mut self) -> bool {
        let config = self.inner.config.clone();
        let now = self.inner.clock.now_secs();
        let (quote, tolerance) = self.handle.with_intent(|i| (i.quote.clone(), i.tolerance));
        let (Some(old), Some(tolerance)) = (quote, tolerance) else {
            return true;
        };

        let age = old.age_secs(now);
        if age <= config.requote_after_secs {
            return true;
        }

        info!("🔁 {} quote is {}s old, re-quoting", self.handle.id, age);
        let fresh = match self.inner.quote_engine().quote(&old.path, &old.input, now).await {
            Ok(q) => q,
            Err(e) => {
                self.fail(FailureReason::StateUnavailable { reason: e.to_string() });
                return false;
            }
        };

        let swap = match build_swap_call(
            &config.swap.router,
            &fresh,
            tolerance,
            &self.inner.user,
            now,
            config.execution_deadline_secs,
        ) {
            Ok(swap) => swap,
            Err(e) if e.is_liquidity_warning() => {
                self.fail(FailureReason::NoLiquidityPath);
                return false;
            }
            Err(e) => {
                self.fail(FailureReason::StateUnavailable { reason: e.to_string() });
                return false;
            }
        };

        self.transition("requote", |i| {
            i.replace_primary_call(swap.call)?;
            i.quote = Some(fresh);
            i.min_out = Some(swap.min_out);
            Ok(())
        });
        !self.handle.state().is_terminal()
    }

    /// Set an explicit gas limit above the estimate on the primary step
    async fn buffer_gas(&mut self) -> bool {
        let call = self.handle.with_intent(|i| i.primary_step().call.clone());
        let ledger = self.inner.ledger.as_ref();
        let call_ref = &call;
        let estimate = read_with_retries("gas estimate", self.inner.retries(), move || ledger.estimate_gas(call_ref)).await;

        let estimate = match estimate {
            Ok(e) => e,
            Err(e) => {
                self.fail(FailureReason::TransportUnavailable { reason: e.to_string(), broadcast: false });
                return false;
            }
        };

        let gas_limit = match apply_gas_multiplier(estimate, self.inner.config.gas_limit_multiplier_bps) {
            Ok(limit) => limit,
            Err(e) => {
                self.fail(FailureReason::StateUnavailable { reason: e.to_string() });
                return false;
            }
        };

        info!("⛽ {} gas limit {} (estimate {})", self.handle.id, gas_limit, estimate);
        self.transition("gas", |i| i.set_primary_options(SubmitOptions { gas_limit: Some(gas_limit) }));
        !self.handle.state().is_terminal()
    }

    /// Wait for the pending transaction, a timeout, or a cancel, whichever comes first
    async fn await_confirmation(&mut self) {
        let tx = self.handle.with_intent(|i| i.pending_tx().cloned());
        let Some(tx) = tx else {
            return;
        };

        let timeout_secs = self.inner.config.confirmation_timeout_secs;
        let waits: Vec<BoxFuture<'_, Wake>> = vec![
            self.inner.ledger.await_confirmation(&tx).map(Wake::Confirmation).boxed(),
            self.inner.clock.sleep(Duration::from_secs(timeout_secs)).map(|_| Wake::TimedOut).boxed(),
            self.handle.cancel.cancelled().map(|_| Wake::Cancelled).boxed(),
        ];
        let (wake, _, _) = select_all(waits).await;

        match wake {
            Wake::Confirmation(Ok(Confirmation::Confirmed)) => {
                info!("✅ {} confirmed {}", self.handle.id, tx);
                self.transition("confirmed", |i| i.record_confirmed());
            }
            Wake::Confirmation(Ok(Confirmation::Reverted { reason })) => {
                warn!("❌ {} reverted {}: {:?}", self.handle.id, tx, reason);
                self.transition("reverted", |i| i.record_reverted(reason));
            }
            Wake::Confirmation(Err(e)) => {
                self.fail(FailureReason::TransportUnavailable { reason: e.to_string(), broadcast: true });
            }
            Wake::TimedOut => {
                self.fail(FailureReason::ConfirmationTimedOut { tx_ref: tx.to_string() });
            }
            Wake::Cancelled => {
                info!("🛑 {} stopped tracking {}", self.handle.id, tx);
                self.transition("cancel", |i| i.cancel());
            }
        }
    }

    /// Terminal bookkeeping: refresh, reset the form, free the slot
    async fn finish(&mut self) {
        let (state, targets) = self.handle.with_intent(|i| {
            let refresh = match i.state() {
                IntentState::Succeeded => true,
                IntentState::Failed(reason) => {
                    reason.touched_chain() || i.steps().iter().any(|s| s.tx_ref.is_some())
                }
                _ => false,
            };
            let targets = if refresh { i.take_invalidation_targets() } else { Vec::new() };
            (i.state().clone(), targets)
        });

        self.inner.refresh(&targets).await;

        let kind = self.kind();
        if state == IntentState::Succeeded {
            self.inner.update_form(kind, |form| form.finish_success());
        } else {
            self.inner.update_form(kind, |form| form.finish_failure());
        }

        self.guard.take();
        info!("🏁 {} finished: {}", self.handle.id, state);
    }
}
