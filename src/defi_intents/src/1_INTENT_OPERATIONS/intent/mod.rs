//! # Transaction Intent
//!
//! One user action as a short, ordered list of on-chain steps: an optional
//! exact-amount approval followed by the primary call.
//!
//! ## State Machine
//! ```text
//! Building ─┬─> AwaitingApprovalSubmit ─> AwaitingApprovalConfirm ─┐
//!           └──────────────────────────────────────────────────────┴─> AwaitingPrimarySubmit
//!                                       ─> AwaitingPrimaryConfirm ─> Succeeded
//! any non-terminal ─> Cancelled | Failed(reason)
//! ```
//!
//! ## Guarantees
//! - The primary step is never recorded as submitted while an approval step
//!   is still unconfirmed
//! - Every transition is checked; an impossible one is an error, not a panic
//! - Terminal states are final, except an unbroadcast transport failure which
//!   the user may explicitly retry

use candid::Nat;
use std::fmt;
use crate::infrastructure::{Result, IntentError, SystemError};
use crate::types::{ContractCall, FailureReason, IntentKind, StatusUpdate, SubmitOptions, TokenAmount, TxRef};
use crate::_2_CHAIN_STATE::refresh::InvalidationTarget;
use crate::_3_ROUTE_QUOTES::quotes::Quote;
use crate::_4_TRADING_EXECUTION::slippage::SlippageTolerance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRole {
    Approval,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Pending,
    Confirmed,
    Reverted,
}

/// One contract call of an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub role: StepRole,
    pub call: ContractCall,
    pub options: SubmitOptions,
    pub tx_ref: Option<TxRef>,
    pub outcome: StepOutcome,
}

impl Step {
    pub fn new(role: StepRole, call: ContractCall) -> Self {
        Self {
            role,
            call,
            options: SubmitOptions::default(),
            tx_ref: None,
            outcome: StepOutcome::Pending,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.outcome == StepOutcome::Confirmed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentState {
    Building,
    AwaitingApprovalSubmit,
    AwaitingApprovalConfirm,
    AwaitingPrimarySubmit,
    AwaitingPrimaryConfirm,
    Succeeded,
    Cancelled,
    Failed(FailureReason),
}

impl IntentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntentState::Succeeded | IntentState::Cancelled | IntentState::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentState::Building => "building",
            IntentState::AwaitingApprovalSubmit => "awaiting_approval_submit",
            IntentState::AwaitingApprovalConfirm => "awaiting_approval_confirm",
            IntentState::AwaitingPrimarySubmit => "awaiting_primary_submit",
            IntentState::AwaitingPrimaryConfirm => "awaiting_primary_confirm",
            IntentState::Succeeded => "succeeded",
            IntentState::Cancelled => "cancelled",
            IntentState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for IntentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TransactionIntent {
    pub id: String,
    pub kind: IntentKind,
    /// User-entered amount; `None` for claims
    pub amount: Option<TokenAmount>,
    /// Quote backing the primary step of a swap
    pub quote: Option<Quote>,
    /// Minimum output encoded in the swap call
    pub min_out: Option<Nat>,
    /// Floor applied when the swap is re-quoted
    pub tolerance: Option<SlippageTolerance>,
    approval: Option<Step>,
    primary: Step,
    state: IntentState,
    targets: Vec<InvalidationTarget>,
    targets_taken: bool,
}

impl TransactionIntent {
    pub fn new(
        id: String,
        kind: IntentKind,
        approval: Option<Step>,
        primary: Step,
        targets: Vec<InvalidationTarget>,
    ) -> Self {
        Self {
            id,
            kind,
            amount: None,
            quote: None,
            min_out: None,
            tolerance: None,
            approval,
            primary,
            state: IntentState::Building,
            targets,
            targets_taken: false,
        }
    }

    pub fn state(&self) -> &IntentState {
        &self.state
    }

    pub fn approval_step(&self) -> Option<&Step> {
        self.approval.as_ref()
    }

    pub fn primary_step(&self) -> &Step {
        &self.primary
    }

    /// Ordered steps, approval first when present
    pub fn steps(&self) -> Vec<&Step> {
        self.approval.iter().chain(std::iter::once(&self.primary)).collect()
    }

    pub fn invalidation_targets(&self) -> &[InvalidationTarget] {
        &self.targets
    }

    /// Step the next submit applies to, if the intent is waiting for one
    pub fn step_to_submit(&self) -> Option<&Step> {
        match self.state {
            IntentState::AwaitingApprovalSubmit => self.approval.as_ref(),
            IntentState::AwaitingPrimarySubmit => Some(&self.primary),
            _ => None,
        }
    }

    /// Transaction currently awaiting confirmation
    pub fn pending_tx(&self) -> Option<&TxRef> {
        match self.state {
            IntentState::AwaitingApprovalConfirm => self.approval.as_ref().and_then(|s| s.tx_ref.as_ref()),
            IntentState::AwaitingPrimaryConfirm => self.primary.tx_ref.as_ref(),
            _ => None,
        }
    }

    /// Leave `Building` once every build-time check has passed
    pub fn ready(&mut self) -> Result<()> {
        match self.state {
            IntentState::Building => {
                self.state = if self.approval.is_some() {
                    IntentState::AwaitingApprovalSubmit
                } else {
                    IntentState::AwaitingPrimarySubmit
                };
                Ok(())
            }
            _ => Err(self.invalid("ready")),
        }
    }

    /// Replace the primary call before it is broadcast (fresh swap quote)
    pub fn replace_primary_call(&mut self, call: ContractCall) -> Result<()> {
        if self.primary.tx_ref.is_some() || self.state.is_terminal() {
            return Err(self.invalid("replace_primary_call"));
        }
        self.primary.call = call;
        Ok(())
    }

    pub fn set_primary_options(&mut self, options: SubmitOptions) -> Result<()> {
        if self.primary.tx_ref.is_some() || self.state.is_terminal() {
            return Err(self.invalid("set_primary_options"));
        }
        self.primary.options = options;
        Ok(())
    }

    /// The current step was broadcast as `tx`
    pub fn record_submitted(&mut self, tx: TxRef) -> Result<()> {
        match self.state {
            IntentState::AwaitingApprovalSubmit => {
                if let Some(step) = self.approval.as_mut() {
                    step.tx_ref = Some(tx);
                }
                self.state = IntentState::AwaitingApprovalConfirm;
                Ok(())
            }
            IntentState::AwaitingPrimarySubmit => {
                if let Some(step) = &self.approval {
                    if !step.is_confirmed() {
                        return Err(self.approval_not_confirmed());
                    }
                }
                self.primary.tx_ref = Some(tx);
                self.state = IntentState::AwaitingPrimaryConfirm;
                Ok(())
            }
            IntentState::AwaitingApprovalConfirm => Err(self.approval_not_confirmed()),
            _ => Err(self.invalid("submitted")),
        }
    }

    /// The pending transaction was mined successfully
    pub fn record_confirmed(&mut self) -> Result<()> {
        match self.state {
            IntentState::AwaitingApprovalConfirm => {
                if let Some(step) = self.approval.as_mut() {
                    step.outcome = StepOutcome::Confirmed;
                }
                self.state = IntentState::AwaitingPrimarySubmit;
                Ok(())
            }
            IntentState::AwaitingPrimaryConfirm => {
                self.primary.outcome = StepOutcome::Confirmed;
                self.state = IntentState::Succeeded;
                Ok(())
            }
            _ => Err(self.invalid("confirmed")),
        }
    }

    /// The pending transaction was mined and reverted
    pub fn record_reverted(&mut self, reason: Option<String>) -> Result<()> {
        let step = match self.state {
            IntentState::AwaitingApprovalConfirm => self.approval.as_mut(),
            IntentState::AwaitingPrimaryConfirm => Some(&mut self.primary),
            _ => return Err(self.invalid("reverted")),
        };
        if let Some(step) = step {
            step.outcome = StepOutcome::Reverted;
        }
        self.state = IntentState::Failed(FailureReason::ExecutionReverted { reason });
        Ok(())
    }

    pub fn fail(&mut self, reason: FailureReason) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.terminal());
        }
        self.state = IntentState::Failed(reason);
        Ok(())
    }

    /// Stop the intent. After broadcast this only stops tracking.
    pub fn cancel(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.terminal());
        }
        self.state = IntentState::Cancelled;
        Ok(())
    }

    /// Re-arm a transport failure that never reached the chain
    pub fn reopen_for_retry(&mut self) -> Result<()> {
        let retryable = matches!(&self.state, IntentState::Failed(reason) if reason.is_user_retryable());
        if !retryable {
            return Err(self.terminal());
        }

        let approval_pending = self.approval.as_ref().is_some_and(|s| !s.is_confirmed());
        self.state = if approval_pending {
            IntentState::AwaitingApprovalSubmit
        } else {
            IntentState::AwaitingPrimarySubmit
        };
        self.targets_taken = false;
        Ok(())
    }

    /// Targets to re-read after a terminal state; empty after the first call
    /// until the intent is re-armed
    pub fn take_invalidation_targets(&mut self) -> Vec<InvalidationTarget> {
        if self.targets_taken {
            return Vec::new();
        }
        self.targets_taken = true;
        self.targets.clone()
    }

    pub fn status(&self) -> StatusUpdate {
        match &self.state {
            IntentState::Building => StatusUpdate::Validating,
            IntentState::AwaitingApprovalSubmit | IntentState::AwaitingApprovalConfirm => {
                StatusUpdate::AwaitingApproval
            }
            IntentState::AwaitingPrimarySubmit => StatusUpdate::AwaitingPrimary,
            IntentState::AwaitingPrimaryConfirm => StatusUpdate::Confirming,
            IntentState::Succeeded => StatusUpdate::Succeeded,
            IntentState::Cancelled => StatusUpdate::Cancelled,
            IntentState::Failed(reason) => StatusUpdate::Failed(reason.clone()),
        }
    }

    fn invalid(&self, event: &str) -> IntentError {
        IntentError::System(SystemError::InvalidTransition {
            from: self.state.to_string(),
            event: event.to_string(),
        })
    }

    fn terminal(&self) -> IntentError {
        IntentError::System(SystemError::IntentTerminal {
            intent_id: self.id.clone(),
            state: self.state.to_string(),
        })
    }

    fn approval_not_confirmed(&self) -> IntentError {
        IntentError::System(SystemError::ApprovalNotConfirmed { intent_id: self.id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, CallFunction};

    fn addr(last: u8) -> Address {
        format!("0x{:040x}", last).parse().unwrap()
    }

    fn approval() -> Step {
        Step::new(
            StepRole::Approval,
            ContractCall {
                to: addr(1),
                function: CallFunction::Approve { spender: addr(2), amount: Nat::from(100u64) },
            },
        )
    }

    fn primary() -> Step {
        Step::new(
            StepRole::Primary,
            ContractCall { to: addr(2), function: CallFunction::Deposit { amount: Nat::from(100u64) } },
        )
    }

    fn intent(with_approval: bool) -> TransactionIntent {
        TransactionIntent::new(
            "deposit-1".to_string(),
            IntentKind::Deposit,
            with_approval.then(approval),
            primary(),
            vec![InvalidationTarget::Balance { token: addr(1) }],
        )
    }

    #[test]
    fn test_full_path_with_approval() {
        let mut i = intent(true);
        assert_eq!(i.status(), StatusUpdate::Validating);
        i.ready().unwrap();
        assert_eq!(i.state(), &IntentState::AwaitingApprovalSubmit);
        assert_eq!(i.step_to_submit().map(|s| s.role), Some(StepRole::Approval));

        i.record_submitted(TxRef("0xa".to_string())).unwrap();
        assert_eq!(i.pending_tx(), Some(&TxRef("0xa".to_string())));
        assert_eq!(i.status(), StatusUpdate::AwaitingApproval);

        i.record_confirmed().unwrap();
        assert_eq!(i.state(), &IntentState::AwaitingPrimarySubmit);
        assert_eq!(i.status(), StatusUpdate::AwaitingPrimary);

        i.record_submitted(TxRef("0xb".to_string())).unwrap();
        assert_eq!(i.status(), StatusUpdate::Confirming);
        i.record_confirmed().unwrap();
        assert_eq!(i.status(), StatusUpdate::Succeeded);
        assert!(i.steps().iter().all(|s| s.is_confirmed()));
    }

    #[test]
    fn test_short_path_skips_approval() {
        let mut i = intent(false);
        i.ready().unwrap();
        assert_eq!(i.state(), &IntentState::AwaitingPrimarySubmit);
        assert_eq!(i.steps().len(), 1);
    }

    #[test]
    fn test_primary_blocked_until_approval_confirmed() {
        let mut i = intent(true);
        i.ready().unwrap();
        i.record_submitted(TxRef("0xa".to_string())).unwrap();

        let err = i.record_submitted(TxRef("0xb".to_string())).unwrap_err();
        assert_eq!(
            err,
            IntentError::System(SystemError::ApprovalNotConfirmed { intent_id: "deposit-1".to_string() })
        );
        assert_eq!(i.primary_step().tx_ref, None);
    }

    #[test]
    fn test_revert_is_terminal() {
        let mut i = intent(false);
        i.ready().unwrap();
        i.record_submitted(TxRef("0xb".to_string())).unwrap();
        i.record_reverted(Some("STF".to_string())).unwrap();
        assert_eq!(
            i.status(),
            StatusUpdate::Failed(FailureReason::ExecutionReverted { reason: Some("STF".to_string()) })
        );
        assert_eq!(i.primary_step().outcome, StepOutcome::Reverted);
        assert!(i.cancel().is_err());
        assert!(i.reopen_for_retry().is_err());
    }

    #[test]
    fn test_invalid_transitions_are_errors() {
        let mut i = intent(false);
        assert!(matches!(i.record_confirmed(), Err(IntentError::System(SystemError::InvalidTransition { .. }))));
        assert!(i.record_submitted(TxRef("0x1".to_string())).is_err());
        i.ready().unwrap();
        assert!(i.ready().is_err());
    }

    #[test]
    fn test_unbroadcast_transport_failure_can_reopen() {
        let mut i = intent(true);
        i.ready().unwrap();
        i.fail(FailureReason::TransportUnavailable { reason: "rpc down".to_string(), broadcast: false })
            .unwrap();
        i.reopen_for_retry().unwrap();
        assert_eq!(i.state(), &IntentState::AwaitingApprovalSubmit);

        i.record_submitted(TxRef("0xa".to_string())).unwrap();
        i.record_confirmed().unwrap();
        i.fail(FailureReason::TransportUnavailable { reason: "rpc down".to_string(), broadcast: false })
            .unwrap();
        i.reopen_for_retry().unwrap();
        assert_eq!(i.state(), &IntentState::AwaitingPrimarySubmit);
    }

    #[test]
    fn test_broadcast_transport_failure_is_final() {
        let mut i = intent(false);
        i.ready().unwrap();
        i.fail(FailureReason::TransportUnavailable { reason: "lost".to_string(), broadcast: true })
            .unwrap();
        assert!(matches!(i.reopen_for_retry(), Err(IntentError::System(SystemError::IntentTerminal { .. }))));
    }

    #[test]
    fn test_invalidation_targets_taken_once() {
        let mut i = intent(false);
        assert_eq!(i.take_invalidation_targets().len(), 1);
        assert!(i.take_invalidation_targets().is_empty());
        assert_eq!(i.invalidation_targets().len(), 1);
    }

    #[test]
    fn test_primary_call_frozen_after_broadcast() {
        let mut i = intent(false);
        i.ready().unwrap();
        i.replace_primary_call(primary().call).unwrap();
        i.record_submitted(TxRef("0xb".to_string())).unwrap();
        assert!(i.replace_primary_call(primary().call).is_err());
    }
}
