//! Display module - status labels and per-form state for the UI
//!
//! The orchestrator emits `StatusUpdate`s; this module turns them into the
//! short button labels the dApp shows and decides how each outcome is
//! presented. A declined signature is neutral and an empty quote is a
//! warning; neither is rendered as an error.

use crate::infrastructure::IntentError;
use crate::types::{FailureReason, IntentKind, StatusUpdate, TxRef};

/// How an outcome should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Progress,
    Success,
    Warning,
    Error,
}

/// Button label while an intent of `kind` is in `status`
pub fn status_label(kind: IntentKind, status: &StatusUpdate) -> String {
    match status {
        StatusUpdate::Validating => "VALIDATING...".to_string(),
        StatusUpdate::AwaitingApproval => "AUTHORIZING...".to_string(),
        StatusUpdate::AwaitingPrimary => match kind {
            IntentKind::Deposit => "DEPOSITING...",
            IntentKind::Stake => "STAKING...",
            IntentKind::Swap => "SWAPPING...",
            IntentKind::Claim => "SYNCHRONIZING...",
        }
        .to_string(),
        StatusUpdate::Confirming => "PROCESSING...".to_string(),
        StatusUpdate::Succeeded => "CONFIRMED".to_string(),
        StatusUpdate::Cancelled => "CANCELLED".to_string(),
        StatusUpdate::Failed(reason) => reason.to_string(),
    }
}

pub fn status_tone(status: &StatusUpdate) -> Tone {
    match status {
        StatusUpdate::Validating
        | StatusUpdate::AwaitingApproval
        | StatusUpdate::AwaitingPrimary
        | StatusUpdate::Confirming => Tone::Progress,
        StatusUpdate::Succeeded => Tone::Success,
        StatusUpdate::Cancelled => Tone::Neutral,
        StatusUpdate::Failed(reason) => failure_tone(reason),
    }
}

pub fn failure_tone(reason: &FailureReason) -> Tone {
    match reason {
        FailureReason::UserDeclined => Tone::Neutral,
        FailureReason::NoLiquidityPath | FailureReason::AllowanceChanged => Tone::Warning,
        _ => Tone::Error,
    }
}

/// Build-time errors: an empty quote is a liquidity warning, the rest are errors
pub fn error_tone(error: &IntentError) -> Tone {
    if error.is_liquidity_warning() {
        Tone::Warning
    } else {
        Tone::Error
    }
}

/// Idle/busy state of one action form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Amount text as the user typed it
    pub input: String,
    /// Transaction currently being tracked
    pub tx_ref: Option<TxRef>,
    pub busy: bool,
    /// Current label; empty when idle
    pub status_message: String,
}

impl FormState {
    pub fn begin(&mut self, input: &str) {
        self.input = input.to_string();
        self.busy = true;
        self.tx_ref = None;
    }

    pub fn show(&mut self, kind: IntentKind, status: &StatusUpdate) {
        self.status_message = status_label(kind, status);
    }

    pub fn track(&mut self, tx: TxRef) {
        self.tx_ref = Some(tx);
    }

    /// Success clears the form so the next action starts blank
    pub fn finish_success(&mut self) {
        *self = FormState::default();
    }

    /// Failure keeps the typed amount so the user can resubmit
    pub fn finish_failure(&mut self) {
        self.busy = false;
        self.tx_ref = None;
        self.status_message.clear();
    }
}
