use candid::{CandidType, Deserialize};
use serde::Serialize;
use std::fmt;

/// One logical user action
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntentKind {
    Deposit,
    Stake,
    Swap,
    Claim,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Deposit => "deposit",
            IntentKind::Stake => "stake",
            IntentKind::Swap => "swap",
            IntentKind::Claim => "claim",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy = pay the quote asset for the traded token, Sell = the reverse
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwapDirection {
    #[default]
    Buy,
    Sell,
}

/// Why an intent ended without success
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Signer rejected the request. Neutral outcome, not an error.
    UserDeclined,
    /// Broadcast succeeded but the transaction failed on-chain
    ExecutionReverted { reason: Option<String> },
    /// RPC/network failure. `broadcast` tells whether a transaction may exist.
    TransportUnavailable { reason: String, broadcast: bool },
    /// Re-quote at submission time came back empty
    NoLiquidityPath,
    /// Allowance read at build time no longer covers the amount; build again
    AllowanceChanged,
    /// A read needed to prepare the step failed
    StateUnavailable { reason: String },
    /// No confirmation within the configured bound
    ConfirmationTimedOut { tx_ref: String },
}

impl FailureReason {
    /// Only an unbroadcast transport failure can be retried, and only by the user
    pub fn is_user_retryable(&self) -> bool {
        matches!(self, FailureReason::TransportUnavailable { broadcast: false, .. })
    }

    /// Gas may have been spent, so balances still need a refresh
    pub fn touched_chain(&self) -> bool {
        matches!(
            self,
            FailureReason::ExecutionReverted { .. }
                | FailureReason::ConfirmationTimedOut { .. }
                | FailureReason::TransportUnavailable { broadcast: true, .. }
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UserDeclined => write!(f, "request declined in wallet"),
            FailureReason::ExecutionReverted { reason: Some(r) } => write!(f, "transaction reverted: {}", r),
            FailureReason::ExecutionReverted { reason: None } => write!(f, "transaction reverted"),
            FailureReason::TransportUnavailable { reason, .. } => write!(f, "network unavailable: {}", reason),
            FailureReason::NoLiquidityPath => write!(f, "no liquidity for this trade"),
            FailureReason::AllowanceChanged => write!(f, "allowance changed, review the amount again"),
            FailureReason::StateUnavailable { reason } => write!(f, "chain state unavailable: {}", reason),
            FailureReason::ConfirmationTimedOut { tx_ref } => {
                write!(f, "no confirmation received for {}", tx_ref)
            }
        }
    }
}

/// Discrete status values emitted by `submit_intent`
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Validating,
    AwaitingApproval,
    AwaitingPrimary,
    Confirming,
    Succeeded,
    Cancelled,
    Failed(FailureReason),
}

impl StatusUpdate {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusUpdate::Succeeded | StatusUpdate::Cancelled | StatusUpdate::Failed(_))
    }
}
