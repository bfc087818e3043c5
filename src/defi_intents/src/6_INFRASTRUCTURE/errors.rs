//! Error taxonomy for intent building and orchestration
//!
//! Build-time problems (bad input, unreadable chain state, no liquidity) are
//! `IntentError`s and never reach the write path. Problems that happen after
//! a step is handed to the signer are reported as
//! [`FailureReason`](crate::types::intents::FailureReason) on the status
//! stream instead.

use candid::{CandidType, Deserialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, IntentError>;

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    Validation(ValidationError),
    State(StateError),
    Trading(TradingError),
    Calculation(CalculationError),
    System(SystemError),
    Other(String),
}

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// User-supplied amount is not a non-negative decimal at the token's precision
    MalformedAmount { input: String, reason: String },
    ZeroAmount { kind: String },
    InsufficientBalance { token: String, required: String, available: String },
    InvalidAddress { address: String },
    UnknownToken { symbol: String },
    InvalidPath { reason: String },
    InvalidConfig { field: String, reason: String },
}

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A required chain read failed; the intent must not be built
    StateUnavailable { read: String, reason: String },
    MalformedResponse { read: String, reason: String },
}

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TradingError {
    NoLiquidityPath { path: Vec<String>, amount_in: String },
    InvalidSlippage { bps: u32 },
    InvalidSwapAmount { reason: String },
}

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum CalculationError {
    DivisionByZero { operation: String },
    Overflow { operation: String },
    Underflow { operation: String },
    MismatchedTokens { left: String, right: String },
}

#[derive(CandidType, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    OperationInProgress { operation: String, user: String },
    InvalidTransition { from: String, event: String },
    ApprovalNotConfirmed { intent_id: String },
    IntentTerminal { intent_id: String, state: String },
}

impl IntentError {
    /// Quoted output was zero. Shown as a liquidity warning, not a generic error.
    pub fn is_liquidity_warning(&self) -> bool {
        matches!(self, IntentError::Trading(TradingError::NoLiquidityPath { .. }))
    }

    pub fn state_unavailable(read: impl Into<String>, reason: impl Into<String>) -> Self {
        IntentError::State(StateError::StateUnavailable {
            read: read.into(),
            reason: reason.into(),
        })
    }

    pub fn malformed_amount(input: impl Into<String>, reason: impl Into<String>) -> Self {
        IntentError::Validation(ValidationError::MalformedAmount {
            input: input.into(),
            reason: reason.into(),
        })
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        IntentError::Validation(ValidationError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentError::Validation(e) => write!(f, "Validation error: {}", e),
            IntentError::State(e) => write!(f, "Chain state error: {}", e),
            IntentError::Trading(e) => write!(f, "Trading error: {}", e),
            IntentError::Calculation(e) => write!(f, "Calculation error: {}", e),
            IntentError::System(e) => write!(f, "System error: {}", e),
            IntentError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MalformedAmount { input, reason } => {
                write!(f, "malformed amount '{}': {}", input, reason)
            }
            ValidationError::ZeroAmount { kind } => write!(f, "{} amount must be greater than zero", kind),
            ValidationError::InsufficientBalance { token, required, available } => write!(
                f,
                "insufficient {} balance: required {}, available {}",
                token, required, available
            ),
            ValidationError::InvalidAddress { address } => write!(f, "invalid address '{}'", address),
            ValidationError::UnknownToken { symbol } => write!(f, "token '{}' is not accepted", symbol),
            ValidationError::InvalidPath { reason } => write!(f, "invalid swap path: {}", reason),
            ValidationError::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::StateUnavailable { read, reason } => {
                write!(f, "{} unavailable: {}", read, reason)
            }
            StateError::MalformedResponse { read, reason } => {
                write!(f, "{} returned a malformed response: {}", read, reason)
            }
        }
    }
}

impl fmt::Display for TradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingError::NoLiquidityPath { path, amount_in } => write!(
                f,
                "no liquidity for {} along {}",
                amount_in,
                path.join(" -> ")
            ),
            TradingError::InvalidSlippage { bps } => {
                write!(f, "slippage floor must be in (0, 10000] bps, got {}", bps)
            }
            TradingError::InvalidSwapAmount { reason } => write!(f, "invalid swap amount: {}", reason),
        }
    }
}

impl fmt::Display for CalculationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationError::DivisionByZero { operation } => write!(f, "division by zero in {}", operation),
            CalculationError::Overflow { operation } => write!(f, "overflow in {}", operation),
            CalculationError::Underflow { operation } => write!(f, "underflow in {}", operation),
            CalculationError::MismatchedTokens { left, right } => {
                write!(f, "cannot combine amounts of {} and {}", left, right)
            }
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::OperationInProgress { operation, user } => {
                write!(f, "{} already in progress for {}", operation, user)
            }
            SystemError::InvalidTransition { from, event } => {
                write!(f, "cannot apply '{}' in state {}", event, from)
            }
            SystemError::ApprovalNotConfirmed { intent_id } => write!(
                f,
                "intent {} is still waiting for its approval to confirm",
                intent_id
            ),
            SystemError::IntentTerminal { intent_id, state } => write!(
                f,
                "intent {} is {}; build a new intent to retry",
                intent_id, state
            ),
        }
    }
}

impl std::error::Error for IntentError {}
