//! Shared domain types

pub mod chain;
pub mod intents;
pub mod tokens;

pub use chain::{Address, CallFunction, ContractCall, SubmitOptions, TxRef};
pub use intents::{FailureReason, IntentKind, StatusUpdate, SwapDirection};
pub use tokens::{Token, TokenAmount};
