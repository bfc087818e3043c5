//! # Chain State Module
//!
//! Everything the orchestrator knows about the chain is read through here.
//!
//! ## Architecture
//! - **ledger/**: the `LedgerClient` seam and its error type
//! - **refresh/**: post-terminal re-reads of balances and allowances
//!
//! ## Read Policy
//! Reads are idempotent, so a failed read is retried up to the configured
//! number of extra attempts. Exhausted retries surface as `StateUnavailable`;
//! nothing is ever assumed on a failed read.

pub mod ledger;
pub mod refresh;

use std::future::Future;
use tracing::{debug, warn};
use crate::infrastructure::{Result, IntentError};
use ledger::{LedgerError, LedgerResult};

/// Run an idempotent read, retrying up to `retries` extra times
///
/// A signer rejection is not a transient failure and is returned at once.
pub async fn read_with_retries<T, F, Fut>(read: &str, retries: u8, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LedgerResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..=retries {
        if attempt > 0 {
            debug!("🔄 Retrying {} read (attempt {} of {})", read, attempt + 1, retries + 1);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(LedgerError::UserDeclined) => {
                return Err(IntentError::state_unavailable(read, "request declined by signer"));
            }
            Err(e) => {
                warn!("⚠️ {} read failed on attempt {}: {}", read, attempt + 1, e);
                last_error = Some(e);
            }
        }
    }

    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempt made".to_string());
    Err(IntentError::state_unavailable(
        read,
        format!("{} after {} attempts", reason, retries as u32 + 1),
    ))
}
