//! Reentrancy guards for intent submission
//! Prevents two intents of the same kind from running for the same user
//!
//! ## Granularity
//! - One slot per `(user, kind)`: a second deposit while a deposit is in
//!   flight is rejected, a claim next to that deposit is not
//! - The slot is held by an `IntentGuard` and released when the guard drops,
//!   whether the intent finished, failed, or its status stream was abandoned
//!
//! Example: User A can deposit and swap at the same time, but a second
//! deposit submit is rejected with `OperationInProgress` until the first ends.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use crate::infrastructure::{Result, IntentError, SystemError};
use crate::types::{Address, IntentKind};

type Slot = (Address, IntentKind);

/// Set of `(user, kind)` pairs with an intent in flight
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<Slot>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `(user, kind)`
    pub fn acquire(&self, user: &Address, kind: IntentKind) -> Result<IntentGuard> {
        let slot = (user.clone(), kind);
        let acquired = self.lock().insert(slot.clone());

        if acquired {
            debug!("🔒 {} slot taken for {}", kind, user.short());
            Ok(IntentGuard { registry: self.clone(), slot })
        } else {
            Err(IntentError::System(SystemError::OperationInProgress {
                operation: kind.to_string(),
                user: user.to_string(),
            }))
        }
    }

    pub fn is_active(&self, user: &Address, kind: IntentKind) -> bool {
        self.lock().contains(&(user.clone(), kind))
    }

    pub fn has_active_operations(&self) -> bool {
        !self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the set half-updated
    fn lock(&self) -> MutexGuard<'_, HashSet<Slot>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held for the lifetime of one submitted intent
#[derive(Debug)]
pub struct IntentGuard {
    registry: InFlightRegistry,
    slot: Slot,
}

impl IntentGuard {
    pub fn kind(&self) -> IntentKind {
        self.slot.1
    }
}

impl Drop for IntentGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.slot);
        debug!("🔓 {} slot released for {}", self.slot.1, self.slot.0.short());
    }
}
