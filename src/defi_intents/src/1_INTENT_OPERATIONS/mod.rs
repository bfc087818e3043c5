//! # Intent Operations
//!
//! Everything that ends in a signed transaction goes through this zone.
//!
//! ## Architecture
//!
//! ### intent/
//! `TransactionIntent` and its state machine. Pure data: no chain access,
//! every transition checked.
//!
//! ### orchestrator/
//! `IntentOrchestrator`, the UI-facing entry point. Builds intents from
//! user input using the chain-state, quote and trading zones, then drives
//! them through the ledger client one step at a time.
//!
//! ## Usage
//!
//! ```text
//! let handle = orchestrator.build_intent(IntentKind::Deposit, "10.5", None).await?;
//! let mut updates = orchestrator.submit_intent(&handle)?;
//! while let Some(status) = updates.next().await {
//!     // VALIDATING... -> AUTHORIZING... -> DEPOSITING... -> PROCESSING... -> CONFIRMED
//! }
//! ```

pub mod intent;
pub mod orchestrator;
