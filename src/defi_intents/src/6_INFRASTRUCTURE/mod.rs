//! Infrastructure - Shared utilities and types
//! Foundation layer for all other modules

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod math;
pub mod reentrancy;

// Re-export commonly used items
pub use clock::{Clock, SystemClock};
pub use config::{ActionTarget, ClaimTarget, OrchestratorConfig};
pub use errors::{
    CalculationError, IntentError, Result, StateError, SystemError, TradingError, ValidationError,
};
pub use math::{multiply_and_divide, to_base_units, to_display_string};
pub use reentrancy::{InFlightRegistry, IntentGuard};
