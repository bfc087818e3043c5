//! Gas limit buffering for primary steps
//!
//! The wallet's estimate is scaled by a basis-point multiplier and rounded
//! up. The result is never below the estimate.

use crate::infrastructure::{Result, IntentError, CalculationError};
use crate::infrastructure::constants::BPS_DENOMINATOR;

/// `ceil(estimate × multiplier_bps / 10_000)`, floored at `estimate`
pub fn apply_gas_multiplier(estimate: u64, multiplier_bps: u32) -> Result<u64> {
    let scaled = (estimate as u128) * (multiplier_bps as u128);
    let denominator = BPS_DENOMINATOR as u128;
    let buffered = scaled.div_ceil(denominator);

    let buffered = u64::try_from(buffered).map_err(|_| {
        IntentError::Calculation(CalculationError::Overflow {
            operation: format!("gas {} × {} bps", estimate, multiplier_bps),
        })
    })?;

    Ok(buffered.max(estimate))
}
