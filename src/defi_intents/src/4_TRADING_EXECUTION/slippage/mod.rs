//! # Slippage Protection Module
//!
//! Turns a quoted output into the minimum the swap call will accept.
//!
//! ## Key Functions
//! - `minimum_out`: floor of `output × floor_bps / 10_000`
//!
//! ## Safety Checks
//! - Integer arithmetic only, rounding always towards zero
//! - Result never exceeds the quoted output
//! - A zero output gives a zero minimum; callers must refuse to submit it

use candid::{CandidType, Deserialize, Nat};
use serde::Serialize;
use crate::infrastructure::{Result, IntentError, TradingError};
use crate::infrastructure::constants::BPS_DENOMINATOR;
use crate::infrastructure::math::multiply_and_divide;
use crate::_3_ROUTE_QUOTES::quotes::Quote;

/// Accepted fraction of the quoted output, in basis points (`0 < bps ≤ 10_000`)
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageTolerance {
    floor_bps: u32,
}

impl SlippageTolerance {
    /// `9_800` accepts down to 98% of the quote
    pub fn from_floor_bps(floor_bps: u32) -> Result<Self> {
        if floor_bps == 0 || floor_bps > BPS_DENOMINATOR {
            return Err(IntentError::Trading(TradingError::InvalidSlippage { bps: floor_bps }));
        }
        Ok(Self { floor_bps })
    }

    /// For configurations written as "2% slippage" (`200`)
    pub fn from_max_slippage_bps(max_slippage_bps: u32) -> Result<Self> {
        if max_slippage_bps >= BPS_DENOMINATOR {
            return Err(IntentError::Trading(TradingError::InvalidSlippage {
                bps: BPS_DENOMINATOR.saturating_sub(max_slippage_bps),
            }));
        }
        Self::from_floor_bps(BPS_DENOMINATOR - max_slippage_bps)
    }

    pub fn floor_bps(&self) -> u32 {
        self.floor_bps
    }

    pub fn max_slippage_bps(&self) -> u32 {
        BPS_DENOMINATOR - self.floor_bps
    }
}

/// Calculate minimum acceptable output for a quote
///
/// ## Example
/// - Output: 4_950_000 base units
/// - Floor: 9_800 bps
/// - Result: 4_851_000
pub fn minimum_out(quote: &Quote, tolerance: SlippageTolerance) -> Result<Nat> {
    minimum_out_of(&quote.output.magnitude, tolerance)
}

/// Same bound applied to a raw magnitude
pub fn minimum_out_of(output: &Nat, tolerance: SlippageTolerance) -> Result<Nat> {
    multiply_and_divide(
        output,
        &Nat::from(tolerance.floor_bps),
        &Nat::from(BPS_DENOMINATOR),
    )
}
