//! Reserve-based display price
//!
//! Prices the base token from raw pair reserves and a router quote for one
//! bridge token: `bridge_reserve / base_reserve × bridge_price`.
//! The result is for display only. It never feeds a minimum-out bound,
//! which always comes from a fresh router quote.

use candid::Nat;
use rust_decimal::Decimal;
use tracing::debug;
use crate::infrastructure::{Result, IntentError, CalculationError};
use crate::types::{Address, Token};
use crate::_2_CHAIN_STATE::ledger::LedgerClient;
use crate::_2_CHAIN_STATE::read_with_retries;
use crate::_3_ROUTE_QUOTES::quotes::{nat_to_decimal, QuoteEngine};
use crate::_3_ROUTE_QUOTES::routes::SwapPath;

/// Combine pair reserves with a bridge price
///
/// Zero when either reserve is empty.
pub fn cross_rate(
    base_reserve: &Nat,
    base_decimals: u8,
    bridge_reserve: &Nat,
    bridge_decimals: u8,
    bridge_price: Decimal,
) -> Result<Decimal> {
    let base = nat_to_decimal(base_reserve, base_decimals)?;
    let bridge = nat_to_decimal(bridge_reserve, bridge_decimals)?;

    if base.is_zero() || bridge.is_zero() {
        return Ok(Decimal::ZERO);
    }

    bridge
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(bridge_price))
        .map(|price| price.normalize())
        .ok_or_else(|| {
            IntentError::Calculation(CalculationError::Overflow {
                operation: format!("cross rate {} / {} × {}", bridge, base, bridge_price),
            })
        })
}

/// Read reserves and the bridge quote together and derive the base price
#[allow(clippy::too_many_arguments)]
pub async fn reserve_cross_rate(
    ledger: &dyn LedgerClient,
    engine: &QuoteEngine<'_>,
    pair: &Address,
    base: &Token,
    base_is_token0: bool,
    bridge_path: &SwapPath,
    retries: u8,
    now: u64,
) -> Result<Decimal> {
    let reserves = read_with_retries("reserves", retries, move || ledger.read_reserves(pair));
    let bridge_price = engine.price_estimate(bridge_path, now);
    let (reserves, bridge_price) = futures::join!(reserves, bridge_price);

    let (reserve0, reserve1) = reserves?;
    let bridge_price = bridge_price?;
    let (base_reserve, bridge_reserve) = if base_is_token0 {
        (reserve0, reserve1)
    } else {
        (reserve1, reserve0)
    };

    let price = cross_rate(
        &base_reserve,
        base.decimals,
        &bridge_reserve,
        bridge_path.input().decimals,
        bridge_price,
    )?;

    debug!(
        "📊 {} reserve price: {} {} (bridge {} @ {})",
        base.symbol,
        price,
        bridge_path.output().symbol,
        bridge_path.input().symbol,
        bridge_price
    );

    Ok(price)
}
