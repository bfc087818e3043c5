//! # Swap Call Construction
//!
//! Builds the router call for a quoted swap.
//!
//! ## Swap Flow
//! 1. Reject empty quotes: a zero output is `NoLiquidityPath`
//! 2. Derive the minimum output from the quote and the tolerance; a bound
//!    that rounds down to zero is `NoLiquidityPath` too
//! 3. Stamp the deadline (`now + window`)
//! 4. Encode `swapExactTokensForTokensSupportingFeeOnTransferTokens`
//!
//! ## Key Constraints
//! - **Exact input**: the user's amount is spent in full
//! - **Fresh quote**: the call is only ever built from a quote taken for it
//! - **Fee-on-transfer safe**: the supporting-fee router entry point is used

use candid::Nat;
use tracing::{info, warn};
use crate::infrastructure::{Result, IntentError, TradingError};
use crate::types::{Address, CallFunction, ContractCall};
use crate::_3_ROUTE_QUOTES::quotes::Quote;
use super::slippage::{minimum_out, SlippageTolerance};

/// Router call plus the bound it encodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCall {
    pub call: ContractCall,
    pub min_out: Nat,
    pub deadline: u64,
}

/// Fail with `NoLiquidityPath` when the venue quoted nothing
pub fn ensure_liquidity(quote: &Quote) -> Result<()> {
    if quote.is_empty() {
        return Err(IntentError::Trading(TradingError::NoLiquidityPath {
            path: quote.path.symbols(),
            amount_in: quote.input.to_string(),
        }));
    }
    Ok(())
}

/// Build the router call for `quote`
///
/// ## Parameters
/// - `router`: venue router contract
/// - `quote`: fresh quote for exactly the amount being swapped
/// - `tolerance`: floor applied to the quoted output
/// - `recipient`: receiver of the output tokens (the user)
/// - `now` / `deadline_secs`: the call expires at `now + deadline_secs`
pub fn build_swap_call(
    router: &Address,
    quote: &Quote,
    tolerance: SlippageTolerance,
    recipient: &Address,
    now: u64,
    deadline_secs: u64,
) -> Result<SwapCall> {
    if quote.input.is_zero() {
        return Err(IntentError::Trading(TradingError::InvalidSwapAmount {
            reason: "input amount cannot be zero".to_string(),
        }));
    }
    ensure_liquidity(quote)?;

    let min_out = minimum_out(quote, tolerance)?;
    if min_out == Nat::from(0u64) {
        warn!(
            "⚠️ Quoted {} {} leaves no minimum at {} bps",
            quote.output.magnitude.0,
            quote.output.token.symbol,
            tolerance.floor_bps()
        );
        return Err(IntentError::Trading(TradingError::NoLiquidityPath {
            path: quote.path.symbols(),
            amount_in: quote.input.to_string(),
        }));
    }
    let deadline = now.saturating_add(deadline_secs);

    info!(
        "🔄 Swap {} -> min {} {} (quoted {}, floor {} bps, deadline {})",
        quote.input,
        min_out.0,
        quote.output.token.symbol,
        quote.output.magnitude.0,
        tolerance.floor_bps(),
        deadline
    );

    Ok(SwapCall {
        call: ContractCall {
            to: router.clone(),
            function: CallFunction::SwapExactTokensForTokens {
                amount_in: quote.input.magnitude.clone(),
                amount_out_min: min_out.clone(),
                path: quote.path.addresses(),
                recipient: recipient.clone(),
                deadline,
            },
        },
        min_out,
        deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Token, TokenAmount};
    use crate::_3_ROUTE_QUOTES::routes::SwapPath;

    fn token(symbol: &str, last: u8) -> Token {
        Token {
            symbol: symbol.to_string(),
            address: format!("0x{:040x}", last).parse().unwrap(),
            decimals: 18,
        }
    }

    fn quote(output: u128) -> Quote {
        let path = SwapPath::new(vec![token("USDT", 1), token("WBTC", 2), token("KDIA", 3)]).unwrap();
        Quote {
            input: TokenAmount::new(token("USDT", 1), Nat::from(10_000_000_000_000_000_000u128)),
            output: TokenAmount::new(token("KDIA", 3), Nat::from(output)),
            hop_amounts: vec![],
            path,
            quoted_at: 1_000,
        }
    }

    #[test]
    fn test_swap_call_fields() {
        let router: Address = format!("0x{:040x}", 0xfe).parse().unwrap();
        let user: Address = format!("0x{:040x}", 0x42).parse().unwrap();
        let tolerance = SlippageTolerance::from_floor_bps(9_800).unwrap();

        let swap = build_swap_call(&router, &quote(4_950_000_000_000_000_000), tolerance, &user, 1_000, 1_200)
            .unwrap();
        assert_eq!(swap.min_out, Nat::from(4_851_000_000_000_000_000u128));
        assert_eq!(swap.deadline, 2_200);
        match swap.call.function {
            CallFunction::SwapExactTokensForTokens { path, recipient, deadline, .. } => {
                assert_eq!(path.len(), 3);
                assert_eq!(recipient, user);
                assert_eq!(deadline, 2_200);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_zero_quote_is_no_liquidity() {
        let router: Address = format!("0x{:040x}", 0xfe).parse().unwrap();
        let tolerance = SlippageTolerance::from_floor_bps(9_800).unwrap();
        let err = build_swap_call(&router, &quote(0), tolerance, &router, 0, 1_200).unwrap_err();
        assert!(err.is_liquidity_warning());
    }

    #[test]
    fn test_dust_quote_never_gives_zero_minimum() {
        let router: Address = format!("0x{:040x}", 0xfe).parse().unwrap();
        let tolerance = SlippageTolerance::from_floor_bps(9_800).unwrap();

        // 1 * 0.98 floors to 0
        let err = build_swap_call(&router, &quote(1), tolerance, &router, 0, 1_200).unwrap_err();
        assert!(err.is_liquidity_warning());

        // 2 * 0.98 floors to 1
        let swap = build_swap_call(&router, &quote(2), tolerance, &router, 0, 1_200).unwrap();
        assert_eq!(swap.min_out, Nat::from(1u64));
    }
}
