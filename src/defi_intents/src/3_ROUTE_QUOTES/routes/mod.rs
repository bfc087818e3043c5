//! # Swap Routes
//!
//! Path topology is configuration, not code. A deployment describes its buy
//! and sell paths (1, 2 or 3 hops) in a `SwapRouteConfig`; the same quote and
//! swap code serves every topology.

use candid::{CandidType, Deserialize};
use serde::Serialize;
use std::collections::HashSet;
use crate::infrastructure::{Result, IntentError, ValidationError};
use crate::infrastructure::constants::DEFAULT_SWAP_SLIPPAGE_FLOOR_BPS;
use crate::types::{Address, SwapDirection, Token};
use crate::_4_TRADING_EXECUTION::slippage::SlippageTolerance;

/// Ordered, pairwise-distinct tokens a trade routes through
///
/// Consecutive tokens are assumed to share a pool; that is only ever checked
/// by the venue returning a non-zero quote.
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SwapPath {
    tokens: Vec<Token>,
}

impl SwapPath {
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        if tokens.len() < 2 {
            return Err(IntentError::Validation(ValidationError::InvalidPath {
                reason: format!("path needs at least 2 tokens, got {}", tokens.len()),
            }));
        }

        let mut seen = HashSet::new();
        for token in &tokens {
            if !seen.insert(token.address.clone()) {
                return Err(IntentError::Validation(ValidationError::InvalidPath {
                    reason: format!("{} appears more than once", token.symbol),
                }));
            }
        }

        Ok(Self { tokens })
    }

    pub fn input(&self) -> &Token {
        &self.tokens[0]
    }

    pub fn output(&self) -> &Token {
        &self.tokens[self.tokens.len() - 1]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn hops(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|t| t.address.clone()).collect()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.symbol.clone()).collect()
    }
}

fn default_slippage_floor_bps() -> u32 {
    DEFAULT_SWAP_SLIPPAGE_FLOOR_BPS
}

/// Pool used for the reserve-based display price
///
/// `base_token` is priced in `quote_token` through `bridge_token`:
/// the pair holds base/bridge reserves, the router prices one bridge token.
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PricePairConfig {
    pub pair: Address,
    pub base_token: String,
    pub bridge_token: String,
    pub quote_token: String,
    /// Whether reserve0 of the pair is the base token
    #[serde(default = "default_true")]
    pub base_is_token0: bool,
}

fn default_true() -> bool {
    true
}

#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SwapRouteConfig {
    pub router: Address,
    /// Symbols from the paying asset to the traded token
    pub buy_path: Vec<String>,
    /// Symbols from the traded token back to the paying asset
    pub sell_path: Vec<String>,
    /// Fraction of the quoted output accepted as a floor
    #[serde(default = "default_slippage_floor_bps")]
    pub slippage_floor_bps: u32,
    #[serde(default)]
    pub price_pair: Option<PricePairConfig>,
}

impl SwapRouteConfig {
    pub fn path_symbols(&self, direction: SwapDirection) -> &[String] {
        match direction {
            SwapDirection::Buy => &self.buy_path,
            SwapDirection::Sell => &self.sell_path,
        }
    }

    pub fn slippage(&self) -> Result<SlippageTolerance> {
        SlippageTolerance::from_floor_bps(self.slippage_floor_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, last: u8) -> Token {
        Token {
            symbol: symbol.to_string(),
            address: format!("0x{:040x}", last).parse().unwrap(),
            decimals: 18,
        }
    }

    #[test]
    fn test_path_requires_two_tokens() {
        assert!(SwapPath::new(vec![token("USDT", 1)]).is_err());
        assert!(SwapPath::new(vec![]).is_err());
    }

    #[test]
    fn test_path_rejects_repeated_token() {
        let result = SwapPath::new(vec![token("USDT", 1), token("WBTC", 2), token("USDT", 1)]);
        assert!(matches!(result, Err(IntentError::Validation(ValidationError::InvalidPath { .. }))));
    }

    #[test]
    fn test_three_token_path() {
        let path = SwapPath::new(vec![token("USDT", 1), token("WBTC", 2), token("KDIA", 3)]).unwrap();
        assert_eq!(path.hops(), 2);
        assert_eq!(path.input().symbol, "USDT");
        assert_eq!(path.output().symbol, "KDIA");
        assert_eq!(path.symbols(), vec!["USDT", "WBTC", "KDIA"]);
    }
}
