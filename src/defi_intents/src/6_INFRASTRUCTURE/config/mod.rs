//! # Deployment Configuration
//!
//! Everything deployment-specific lives here: accepted tokens, target
//! contracts per intent kind, the swap router and its paths, and the numeric
//! policies (slippage floor, gas buffer, deadline, timeouts, retries).
//!
//! The struct is immutable once built. Load it with [`OrchestratorConfig::from_json`],
//! which validates before returning, then share it behind an `Arc`.

use candid::{CandidType, Deserialize};
use serde::Serialize;
use std::collections::HashSet;
use crate::infrastructure::{Result, IntentError, ValidationError};
use crate::infrastructure::constants::*;
use crate::types::{Address, IntentKind, SwapDirection, Token};
use crate::_3_ROUTE_QUOTES::routes::{SwapPath, SwapRouteConfig};

/// Spender contract of an amount-taking intent
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ActionTarget {
    /// Symbol of the token the contract pulls
    pub token: String,
    pub contract: Address,
}

#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimTarget {
    pub contract: Address,
    /// Token whose balance changes when rewards are claimed
    pub reward_token: String,
}

fn default_gas_multiplier_bps() -> u32 {
    DEFAULT_GAS_LIMIT_MULTIPLIER_BPS
}

fn default_gas_buffered_kinds() -> Vec<IntentKind> {
    vec![IntentKind::Deposit]
}

fn default_deadline_secs() -> u64 {
    DEFAULT_EXECUTION_DEADLINE_SECS
}

fn default_requote_after_secs() -> u64 {
    DEFAULT_REQUOTE_AFTER_SECS
}

fn default_confirmation_timeout_secs() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECS
}

fn default_read_retries() -> u8 {
    DEFAULT_READ_RETRIES
}

#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Label used in logs only
    pub network: String,
    pub tokens: Vec<Token>,
    pub deposit: ActionTarget,
    pub stake: ActionTarget,
    pub claim: ClaimTarget,
    pub swap: SwapRouteConfig,
    /// Primary-step gas limit as a fraction of the estimate (12_000 = ×1.2)
    #[serde(default = "default_gas_multiplier_bps")]
    pub gas_limit_multiplier_bps: u32,
    /// Kinds whose primary step gets an explicit buffered gas limit
    #[serde(default = "default_gas_buffered_kinds")]
    pub gas_buffered_kinds: Vec<IntentKind>,
    #[serde(default = "default_deadline_secs")]
    pub execution_deadline_secs: u64,
    /// A swap quote older than this at primary submission is taken again
    #[serde(default = "default_requote_after_secs")]
    pub requote_after_secs: u64,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Extra attempts for a failed read
    #[serde(default = "default_read_retries")]
    pub read_retries: u8,
}

impl OrchestratorConfig {
    /// Parse and validate a JSON deployment file
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: OrchestratorConfig = serde_json::from_str(raw)
            .map_err(|e| IntentError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tokens.is_empty() {
            return Err(IntentError::invalid_config("tokens", "at least one token is required"));
        }

        let mut symbols = HashSet::new();
        let mut addresses = HashSet::new();
        for token in &self.tokens {
            if !symbols.insert(token.symbol.as_str()) {
                return Err(IntentError::invalid_config("tokens", format!("duplicate symbol {}", token.symbol)));
            }
            if !addresses.insert(&token.address) {
                return Err(IntentError::invalid_config("tokens", format!("duplicate address {}", token.address)));
            }
            if token.decimals > 77 {
                // 10^78 > 2^256
                return Err(IntentError::invalid_config(
                    "tokens",
                    format!("{} declares {} decimals", token.symbol, token.decimals),
                ));
            }
        }

        self.token(&self.deposit.token)?;
        self.token(&self.stake.token)?;
        self.token(&self.claim.reward_token)?;

        let buy = self.swap_path(SwapDirection::Buy)?;
        let sell = self.swap_path(SwapDirection::Sell)?;
        if buy.input().address != sell.output().address || buy.output().address != sell.input().address {
            return Err(IntentError::invalid_config("swap", "sell path must reverse the buy path endpoints"));
        }
        self.swap.slippage()?;

        if let Some(pair) = &self.swap.price_pair {
            self.token(&pair.base_token)?;
            self.price_bridge_path()?;
        }

        if self.gas_limit_multiplier_bps < BPS_DENOMINATOR {
            return Err(IntentError::invalid_config(
                "gas_limit_multiplier_bps",
                format!("{} would lower the estimate", self.gas_limit_multiplier_bps),
            ));
        }
        if self.execution_deadline_secs == 0 {
            return Err(IntentError::invalid_config("execution_deadline_secs", "must be positive"));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(IntentError::invalid_config("confirmation_timeout_secs", "must be positive"));
        }

        Ok(())
    }

    /// Accepted token by symbol
    pub fn token(&self, symbol: &str) -> Result<&Token> {
        self.tokens
            .iter()
            .find(|t| t.symbol == symbol)
            .ok_or_else(|| IntentError::Validation(ValidationError::UnknownToken { symbol: symbol.to_string() }))
    }

    pub fn resolve_path(&self, symbols: &[String]) -> Result<SwapPath> {
        let tokens = symbols
            .iter()
            .map(|s| self.token(s).cloned())
            .collect::<Result<Vec<_>>>()?;
        SwapPath::new(tokens)
    }

    pub fn swap_path(&self, direction: SwapDirection) -> Result<SwapPath> {
        self.resolve_path(self.swap.path_symbols(direction))
    }

    /// Router path pricing one bridge token in the quote token
    pub fn price_bridge_path(&self) -> Result<SwapPath> {
        let pair = self
            .swap
            .price_pair
            .as_ref()
            .ok_or_else(|| IntentError::invalid_config("swap.price_pair", "not configured"))?;
        self.resolve_path(&[pair.bridge_token.clone(), pair.quote_token.clone()])
    }

    pub fn gas_buffered(&self, kind: IntentKind) -> bool {
        self.gas_buffered_kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "network": "bsc",
        "tokens": [
            { "symbol": "USDT", "address": "0x00000000000000000000000000000000000000a1", "decimals": 18 },
            { "symbol": "WBTC", "address": "0x00000000000000000000000000000000000000a2", "decimals": 8 },
            { "symbol": "KDIA", "address": "0x00000000000000000000000000000000000000a3", "decimals": 18 }
        ],
        "deposit": { "token": "USDT", "contract": "0x00000000000000000000000000000000000000d1" },
        "stake": { "token": "KDIA", "contract": "0x00000000000000000000000000000000000000d2" },
        "claim": { "contract": "0x00000000000000000000000000000000000000d1", "reward_token": "KDIA" },
        "swap": {
            "router": "0x00000000000000000000000000000000000000fe",
            "buy_path": ["USDT", "WBTC", "KDIA"],
            "sell_path": ["KDIA", "WBTC", "USDT"],
            "price_pair": {
                "pair": "0x00000000000000000000000000000000000000f1",
                "base_token": "KDIA",
                "bridge_token": "WBTC",
                "quote_token": "USDT"
            }
        }
    }"#;

    #[test]
    fn test_defaults_applied() {
        let config = OrchestratorConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.gas_limit_multiplier_bps, 12_000);
        assert_eq!(config.execution_deadline_secs, 1_200);
        assert_eq!(config.swap.slippage_floor_bps, 9_800);
        assert_eq!(config.read_retries, 2);
        assert!(config.gas_buffered(IntentKind::Deposit));
        assert!(!config.gas_buffered(IntentKind::Stake));
        assert!(config.swap.price_pair.as_ref().unwrap().base_is_token0);
    }

    #[test]
    fn test_paths_resolve() {
        let config = OrchestratorConfig::from_json(SAMPLE).unwrap();
        let buy = config.swap_path(SwapDirection::Buy).unwrap();
        assert_eq!(buy.symbols(), vec!["USDT", "WBTC", "KDIA"]);
        let bridge = config.price_bridge_path().unwrap();
        assert_eq!(bridge.symbols(), vec!["WBTC", "USDT"]);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let raw = SAMPLE.replace(r#""token": "KDIA""#, r#""token": "DOGE""#);
        let err = OrchestratorConfig::from_json(&raw).unwrap_err();
        assert_eq!(err, IntentError::Validation(ValidationError::UnknownToken { symbol: "DOGE".to_string() }));
    }

    #[test]
    fn test_bad_slippage_rejected() {
        let raw = SAMPLE.replace(r#""router":"#, r#""slippage_floor_bps": 0, "router":"#);
        assert!(OrchestratorConfig::from_json(&raw).is_err());
    }

    #[test]
    fn test_gas_multiplier_below_one_rejected() {
        let mut config = OrchestratorConfig::from_json(SAMPLE).unwrap();
        config.gas_limit_multiplier_bps = 9_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = OrchestratorConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, IntentError::Validation(ValidationError::InvalidConfig { .. })));
    }
}
