use candid::{CandidType, Deserialize, Nat};
use serde::Serialize;
use std::fmt;
use crate::infrastructure::{Result, IntentError, CalculationError, ValidationError};
use crate::infrastructure::math::{to_base_units, to_display_string};
use super::chain::Address;

/// Accepted token as declared in deployment configuration
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl Token {
    /// Same on-chain asset at the same precision
    pub fn same_unit(&self, other: &Token) -> bool {
        self.address == other.address && self.decimals == other.decimals
    }

    /// One whole token (10^decimals base units)
    pub fn one_unit(&self) -> TokenAmount {
        TokenAmount {
            token: self.clone(),
            magnitude: Nat::from(crate::infrastructure::math::pow10(self.decimals as u32)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Integer amount of a token at its declared precision
///
/// Only ever built from an exact decimal parse or an integer read from the
/// chain, never from floating point.
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub token: Token,
    pub magnitude: Nat,
}

impl TokenAmount {
    pub fn new(token: Token, magnitude: Nat) -> Self {
        Self { token, magnitude }
    }

    /// Parse user input such as `"10.5"` at the token's precision
    pub fn parse(token: &Token, input: &str) -> Result<Self> {
        let magnitude = to_base_units(input, token.decimals)?;
        Ok(Self { token: token.clone(), magnitude })
    }

    pub fn to_display_string(&self) -> String {
        to_display_string(&self.magnitude, self.token.decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == Nat::from(0u64)
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount> {
        self.ensure_same_unit(other)?;
        Ok(TokenAmount {
            token: self.token.clone(),
            magnitude: self.magnitude.clone() + other.magnitude.clone(),
        })
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount> {
        self.ensure_same_unit(other)?;
        if other.magnitude > self.magnitude {
            return Err(IntentError::Calculation(CalculationError::Underflow {
                operation: format!("{} - {}", self, other),
            }));
        }
        Ok(TokenAmount {
            token: self.token.clone(),
            magnitude: Nat::from(&self.magnitude.0 - &other.magnitude.0),
        })
    }

    /// Fails with `InsufficientBalance` when `available` cannot cover `self`
    pub fn ensure_covered_by(&self, available: &Nat) -> Result<()> {
        if available < &self.magnitude {
            return Err(IntentError::Validation(ValidationError::InsufficientBalance {
                token: self.token.symbol.clone(),
                required: self.to_display_string(),
                available: to_display_string(available, self.token.decimals),
            }));
        }
        Ok(())
    }

    fn ensure_same_unit(&self, other: &TokenAmount) -> Result<()> {
        if !self.token.same_unit(&other.token) {
            return Err(IntentError::Calculation(CalculationError::MismatchedTokens {
                left: format!("{} ({} dp)", self.token.symbol, self.token.decimals),
                right: format!("{} ({} dp)", other.token.symbol, other.token.decimals),
            }));
        }
        Ok(())
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_display_string(), self.token.symbol)
    }
}
