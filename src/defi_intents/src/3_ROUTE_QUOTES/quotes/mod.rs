//! # Quote Engine
//!
//! Expected output of a trade along a path, straight from the venue.
//!
//! ## Rules
//! - One `read_quote` per quote. Nothing is cached: a quote describes a
//!   single instant and every submitted swap gets a fresh one.
//! - A zero output is a valid answer meaning "no liquidity along this path".
//!   The caller decides what to do with it.
//! - An empty response is not a zero quote, it is `StateUnavailable`.

use candid::Nat;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;
use crate::infrastructure::{Result, IntentError, CalculationError, StateError};
use crate::infrastructure::math::to_display_string;
use crate::types::{Address, TokenAmount};
use crate::_2_CHAIN_STATE::ledger::LedgerClient;
use crate::_2_CHAIN_STATE::read_with_retries;
use crate::_3_ROUTE_QUOTES::routes::SwapPath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub path: SwapPath,
    pub input: TokenAmount,
    pub output: TokenAmount,
    /// Amount at every hop, input first, output last
    pub hop_amounts: Vec<Nat>,
    /// Clock seconds when the venue answered
    pub quoted_at: u64,
}

impl Quote {
    /// Zero output: the venue found no liquidity for this trade
    pub fn is_empty(&self) -> bool {
        self.output.is_zero()
    }

    pub fn age_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.quoted_at)
    }
}

/// Router-backed quoting for one deployment
pub struct QuoteEngine<'a> {
    ledger: &'a dyn LedgerClient,
    router: &'a Address,
    retries: u8,
}

impl<'a> QuoteEngine<'a> {
    pub fn new(ledger: &'a dyn LedgerClient, router: &'a Address, retries: u8) -> Self {
        Self { ledger, router, retries }
    }

    /// Quote `input` along `path`
    ///
    /// `now` stamps the quote so the orchestrator can tell when it went stale.
    pub async fn quote(&self, path: &SwapPath, input: &TokenAmount, now: u64) -> Result<Quote> {
        if !input.token.same_unit(path.input()) {
            return Err(IntentError::Calculation(CalculationError::MismatchedTokens {
                left: input.token.symbol.clone(),
                right: path.input().symbol.clone(),
            }));
        }

        let addresses = path.addresses();
        let path_addresses = addresses.as_slice();
        let ledger = self.ledger;
        let router = self.router;
        let amount_in = &input.magnitude;
        let amounts = read_with_retries("quote", self.retries, move || {
            ledger.read_quote(router, path_addresses, amount_in)
        })
        .await?;

        let output = match amounts.last() {
            Some(last) => last.clone(),
            None => {
                return Err(IntentError::state_unavailable("quote", "venue returned no amounts"));
            }
        };

        if amounts.len() != path.tokens().len() {
            return Err(IntentError::State(StateError::MalformedResponse {
                read: "quote".to_string(),
                reason: format!("{} amounts for a {}-token path", amounts.len(), path.tokens().len()),
            }));
        }

        debug!(
            "💱 Quote {} -> {} {} via {}",
            input,
            to_display_string(&output, path.output().decimals),
            path.output().symbol,
            path.symbols().join("/")
        );

        Ok(Quote {
            path: path.clone(),
            input: input.clone(),
            output: TokenAmount::new(path.output().clone(), output),
            hop_amounts: amounts,
            quoted_at: now,
        })
    }

    /// Price of one whole input token in output tokens
    ///
    /// Display only. A failed or stale estimate never blocks a trade.
    pub async fn price_estimate(&self, path: &SwapPath, now: u64) -> Result<Decimal> {
        let one = path.input().one_unit();
        let quote = self.quote(path, &one, now).await?;
        nat_to_decimal(&quote.output.magnitude, quote.output.token.decimals)
    }
}

/// Exact conversion of a base-unit magnitude into a display decimal
pub fn nat_to_decimal(magnitude: &Nat, decimals: u8) -> Result<Decimal> {
    let text = to_display_string(magnitude, decimals);
    Decimal::from_str(&text).map_err(|e| {
        IntentError::Calculation(CalculationError::Overflow {
            operation: format!("decimal conversion of {}: {}", text, e),
        })
    })
}
