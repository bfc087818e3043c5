//! # Route Quotes Module
//!
//! Read-only pricing of swaps along configured paths.
//!
//! ## Architecture
//! - **routes/**: `SwapPath` and the `SwapRouteConfig` that declares buy/sell paths
//! - **quotes/**: `QuoteEngine` for trade quotes and one-unit price estimates
//! - **reserves/**: display price from pair reserves and a bridge quote

pub mod quotes;
pub mod reserves;
pub mod routes;
