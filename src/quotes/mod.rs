//! Quote providers (C3)
//!
//! Capability: fetch an executable quote from a venue given
//! (symbol, size, direction, quote-currency). Each venue implements this
//! trait once; the strategy evaluator holds one `Arc<dyn QuoteProvider>`
//! per venue — no inheritance chain, per spec §9.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

pub mod primary;
pub mod secondary;

use async_trait::async_trait;

use crate::errors::QuoteError;
use crate::money::Money;
use crate::types::{Op, Quote, Venue};

pub use primary::PrimaryQuoteProvider;
pub use secondary::SecondaryQuoteProvider;

/// Default quote time-to-live applied by both providers when the venue
/// response doesn't specify one itself.
pub const DEFAULT_QUOTE_TTL_SECS: i64 = 30;

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn venue(&self) -> Venue;

    async fn get_quote(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
    ) -> Result<Quote, QuoteError>;
}
