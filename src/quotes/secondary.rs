//! Jupiter aggregator quote provider (secondary venue, Solana)
//!
//! Issues the exact-in/exact-out request appropriate to the requested
//! operation:
//! - `op=buy`  -> exact-out (receive `tradeSize` units of the token)
//! - `op=sell` -> exact-in  (spend `tradeSize` units of the token)
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::{ExecutionError, QuoteError};
use crate::executor::{LegOutcome, SwapExecutor};
use crate::inventory::BalanceProvider;
use crate::money::Money;
use crate::types::{Op, Quote, Venue};

use super::{QuoteProvider, DEFAULT_QUOTE_TTL_SECS};

#[derive(Debug, Deserialize)]
struct JupiterQuoteResponse {
    in_amount: String,
    out_amount: String,
    price_impact_pct: String,
}

#[derive(Debug, Deserialize)]
struct JupiterSwapResponse {
    signature: String,
    out_amount: String,
}

pub struct SecondaryQuoteProvider {
    endpoint: String,
    http: reqwest::Client,
    ttl_secs: i64,
    signer: String,
}

impl SecondaryQuoteProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
            ttl_secs: DEFAULT_QUOTE_TTL_SECS,
            signer: String::new(),
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signer = signer.into();
        self
    }

    fn swap_mode(op: Op) -> &'static str {
        match op {
            Op::Buy => "ExactOut",
            Op::Sell => "ExactIn",
        }
    }

    async fn fetch(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
    ) -> Result<JupiterQuoteResponse, QuoteError> {
        let (input_mint, output_mint, amount) = match op {
            Op::Buy => (quote_currency, symbol, trade_size),
            Op::Sell => (symbol, quote_currency, trade_size),
        };

        let url = format!("{}/v6/quote", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", &amount.to_raw(0).to_string()),
                ("swapMode", Self::swap_mode(op)),
            ])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteError::Network(format!("status {}", response.status())));
        }

        let body: JupiterQuoteResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        Ok(body)
    }

    fn build_quote(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
        raw: JupiterQuoteResponse,
    ) -> Result<Quote, QuoteError> {
        let in_amount: Decimal = raw
            .in_amount
            .parse()
            .map_err(|_| QuoteError::Malformed(format!("unparseable inAmount: {}", raw.in_amount)))?;
        let out_amount: Decimal = raw
            .out_amount
            .parse()
            .map_err(|_| QuoteError::Malformed(format!("unparseable outAmount: {}", raw.out_amount)))?;

        if in_amount <= Decimal::ZERO || out_amount <= Decimal::ZERO {
            return Err(QuoteError::NoRoute);
        }

        // Price is always quoteCurrency per unit of `symbol`, regardless
        // of which side of the swap the aggregator treats as input.
        let price = match op {
            Op::Buy => Money::new(in_amount / out_amount),
            Op::Sell => Money::new(out_amount / in_amount),
        };

        let price_impact_pct: Decimal = raw
            .price_impact_pct
            .parse()
            .map_err(|_| QuoteError::Malformed(format!("unparseable priceImpactPct: {}", raw.price_impact_pct)))?;
        let price_impact_bps = (price_impact_pct * Decimal::from(100))
            .round()
            .to_string()
            .parse::<i64>()
            .unwrap_or(0)
            .max(0);

        let min_output = match op {
            Op::Buy => trade_size,
            Op::Sell => Money::new(out_amount),
        };

        let now = Utc::now();
        Ok(Quote {
            venue: Venue::Secondary,
            symbol: symbol.to_string(),
            side: op,
            trade_size,
            quote_currency: quote_currency.to_string(),
            price,
            price_impact_bps,
            min_output,
            fees: Money::ZERO,
            timestamp: now,
            expires_at: now + chrono::Duration::seconds(self.ttl_secs),
            liquidity: None,
        })
    }
}

#[async_trait]
impl QuoteProvider for SecondaryQuoteProvider {
    fn venue(&self) -> Venue {
        Venue::Secondary
    }

    async fn get_quote(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
    ) -> Result<Quote, QuoteError> {
        let raw = self.fetch(symbol, trade_size, op, quote_currency).await?;
        self.build_quote(symbol, trade_size, op, quote_currency, raw)
    }
}

#[async_trait]
impl SwapExecutor for SecondaryQuoteProvider {
    async fn submit_swap(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
        slippage_bps: i64,
    ) -> Result<LegOutcome, ExecutionError> {
        let (input_mint, output_mint, amount) = match op {
            Op::Buy => (quote_currency, symbol, trade_size),
            Op::Sell => (symbol, quote_currency, trade_size),
        };

        let url = format!("{}/v6/swap", self.endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", &amount.to_raw(0).to_string()),
                ("swapMode", Self::swap_mode(op)),
                ("slippageBps", &slippage_bps.to_string()),
                ("userPublicKey", &self.signer),
            ])
            .send()
            .await
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExecutionError::Rejected(format!("status {}", response.status())));
        }

        let body: JupiterSwapResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;

        let actual_amount: Money = body
            .out_amount
            .parse()
            .map_err(|_| ExecutionError::Rejected(format!("unparseable outAmount: {}", body.out_amount)))?;

        Ok(LegOutcome { txid: body.signature, actual_amount })
    }
}

#[derive(Debug, Deserialize)]
struct SolanaBalanceResponse {
    amount: String,
}

#[async_trait]
impl BalanceProvider for SecondaryQuoteProvider {
    fn venue(&self) -> Venue {
        Venue::Secondary
    }

    async fn get_balance(&self, mint: &str, _decimals: u8) -> Result<u128, String> {
        let url = format!("{}/v1/token-balance", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("mint", mint), ("owner", &self.signer)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body: SolanaBalanceResponse = response.json().await.map_err(|e| e.to_string())?;
        body.amount.parse().map_err(|_| format!("unparseable amount: {}", body.amount))
    }

    async fn get_native_balance(&self) -> Result<Money, String> {
        let url = format!("{}/v1/sol-balance", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("owner", &self.signer)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body: SolanaBalanceResponse = response.json().await.map_err(|e| e.to_string())?;
        body.amount.parse().map_err(|_| format!("unparseable amount: {}", body.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SecondaryQuoteProvider {
        SecondaryQuoteProvider::new("https://example.invalid")
    }

    #[test]
    fn swap_mode_matches_op() {
        assert_eq!(SecondaryQuoteProvider::swap_mode(Op::Buy), "ExactOut");
        assert_eq!(SecondaryQuoteProvider::swap_mode(Op::Sell), "ExactIn");
    }

    #[test]
    fn build_quote_rejects_zero_amounts() {
        let raw = JupiterQuoteResponse {
            in_amount: "0".to_string(),
            out_amount: "100".to_string(),
            price_impact_pct: "0.1".to_string(),
        };
        let result = provider().build_quote("T", Money::from_i64(1), Op::Sell, "SOL", raw);
        assert!(matches!(result, Err(QuoteError::NoRoute)));
    }

    #[test]
    fn build_quote_sell_prices_output_per_input() {
        let raw = JupiterQuoteResponse {
            in_amount: "1500".to_string(),
            out_amount: "0.1206".to_string(),
            price_impact_pct: "0.15".to_string(),
        };
        let quote = provider()
            .build_quote("T", Money::from_i64(1500), Op::Sell, "SOL", raw)
            .unwrap();
        assert_eq!(quote.price_impact_bps, 15);
        assert!(quote.price.is_positive());
        assert!(quote.is_well_formed());
    }
}
