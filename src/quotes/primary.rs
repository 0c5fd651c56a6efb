//! GalaChain DEX quote provider (primary venue)
//!
//! Computes a route through the venue's own pool-state endpoint: a
//! per-hop fixed fee charged in `Ref` plus the pool's own fee tier.
//! MUST report `priceImpactBps` and `liquidity`.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::{ExecutionError, QuoteError};
use crate::executor::{LegOutcome, SwapExecutor};
use crate::inventory::BalanceProvider;
use crate::money::Money;
use crate::types::{Op, Quote, Venue};

use super::{QuoteProvider, DEFAULT_QUOTE_TTL_SECS};

/// Flat per-hop fee the primary DEX charges, denominated in `Ref`. This
/// models routing cost that isn't captured by the pool's own fee tier.
pub const PRIMARY_HOP_FEE_REF: &str = "0.01";

#[derive(Debug, Deserialize)]
struct GalaChainQuoteResponse {
    price: String,
    price_impact_bps: i64,
    min_output: String,
    liquidity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GalaChainSwapResponse {
    tx_id: String,
    filled_amount: String,
}

pub struct PrimaryQuoteProvider {
    endpoint: String,
    http: reqwest::Client,
    ttl_secs: i64,
    signer: String,
}

impl PrimaryQuoteProvider {
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

    fn hop_fee(&self) -> Money {
        PRIMARY_HOP_FEE_REF.parse().expect("constant parses")
    }

    async fn fetch(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
    ) -> Result<GalaChainQuoteResponse, QuoteError> {
        let url = format!("{}/v1/trade/quote", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("tokenIn", symbol),
                ("tokenOut", quote_currency),
                ("side", if op == Op::Buy { "buy" } else { "sell" }),
                ("amount", &trade_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteError::Network(format!("status {}", response.status())));
        }

        let body: GalaChainQuoteResponse = response
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
        raw: GalaChainQuoteResponse,
    ) -> Result<Quote, QuoteError> {
        if raw.price_impact_bps < 0 {
            return Err(QuoteError::Malformed("negative price impact".to_string()));
        }

        let price: Money = raw
            .price
            .parse()
            .map_err(|_| QuoteError::Malformed(format!("unparseable price: {}", raw.price)))?;
        if !price.is_positive() {
            return Err(QuoteError::NoRoute);
        }

        let min_output: Money = raw
            .min_output
            .parse()
            .map_err(|_| QuoteError::Malformed(format!("unparseable minOutput: {}", raw.min_output)))?;

        let liquidity = raw
            .liquidity
            .as_deref()
            .and_then(|s| s.parse::<Money>().ok());

        let now = Utc::now();
        Ok(Quote {
            venue: Venue::Primary,
            symbol: symbol.to_string(),
            side: op,
            trade_size,
            quote_currency: quote_currency.to_string(),
            price,
            price_impact_bps: raw.price_impact_bps,
            min_output,
            fees: self.hop_fee(),
            timestamp: now,
            expires_at: now + chrono::Duration::seconds(self.ttl_secs),
            liquidity,
        })
    }
}

#[async_trait]
impl QuoteProvider for PrimaryQuoteProvider {
    fn venue(&self) -> Venue {
        Venue::Primary
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
impl SwapExecutor for PrimaryQuoteProvider {
    async fn submit_swap(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
        slippage_bps: i64,
    ) -> Result<LegOutcome, ExecutionError> {
        let url = format!("{}/v1/trade/execute", self.endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[
                ("tokenIn", symbol),
                ("tokenOut", quote_currency),
                ("side", if op == Op::Buy { "buy" } else { "sell" }),
                ("amount", &trade_size.to_string()),
                ("slippageBps", &slippage_bps.to_string()),
                ("signer", &self.signer),
            ])
            .send()
            .await
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExecutionError::Rejected(format!("status {}", response.status())));
        }

        let body: GalaChainSwapResponse = response
            .json()
            .await
            .map_err(|e| ExecutionError::Rejected(e.to_string()))?;

        let actual_amount: Money = body
            .filled_amount
            .parse()
            .map_err(|_| ExecutionError::Rejected(format!("unparseable filledAmount: {}", body.filled_amount)))?;

        Ok(LegOutcome { txid: body.tx_id, actual_amount })
    }
}

#[derive(Debug, Deserialize)]
struct GalaChainBalanceResponse {
    balance: String,
}

#[async_trait]
impl BalanceProvider for PrimaryQuoteProvider {
    fn venue(&self) -> Venue {
        Venue::Primary
    }

    async fn get_balance(&self, mint: &str, _decimals: u8) -> Result<u128, String> {
        let url = format!("{}/v1/balance", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("token", mint), ("owner", &self.signer)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body: GalaChainBalanceResponse = response.json().await.map_err(|e| e.to_string())?;
        body.balance.parse().map_err(|_| format!("unparseable balance: {}", body.balance))
    }

    async fn get_native_balance(&self) -> Result<Money, String> {
        let url = format!("{}/v1/balance/native", self.endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("owner", &self.signer)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body: GalaChainBalanceResponse = response.json().await.map_err(|e| e.to_string())?;
        body.balance.parse().map_err(|_| format!("unparseable balance: {}", body.balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> PrimaryQuoteProvider {
        PrimaryQuoteProvider::new("https://example.invalid")
    }

    #[test]
    fn build_quote_rejects_zero_price() {
        let raw = GalaChainQuoteResponse {
            price: "0".to_string(),
            price_impact_bps: 10,
            min_output: "100".to_string(),
            liquidity: None,
        };
        let result = provider().build_quote("T", Money::from_i64(1), Op::Sell, "REF", raw);
        assert!(matches!(result, Err(QuoteError::NoRoute)));
    }

    #[test]
    fn build_quote_rejects_negative_impact() {
        let raw = GalaChainQuoteResponse {
            price: "1.5".to_string(),
            price_impact_bps: -1,
            min_output: "100".to_string(),
            liquidity: None,
        };
        let result = provider().build_quote("T", Money::from_i64(1), Op::Sell, "REF", raw);
        assert!(matches!(result, Err(QuoteError::Malformed(_))));
    }

    #[test]
    fn build_quote_happy_path_sets_expiry_after_timestamp() {
        let raw = GalaChainQuoteResponse {
            price: "0.001234".to_string(),
            price_impact_bps: 25,
            min_output: "1850".to_string(),
            liquidity: Some("5000".to_string()),
        };
        let quote = provider()
            .build_quote("T", Money::from_i64(1500), Op::Sell, "REF", raw)
            .unwrap();
        assert!(quote.is_well_formed());
        assert_eq!(quote.venue, Venue::Primary);
        assert!(quote.liquidity.is_some());
    }
}
