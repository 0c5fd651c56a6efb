//! USD price oracle
//!
//! Backs the rate converter's USD-cross resolution path and the edge
//! calculator's bridge-cost amortisation. Caches fetched prices with a
//! TTL, the same shape as the teacher's pool-state-derived price oracle,
//! except unknown/unfetchable prices are never silently defaulted — the
//! caller gets `Err(OracleUnavailable)` and decides whether a configured
//! fallback applies.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::errors::RateError;
use crate::money::Money;

const STABLECOINS: &[&str] = &["USDC", "USDT"];

struct PriceCache {
    prices: HashMap<String, Money>,
    last_updated: Option<Instant>,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self { prices: HashMap::new(), last_updated: None }
    }
}

pub struct PriceOracle {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    cache: RwLock<PriceCache>,
    cache_ttl: Duration,
}

impl PriceOracle {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            cache: RwLock::new(PriceCache::default()),
            cache_ttl: Duration::from_secs(60),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn cached(&self, symbol: &str) -> Option<Money> {
        let symbol = symbol.to_uppercase();
        let cache = self.cache.read().expect("oracle cache poisoned");
        let fresh = cache
            .last_updated
            .map(|t| t.elapsed() < self.cache_ttl)
            .unwrap_or(false);
        if fresh {
            cache.prices.get(&symbol).copied()
        } else {
            None
        }
    }

    /// USD price of one unit of `symbol`. Stablecoins short-circuit to
    /// $1. Otherwise checks the TTL cache, then fetches from the venue
    /// oracle endpoint. Returns `Err(OracleUnavailable)` rather than a
    /// fabricated price when nothing fresh is available.
    pub async fn get_price_usd(&self, symbol: &str) -> Result<Money, RateError> {
        let upper = symbol.to_uppercase();
        if STABLECOINS.contains(&upper.as_str()) {
            return Ok(Money::ONE);
        }

        if let Some(price) = self.cached(&upper) {
            return Ok(price);
        }

        self.fetch_and_cache(&upper).await
    }

    async fn fetch_and_cache(&self, symbol: &str) -> Result<Money, RateError> {
        let url = format!("{}/v1/price", self.endpoint);
        let mut request = self.http.get(&url).query(&[("symbol", symbol)]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|_| RateError::OracleUnavailable)?;
        if !response.status().is_success() {
            return Err(RateError::OracleUnavailable);
        }

        #[derive(serde::Deserialize)]
        struct PriceResponse {
            price_usd: String,
        }

        let body: PriceResponse = response.json().await.map_err(|_| RateError::OracleUnavailable)?;
        let price: Money = body.price_usd.parse().map_err(|_| RateError::OracleUnavailable)?;
        if !price.is_positive() {
            return Err(RateError::OracleUnavailable);
        }

        let mut cache = self.cache.write().expect("oracle cache poisoned");
        cache.prices.insert(symbol.to_string(), price);
        cache.last_updated = Some(Instant::now());

        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stablecoins_are_always_one_dollar() {
        let oracle = PriceOracle::new("https://example.invalid", None);
        assert_eq!(oracle.get_price_usd("USDC").await.unwrap(), Money::ONE);
        assert_eq!(oracle.get_price_usd("usdt").await.unwrap(), Money::ONE);
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_oracle_unavailable() {
        let oracle = PriceOracle::new("http://127.0.0.1:1", None).with_cache_ttl(Duration::from_millis(1));
        let result = oracle.get_price_usd("GALA").await;
        assert!(matches!(result, Err(RateError::OracleUnavailable)));
    }
}
