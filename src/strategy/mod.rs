//! Strategy registry & evaluator (C8)
//!
//! Enumerates (primary-side, secondary-side) combinations per token,
//! evaluates each through the validator, rate converter, edge calculator
//! and risk manager, and selects the best. A per-tick quote cache
//! deduplicates fetches across strategies that share a token; strategies
//! are paced between evaluations to respect venue rate limits.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

mod registry;

pub use registry::StrategyRegistry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::warn;

use crate::edge::EdgeInput;
use crate::errors::QuoteError;
use crate::money::Money;
use crate::oracle::PriceOracle;
use crate::quotes::QuoteProvider;
use crate::rate::RateConverter;
use crate::risk::{RiskManager, RiskManagerInput};
use crate::route_cooldown::RouteCooldown;
use crate::types::{EdgeResult, InventorySnapshot, Op, Quote, StrategyDescriptor, TokenDescriptor, Venue};
use crate::validator::QuoteValidator;

/// Minimum time-to-live a cached quote must retain to be reused by a
/// later strategy in the same tick.
pub const MIN_QUOTE_CACHE_TTL_SECS: i64 = 10;

/// Default pause between evaluating consecutive strategies for a token.
pub const DEFAULT_STRATEGY_PACING: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
struct QuoteCacheKey {
    venue: Venue,
    symbol: String,
    size: Money,
    quote_currency: String,
    op: Op,
}

#[derive(Default)]
pub struct QuoteCache {
    entries: HashMap<QuoteCacheKey, (Quote, Instant)>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_or_fetch(
        &mut self,
        provider: &dyn QuoteProvider,
        symbol: &str,
        size: Money,
        op: Op,
        quote_currency: &str,
    ) -> Result<Quote, QuoteError> {
        let key = QuoteCacheKey {
            venue: provider.venue(),
            symbol: symbol.to_string(),
            size,
            quote_currency: quote_currency.to_string(),
            op,
        };

        if let Some((quote, fetched_at)) = self.entries.get(&key) {
            if fetched_at.elapsed() < Duration::from_secs(MIN_QUOTE_CACHE_TTL_SECS as u64) {
                return Ok(quote.clone());
            }
        }

        let quote = provider.get_quote(symbol, size, op, quote_currency).await?;
        self.entries.insert(key, (quote.clone(), Instant::now()));
        Ok(quote)
    }
}

/// Outcome of evaluating one strategy for one token.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub strategy_id: String,
    pub priority: i32,
    pub success: bool,
    pub should_proceed: bool,
    pub edge: Option<EdgeResult>,
    pub reasons: Vec<String>,
    pub primary_price: Option<Money>,
    pub secondary_price: Option<Money>,
}

pub struct StrategyEvaluator<'a> {
    pub primary: Arc<dyn QuoteProvider>,
    pub secondary: Arc<dyn QuoteProvider>,
    pub validator: &'a QuoteValidator,
    pub oracle: &'a PriceOracle,
    pub cooldown: &'a RouteCooldown,
    pub ref_symbol: &'a str,
    pub risk_buffer_bps: i64,
    pub max_price_impact_bps: i64,
    pub max_daily_trades: u32,
    pub min_edge_bps: i64,
    pub reverse_min_edge_bps: i64,
    pub pacing: Duration,
    /// Amortised per-trade bridge cost in reference units, recomputed once
    /// per tick by the scheduler from the oracle price and bridging
    /// config. Zero when bridging is disabled or no trades-per-bridge
    /// figure is configured.
    pub bridge_cost_ref: Money,
}

impl<'a> StrategyEvaluator<'a> {
    pub async fn evaluate_token(
        &self,
        token: &TokenDescriptor,
        strategies: &[StrategyDescriptor],
        trades_today: u32,
        token_in_cooldown: bool,
        inventory: &InventorySnapshot,
        cache: &mut QuoteCache,
    ) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(strategies.len());
        let mut first = true;

        for strategy in strategies {
            if !first {
                tokio::time::sleep(self.pacing).await;
            }
            first = false;

            results.push(self.evaluate_one(token, strategy, trades_today, token_in_cooldown, inventory, cache).await);
        }

        results
    }

    async fn evaluate_one(
        &self,
        token: &TokenDescriptor,
        strategy: &StrategyDescriptor,
        trades_today: u32,
        token_in_cooldown: bool,
        inventory: &InventorySnapshot,
        cache: &mut QuoteCache,
    ) -> EvaluationResult {
        let priority = strategy.priority.unwrap_or(0);

        let Some(direction) = strategy.direction() else {
            return EvaluationResult {
                strategy_id: strategy.id.clone(),
                priority,
                success: false,
                should_proceed: false,
                edge: None,
                reasons: vec!["malformed strategy: sides must be opposite ops".to_string()],
                primary_price: None,
                secondary_price: None,
            };
        };

        let primary_quote = cache
            .get_or_fetch(
                self.primary.as_ref(),
                &token.symbol,
                token.trade_size,
                strategy.primary_side.op,
                &strategy.primary_side.quote_currency,
            )
            .await;
        let secondary_quote = cache
            .get_or_fetch(
                self.secondary.as_ref(),
                &token.symbol,
                token.trade_size,
                strategy.secondary_side.op,
                &strategy.secondary_side.quote_currency,
            )
            .await;

        let (primary_quote, secondary_quote) = match (primary_quote, secondary_quote) {
            (Ok(p), Ok(s)) => (p, s),
            (Err(e), _) | (_, Err(e)) => {
                warn!(strategy_id = %strategy.id, token = %token.symbol, error = %e, "quote fetch failed");
                return EvaluationResult {
                    strategy_id: strategy.id.clone(),
                    priority,
                    success: false,
                    should_proceed: false,
                    edge: None,
                    reasons: vec![e.to_string()],
                    primary_price: None,
                    secondary_price: None,
                };
            }
        };

        let now = Utc::now();
        let primary_validation = self.validator.validate(Some(&primary_quote), token.trade_size, now);
        let secondary_validation = self.validator.validate(Some(&secondary_quote), token.trade_size, now);
        if !primary_validation.valid || !secondary_validation.valid {
            let mut reasons = primary_validation.errors;
            reasons.extend(secondary_validation.errors);
            return EvaluationResult {
                strategy_id: strategy.id.clone(),
                priority,
                success: false,
                should_proceed: false,
                edge: None,
                reasons,
                primary_price: Some(primary_quote.price),
                secondary_price: Some(secondary_quote.price),
            };
        }

        // Only the secondary venue's quote currency can differ from `Ref`
        // in this two-venue model, regardless of direction.
        let converter = RateConverter::new(self.oracle);
        let conversion = converter
            .resolve(
                Venue::Secondary,
                &strategy.secondary_side.quote_currency,
                self.ref_symbol,
                token.trade_size,
                self.secondary.as_ref(),
                None,
            )
            .await;

        let conversion = match conversion {
            Ok(c) => c,
            Err(e) => {
                return EvaluationResult {
                    strategy_id: strategy.id.clone(),
                    priority,
                    success: false,
                    should_proceed: false,
                    edge: None,
                    reasons: vec![e.to_string()],
                    primary_price: Some(primary_quote.price),
                    secondary_price: Some(secondary_quote.price),
                };
            }
        };

        let default_threshold = match direction {
            crate::types::Direction::Forward => self.min_edge_bps,
            crate::types::Direction::Reverse => self.reverse_min_edge_bps,
        };
        let threshold_bps = strategy.min_edge_bps.unwrap_or(default_threshold);

        let edge_input = EdgeInput {
            direction,
            trade_size: token.trade_size,
            primary_price: primary_quote.price,
            secondary_price: secondary_quote.price,
            primary_impact_bps: primary_quote.price_impact_bps,
            secondary_impact_bps: secondary_quote.price_impact_bps,
            quote_to_ref_rate: conversion.rate,
            risk_buffer_bps: self.risk_buffer_bps,
            bridge_cost_ref: self.bridge_cost_ref,
            threshold_bps,
            max_price_impact_bps: self.max_price_impact_bps,
        };

        let risk_manager = RiskManager::new(self.cooldown);
        let risk_input = RiskManagerInput {
            token: &token.symbol,
            strategy_id: &strategy.id,
            direction,
            trade_size: token.trade_size,
            primary_quote_via: &token.primary_quote_via,
            secondary_quote_via: &token.secondary_quote_via,
            ref_symbol: self.ref_symbol,
            max_price_impact_bps: self.max_price_impact_bps,
            max_daily_trades: self.max_daily_trades,
            trades_today,
            now,
            token_in_cooldown,
        };

        let decision = risk_manager.evaluate(&risk_input, edge_input, inventory);

        EvaluationResult {
            strategy_id: strategy.id.clone(),
            priority,
            success: true,
            should_proceed: decision.should_proceed,
            edge: Some(decision.edge),
            reasons: decision.reasons,
            primary_price: Some(primary_quote.price),
            secondary_price: Some(secondary_quote.price),
        }
    }
}

/// Filters to viable results and returns the best by `netEdgeBps`
/// descending, ties broken by ascending `priority`.
pub fn select_best(results: &[EvaluationResult]) -> Option<&EvaluationResult> {
    results
        .iter()
        .filter(|r| r.success && r.should_proceed && r.edge.as_ref().map(|e| e.profitable && e.meets_threshold).unwrap_or(false))
        .max_by(|a, b| {
            let edge_a = a.edge.as_ref().unwrap().net_edge_bps;
            let edge_b = b.edge.as_ref().unwrap().net_edge_bps;
            edge_a.cmp(&edge_b).then_with(|| b.priority.cmp(&a.priority))
        })
}
