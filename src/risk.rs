//! Risk manager (C7)
//!
//! Ordered pre-trade gate: price impact, cooldown, edge/threshold,
//! inventory sufficiency, daily trade cap. Every stage's reasons are
//! collected rather than discarded on first failure, so a rejected
//! evaluation still carries a complete explanation for the trade log and
//! dashboards; `should_proceed` is simply `reasons.is_empty()`.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use chrono::{DateTime, Utc};

use crate::edge::{compute_edge, EdgeInput};
use crate::money::Money;
use crate::route_cooldown::RouteCooldown;
use crate::types::{Direction, EdgeResult, InventorySnapshot, Venue};

#[derive(Debug, Clone)]
pub struct RiskDecision {
    pub should_proceed: bool,
    pub reasons: Vec<String>,
    pub edge: EdgeResult,
}

pub struct RiskManagerInput<'a> {
    pub token: &'a str,
    pub strategy_id: &'a str,
    pub direction: Direction,
    pub trade_size: Money,
    pub primary_quote_via: &'a str,
    pub secondary_quote_via: &'a str,
    pub ref_symbol: &'a str,
    pub max_price_impact_bps: i64,
    pub max_daily_trades: u32,
    pub trades_today: u32,
    pub now: DateTime<Utc>,
    /// Whether the state store's post-trade `CooldownEntry` for this token
    /// is currently unexpired (spec §4.7 step 2, distinct from the
    /// per-(token,strategy) `RouteCooldown` checked below).
    pub token_in_cooldown: bool,
}

pub struct RiskManager<'a> {
    cooldown: &'a RouteCooldown,
}

impl<'a> RiskManager<'a> {
    pub fn new(cooldown: &'a RouteCooldown) -> Self {
        Self { cooldown }
    }

    pub fn evaluate(
        &self,
        input: &RiskManagerInput,
        edge_input: EdgeInput,
        inventory: &InventorySnapshot,
    ) -> RiskDecision {
        let mut reasons = Vec::new();

        if edge_input.primary_impact_bps.abs() > input.max_price_impact_bps {
            reasons.push(format!("primary price impact {}bps exceeds {}bps", edge_input.primary_impact_bps, input.max_price_impact_bps));
        }
        if edge_input.secondary_impact_bps.abs() > input.max_price_impact_bps {
            reasons.push(format!("secondary price impact {}bps exceeds {}bps", edge_input.secondary_impact_bps, input.max_price_impact_bps));
        }

        if input.token_in_cooldown {
            reasons.push("Token is in cooldown".to_string());
        }
        if self.cooldown.is_suppressed(input.token, input.strategy_id, input.now) {
            reasons.push(format!("{} / {} is in cooldown", input.token, input.strategy_id));
        }

        let edge = compute_edge(edge_input);
        if !edge.profitable {
            reasons.extend(edge.invalidation_reasons.clone());
        }

        for reason in self.inventory_reasons(input, inventory) {
            reasons.push(reason);
        }

        if input.trades_today >= input.max_daily_trades {
            reasons.push(format!("daily trade cap {} reached", input.max_daily_trades));
        }

        RiskDecision { should_proceed: reasons.is_empty(), reasons, edge }
    }

    fn inventory_reasons(&self, input: &RiskManagerInput, inventory: &InventorySnapshot) -> Vec<String> {
        let mut reasons = Vec::new();
        match input.direction {
            Direction::Forward => {
                if !Self::has_enough(inventory, Venue::Primary, input.token, input.primary_quote_via, input.trade_size, input.ref_symbol) {
                    reasons.push(format!("insufficient {} on primary venue", input.token));
                }
                if !Self::has_enough(inventory, Venue::Secondary, input.secondary_quote_via, input.secondary_quote_via, Money::ZERO, input.ref_symbol) {
                    reasons.push(format!("insufficient {} on secondary venue", input.secondary_quote_via));
                }
            }
            Direction::Reverse => {
                if !Self::has_enough(inventory, Venue::Primary, input.ref_symbol, input.ref_symbol, Money::ZERO, input.ref_symbol) {
                    reasons.push(format!("insufficient {} on primary venue", input.ref_symbol));
                }
                if !Self::has_enough(inventory, Venue::Secondary, input.token, input.token, input.trade_size, input.ref_symbol) {
                    reasons.push(format!("insufficient {} on secondary venue", input.token));
                }
            }
        }
        reasons
    }

    fn has_enough(
        inventory: &InventorySnapshot,
        venue: Venue,
        required_symbol: &str,
        _quote_via: &str,
        minimum: Money,
        _ref_symbol: &str,
    ) -> bool {
        match inventory.balance_on(venue, required_symbol) {
            Some(balance) => balance.balance >= minimum,
            None => minimum.is_zero(),
        }
    }
}
