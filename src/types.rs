//! Core data model
//!
//! Shapes from the data model: token descriptors, quotes, strategies,
//! edge results, inventory, cooldowns, trade log entries, bridge records
//! and the price cache. These are plain data; behaviour lives in the
//! component modules that consume them.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Money;

/// The two trading venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Primary,
    Secondary,
}

impl Venue {
    pub fn other(&self) -> Venue {
        match self {
            Venue::Primary => Venue::Secondary,
            Venue::Secondary => Venue::Primary,
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Venue::Primary => write!(f, "primary"),
            Venue::Secondary => write!(f, "secondary"),
        }
    }
}

/// A quote's requested operation: produce the token to the caller (buy)
/// or consume it from the caller (sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Buy,
    Sell,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Buy => write!(f, "buy"),
            Op::Sell => write!(f, "sell"),
        }
    }
}

/// Arbitrage direction: which venue sells (produces Ref) and which buys
/// (consumes Ref).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn sell_side(&self) -> Venue {
        match self {
            Direction::Forward => Venue::Primary,
            Direction::Reverse => Venue::Secondary,
        }
    }

    pub fn buy_side(&self) -> Venue {
        self.sell_side().other()
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// A token traded across both venues. Immutable within a tick; reloaded
/// between ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub symbol: String,
    pub primary_mint: String,
    pub secondary_mint: String,
    pub decimals: u8,
    pub trade_size: Money,
    pub enabled: bool,
    pub primary_quote_via: String,
    pub secondary_quote_via: String,
    #[serde(default)]
    pub min_balance_primary: Option<Money>,
    #[serde(default)]
    pub min_balance_secondary: Option<Money>,
    #[serde(default)]
    pub cooldown_minutes: Option<u32>,
    #[serde(default)]
    pub inventory_target: Option<Money>,
}

/// A quote-only currency (e.g. the reference unit itself, or a stable
/// used as an intermediate quote currency) referenced by its own mints
/// and decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTokenDescriptor {
    pub decimals: u8,
    pub primary_mint: String,
    pub secondary_mint: String,
}

/// An executable quote fetched from a venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub venue: Venue,
    pub symbol: String,
    pub side: Op,
    pub trade_size: Money,
    pub quote_currency: String,
    /// Price denominated in `quote_currency` per unit of `symbol`.
    pub price: Money,
    pub price_impact_bps: i64,
    pub min_output: Money,
    pub fees: Money,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub liquidity: Option<Money>,
}

impl Quote {
    pub fn is_well_formed(&self) -> bool {
        self.expires_at > self.timestamp && self.price.is_positive() && self.price_impact_bps >= 0
    }

    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// One side of a strategy: which quote currency to use and whether that
/// leg buys or sells the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySide {
    pub quote_currency: String,
    pub op: Op,
}

/// A registered combination of (venue-side, venue-side) to explore for a
/// token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    pub id: String,
    pub primary_side: StrategySide,
    pub secondary_side: StrategySide,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub min_edge_bps: Option<i64>,
    #[serde(default)]
    pub priority: Option<i32>,
}

fn default_true() -> bool {
    true
}

impl StrategyDescriptor {
    /// A strategy is well-formed iff exactly one side sells and the other
    /// buys for the same token.
    pub fn is_well_formed(&self) -> bool {
        (self.primary_side.op == Op::Sell && self.secondary_side.op == Op::Buy)
            || (self.primary_side.op == Op::Buy && self.secondary_side.op == Op::Sell)
    }

    /// The direction this strategy explores, if well-formed.
    pub fn direction(&self) -> Option<Direction> {
        if self.primary_side.op == Op::Sell && self.secondary_side.op == Op::Buy {
            Some(Direction::Forward)
        } else if self.primary_side.op == Op::Buy && self.secondary_side.op == Op::Sell {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

/// Per-venue price impact pair, in basis points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impacts {
    pub primary_bps: i64,
    pub secondary_bps: i64,
}

/// The outcome of evaluating one strategy in one direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResult {
    pub direction: Direction,
    pub income: Money,
    pub expense: Money,
    pub bridge_cost: Money,
    pub risk_buffer: Money,
    pub net_edge: Money,
    pub net_edge_bps: i64,
    pub impacts: Impacts,
    pub sell_side: Venue,
    pub buy_side: Venue,
    pub profitable: bool,
    pub meets_threshold: bool,
    pub invalidation_reasons: Vec<String>,
}

/// A resolved balance for one token on one venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    pub mint: String,
    pub raw_balance: u128,
    pub balance: Money,
    pub decimals: u8,
    pub value_usd: Option<Money>,
    pub last_updated: DateTime<Utc>,
}

impl TokenBalance {
    pub fn new(symbol: impl Into<String>, mint: impl Into<String>, raw_balance: u128, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            mint: mint.into(),
            raw_balance,
            balance: Money::from_raw(raw_balance, decimals),
            decimals,
            value_usd: None,
            last_updated: Utc::now(),
        }
    }
}

/// A full point-in-time view of inventory across both venues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub primary: HashMap<String, TokenBalance>,
    pub secondary: HashMap<String, TokenBalance>,
    pub native_primary: Money,
    pub native_secondary: Money,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl InventorySnapshot {
    pub fn empty() -> Self {
        Self {
            primary: HashMap::new(),
            secondary: HashMap::new(),
            native_primary: Money::ZERO,
            native_secondary: Money::ZERO,
            last_updated: Utc::now(),
            version: 0,
        }
    }

    pub fn balance_on(&self, venue: Venue, symbol: &str) -> Option<&TokenBalance> {
        match venue {
            Venue::Primary => self.primary.get(symbol),
            Venue::Secondary => self.secondary.get(symbol),
        }
    }
}

/// A rest period after a trade during which a token is not re-evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownEntry {
    pub symbol: String,
    pub ends_at_epoch_ms: i64,
    pub reason: String,
}

impl CooldownEntry {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() < self.ends_at_epoch_ms
    }
}

/// Expected/actual per-leg amounts recorded on a trade log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegExpectation {
    pub gc_proceeds: Money,
    pub sol_cost: Money,
    pub net_edge: Money,
    pub net_edge_bps: i64,
    pub impacts: Impacts,
}

/// Whether the engine was trading for real or simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    Live,
    DryRun,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Live => write!(f, "live"),
            RunMode::DryRun => write!(f, "dryRun"),
        }
    }
}

/// One append-only trade outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLogEntry {
    pub timestamp_iso: String,
    pub mode: RunMode,
    pub token: String,
    pub trade_size: Money,
    pub direction: Direction,
    pub strategy_id: String,
    pub success: bool,
    pub expected: LegExpectation,
    pub actual: Option<LegExpectation>,
    pub primary_txid: Option<String>,
    pub secondary_txid: Option<String>,
    pub primary_error: Option<String>,
    pub secondary_error: Option<String>,
    pub execution_duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    Pending,
    Completed,
    Failed,
}

/// A cross-venue asset transfer used to rebalance inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRecord {
    pub id: String,
    pub token: String,
    pub from_venue: Venue,
    pub to_venue: Venue,
    pub amount: Money,
    pub submitted_at: DateTime<Utc>,
    pub status: BridgeStatus,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub chain_refs: Vec<String>,
    #[serde(default)]
    pub retry_count: u32,
}

/// A cached USD price for a symbol, refreshed on a TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCacheEntry {
    pub symbol: String,
    pub usd: Money,
    pub last_updated: DateTime<Utc>,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_well_formed_requires_opposite_ops() {
        let good = StrategyDescriptor {
            id: "s1".into(),
            primary_side: StrategySide { quote_currency: "REF".into(), op: Op::Sell },
            secondary_side: StrategySide { quote_currency: "SOL".into(), op: Op::Buy },
            enabled: true,
            min_edge_bps: None,
            priority: None,
        };
        assert!(good.is_well_formed());
        assert_eq!(good.direction(), Some(Direction::Forward));

        let bad = StrategyDescriptor {
            id: "s2".into(),
            primary_side: StrategySide { quote_currency: "REF".into(), op: Op::Sell },
            secondary_side: StrategySide { quote_currency: "SOL".into(), op: Op::Sell },
            enabled: true,
            min_edge_bps: None,
            priority: None,
        };
        assert!(!bad.is_well_formed());
        assert_eq!(bad.direction(), None);
    }

    #[test]
    fn direction_determines_sides() {
        assert_eq!(Direction::Forward.sell_side(), Venue::Primary);
        assert_eq!(Direction::Forward.buy_side(), Venue::Secondary);
        assert_eq!(Direction::Reverse.sell_side(), Venue::Secondary);
        assert_eq!(Direction::Reverse.buy_side(), Venue::Primary);
    }

    #[test]
    fn cooldown_entry_expires() {
        let now = Utc::now();
        let entry = CooldownEntry {
            symbol: "T".into(),
            ends_at_epoch_ms: (now - chrono::Duration::seconds(1)).timestamp_millis(),
            reason: "post-trade".into(),
        };
        assert!(!entry.is_active(now));
    }
}
