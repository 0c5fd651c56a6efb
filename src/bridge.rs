//! Auto-bridge controller (C11)
//!
//! Watches per-token inventory imbalance across the two venues and, when
//! enabled, issues a bridge transfer sized to restore the configured
//! split. Bridges are tracked through `pending -> completed|failed`;
//! completion reconciles inventory optimistically, confirmed for real on
//! the next inventory refresh. Failures retry with exponential backoff up
//! to a configured maximum.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::AutoBridgingConfig;
use crate::money::Money;
use crate::types::{BridgeRecord, BridgeStatus, InventorySnapshot, Venue};

const DEFAULT_MAX_RETRIES: u32 = 3;

/// A bridge transfer this tick decided to issue, if any.
#[derive(Debug, Clone)]
pub struct BridgePlan {
    pub token: String,
    pub from_venue: Venue,
    pub to_venue: Venue,
    pub amount: Money,
}

pub struct BridgeController {
    config: AutoBridgingConfig,
    last_bridge_at: HashMap<String, DateTime<Utc>>,
    bridges_today: HashMap<String, u32>,
    today: chrono::NaiveDate,
}

impl BridgeController {
    pub fn new(config: AutoBridgingConfig) -> Self {
        Self {
            config,
            last_bridge_at: HashMap::new(),
            bridges_today: HashMap::new(),
            today: Utc::now().date_naive(),
        }
    }

    fn roll_day_if_needed(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.today {
            self.today = today;
            self.bridges_today.clear();
        }
    }

    /// Evaluate every enabled token for imbalance and return the bridges
    /// to issue this tick. Skips tokens in `skipTokens`, tokens within
    /// `cooldownMinutes` of their last bridge, and tokens already at
    /// `maxBridgesPerDay`.
    pub fn plan_bridges(&mut self, tokens: &[String], inventory: &InventorySnapshot, now: DateTime<Utc>) -> Vec<BridgePlan> {
        self.roll_day_if_needed(now);

        if !self.config.enabled {
            return Vec::new();
        }

        let mut plans = Vec::new();
        for token in tokens {
            if self.config.skip_tokens.iter().any(|t| t == token) {
                continue;
            }
            if !self.config.enabled_tokens.is_empty() && !self.config.enabled_tokens.iter().any(|t| t == token) {
                continue;
            }
            if self.is_cooling_down(token, now) {
                continue;
            }
            if self.bridges_today.get(token).copied().unwrap_or(0) >= self.config.max_bridges_per_day {
                continue;
            }

            if let Some(plan) = self.imbalance_plan(token, inventory) {
                plans.push(plan);
            }
        }
        plans
    }

    fn is_cooling_down(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.last_bridge_at
            .get(token)
            .map(|last| now < *last + chrono::Duration::minutes(self.config.cooldown_minutes as i64))
            .unwrap_or(false)
    }

    fn imbalance_plan(&self, token: &str, inventory: &InventorySnapshot) -> Option<BridgePlan> {
        let primary = inventory.balance_on(Venue::Primary, token).map(|b| b.balance).unwrap_or(Money::ZERO);
        let secondary = inventory.balance_on(Venue::Secondary, token).map(|b| b.balance).unwrap_or(Money::ZERO);
        let total = primary + secondary;
        if total.is_zero() {
            return None;
        }

        let target_primary_fraction = self.config.target_split_percent / 100.0;
        let target_primary = Money::new(total.inner() * rust_decimal::Decimal::try_from(target_primary_fraction).ok()?);
        let imbalance = (primary - target_primary).abs();
        let imbalance_percent: f64 = rust_decimal::prelude::ToPrimitive::to_f64(&(imbalance.inner() / total.inner())).unwrap_or(0.0);

        if imbalance_percent < self.config.imbalance_threshold_percent / 100.0 {
            return None;
        }

        let mut amount = imbalance;
        if amount < self.config.min_rebalance_amount {
            amount = self.config.min_rebalance_amount;
        }
        if amount > primary.max(secondary) {
            return None;
        }

        let (from_venue, to_venue) = if primary > target_primary {
            (Venue::Primary, Venue::Secondary)
        } else {
            (Venue::Secondary, Venue::Primary)
        };

        Some(BridgePlan { token: token.to_string(), from_venue, to_venue, amount })
    }

    pub fn record_issued(&mut self, token: &str, now: DateTime<Utc>) {
        self.last_bridge_at.insert(token.to_string(), now);
        *self.bridges_today.entry(token.to_string()).or_insert(0) += 1;
    }

    /// Backoff delay before retrying a failed bridge: `cooldownMinutes *
    /// 2^retry_count`, same escalation shape used for route cooldowns.
    pub fn retry_backoff_minutes(&self, retry_count: u32) -> i64 {
        self.config.cooldown_minutes as i64 * 2i64.pow(retry_count.min(6))
    }

    pub fn should_abandon(&self, retry_count: u32) -> bool {
        retry_count >= self.config.max_bridges_per_day.min(DEFAULT_MAX_RETRIES)
    }

    pub fn poll_status(&self, record: &BridgeRecord, confirmed: bool, now: DateTime<Utc>) -> BridgeRecord {
        let mut updated = record.clone();
        updated.last_poll_at = Some(now);
        if confirmed {
            updated.status = BridgeStatus::Completed;
            info!(token = %record.token, id = %record.id, "bridge confirmed");
        } else if self.should_abandon(record.retry_count) {
            updated.status = BridgeStatus::Failed;
            warn!(token = %record.token, id = %record.id, "bridge abandoned after max retries");
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenBalance;

    fn config() -> AutoBridgingConfig {
        AutoBridgingConfig {
            enabled: true,
            imbalance_threshold_percent: 10.0,
            target_split_percent: 50.0,
            min_rebalance_amount: Money::from_i64(10),
            check_interval_minutes: 30,
            cooldown_minutes: 60,
            max_bridges_per_day: 5,
            enabled_tokens: Vec::new(),
            skip_tokens: Vec::new(),
            bridge_cost_usd: None,
            trades_per_bridge: None,
        }
    }

    fn lopsided_inventory() -> InventorySnapshot {
        let mut inv = InventorySnapshot::empty();
        inv.primary.insert("GALA".to_string(), TokenBalance::new("GALA", "m1", 9_000_000_000_000, 8));
        inv.secondary.insert("GALA".to_string(), TokenBalance::new("GALA", "m2", 1_000_000_000_000, 8));
        inv
    }

    #[test]
    fn disabled_controller_plans_nothing() {
        let mut config = config();
        config.enabled = false;
        let mut controller = BridgeController::new(config);
        let plans = controller.plan_bridges(&["GALA".to_string()], &lopsided_inventory(), Utc::now());
        assert!(plans.is_empty());
    }

    #[test]
    fn large_imbalance_triggers_plan_toward_secondary() {
        let mut controller = BridgeController::new(config());
        let plans = controller.plan_bridges(&["GALA".to_string()], &lopsided_inventory(), Utc::now());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].from_venue, Venue::Primary);
        assert_eq!(plans[0].to_venue, Venue::Secondary);
    }

    #[test]
    fn balanced_inventory_plans_nothing() {
        let mut inv = InventorySnapshot::empty();
        inv.primary.insert("GALA".to_string(), TokenBalance::new("GALA", "m1", 5_000_000_000_000, 8));
        inv.secondary.insert("GALA".to_string(), TokenBalance::new("GALA", "m2", 5_000_000_000_000, 8));
        let mut controller = BridgeController::new(config());
        let plans = controller.plan_bridges(&["GALA".to_string()], &inv, Utc::now());
        assert!(plans.is_empty());
    }

    #[test]
    fn cooldown_suppresses_repeat_bridges() {
        let mut controller = BridgeController::new(config());
        let now = Utc::now();
        controller.record_issued("GALA", now);
        let plans = controller.plan_bridges(&["GALA".to_string()], &lopsided_inventory(), now + chrono::Duration::minutes(5));
        assert!(plans.is_empty());
    }

    #[test]
    fn skip_tokens_are_excluded() {
        let mut config = config();
        config.skip_tokens.push("GALA".to_string());
        let mut controller = BridgeController::new(config);
        let plans = controller.plan_bridges(&["GALA".to_string()], &lopsided_inventory(), Utc::now());
        assert!(plans.is_empty());
    }

    #[test]
    fn retry_backoff_doubles_each_attempt() {
        let controller = BridgeController::new(config());
        assert_eq!(controller.retry_backoff_minutes(0), 60);
        assert_eq!(controller.retry_backoff_minutes(1), 120);
        assert_eq!(controller.retry_backoff_minutes(2), 240);
    }
}
