//! Balance checker (C10)
//!
//! Compares current inventory against per-token minima and trade-size
//! requirements, maintaining a per-token pause flag. A paused token is
//! skipped by the scheduler until its balances recover; no operator
//! action is required to resume.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;

use crate::config::BalanceCheckingConfig;
use crate::money::Money;
use crate::types::{InventorySnapshot, TokenDescriptor, Venue};

pub struct BalanceChecker {
    config: BalanceCheckingConfig,
    paused: HashMap<String, bool>,
}

impl BalanceChecker {
    pub fn new(config: BalanceCheckingConfig) -> Self {
        Self { config, paused: HashMap::new() }
    }

    pub fn can_token_trade(&self, symbol: &str) -> bool {
        !self.paused.get(symbol).copied().unwrap_or(false)
    }

    /// Recompute pause flags from the given inventory snapshot. Tokens in
    /// `config.skip_tokens` are never paused by this check.
    pub fn check_balances(&mut self, tokens: &[TokenDescriptor], inventory: &InventorySnapshot) {
        for token in tokens {
            if self.config.skip_tokens.iter().any(|s| s == &token.symbol) {
                continue;
            }

            let sufficient = self.has_sufficient_balance(token, inventory);
            self.paused.insert(token.symbol.clone(), !sufficient);
        }

        let native_ok = inventory.native_primary >= self.config.min_native_primary
            && inventory.native_secondary >= self.config.min_native_secondary;
        if !native_ok {
            for token in tokens {
                self.paused.insert(token.symbol.clone(), true);
            }
        }
    }

    fn has_sufficient_balance(&self, token: &TokenDescriptor, inventory: &InventorySnapshot) -> bool {
        let primary_min = token.min_balance_primary.unwrap_or(Money::ZERO);
        let secondary_min = token.min_balance_secondary.unwrap_or(Money::ZERO);

        let primary_ok = inventory
            .balance_on(Venue::Primary, &token.symbol)
            .map(|b| b.balance >= primary_min)
            .unwrap_or(primary_min.is_zero());
        let secondary_ok = inventory
            .balance_on(Venue::Secondary, &token.symbol)
            .map(|b| b.balance >= secondary_min)
            .unwrap_or(secondary_min.is_zero());

        primary_ok && secondary_ok
    }
}
