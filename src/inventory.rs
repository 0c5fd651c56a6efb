//! Inventory refresher (C13)
//!
//! Idempotent. For each enabled token plus the quote tokens, fetches
//! balances from each venue's balance endpoint and reconciles into the
//! state store atomically. On a provider error the previous balance for
//! that symbol is kept rather than replaced with inconsistent data.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use async_trait::async_trait;
use tracing::warn;

use crate::money::Money;
use crate::types::{InventorySnapshot, TokenBalance, Venue};

/// Capability: read a raw on-chain balance for a mint from one venue.
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    fn venue(&self) -> Venue;
    async fn get_balance(&self, mint: &str, decimals: u8) -> Result<u128, String>;
    async fn get_native_balance(&self) -> Result<Money, String>;
}

pub struct InventoryRefresher {
    pub primary: std::sync::Arc<dyn BalanceProvider>,
    pub secondary: std::sync::Arc<dyn BalanceProvider>,
}

/// A token/mint pair to refresh on one venue.
pub struct RefreshTarget<'a> {
    pub symbol: &'a str,
    pub primary_mint: &'a str,
    pub secondary_mint: &'a str,
    pub decimals: u8,
}

impl InventoryRefresher {
    pub fn new(primary: std::sync::Arc<dyn BalanceProvider>, secondary: std::sync::Arc<dyn BalanceProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Refreshes every target into a copy of `previous`, preserving
    /// stale-but-known balances wherever a provider call fails.
    pub async fn refresh(&self, targets: &[RefreshTarget<'_>], previous: &InventorySnapshot) -> InventorySnapshot {
        let mut next = previous.clone();

        for target in targets {
            match self.primary.get_balance(target.primary_mint, target.decimals).await {
                Ok(raw) => {
                    next.primary.insert(target.symbol.to_string(), TokenBalance::new(target.symbol, target.primary_mint, raw, target.decimals));
                }
                Err(e) => warn!(symbol = target.symbol, venue = "primary", error = %e, "balance fetch failed, keeping prior value"),
            }

            match self.secondary.get_balance(target.secondary_mint, target.decimals).await {
                Ok(raw) => {
                    next.secondary.insert(target.symbol.to_string(), TokenBalance::new(target.symbol, target.secondary_mint, raw, target.decimals));
                }
                Err(e) => warn!(symbol = target.symbol, venue = "secondary", error = %e, "balance fetch failed, keeping prior value"),
            }
        }

        match self.primary.get_native_balance().await {
            Ok(balance) => next.native_primary = balance,
            Err(e) => warn!(venue = "primary", error = %e, "native balance fetch failed, keeping prior value"),
        }
        match self.secondary.get_native_balance().await {
            Ok(balance) => next.native_secondary = balance,
            Err(e) => warn!(venue = "secondary", error = %e, "native balance fetch failed, keeping prior value"),
        }

        next.last_updated = chrono::Utc::now();
        next.version = previous.version + 1;
        next
    }
}
