//! The durable state snapshot shape
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{BridgeRecord, CooldownEntry, InventorySnapshot, PriceCacheEntry};

/// Everything the state store persists atomically: inventory, cooldowns,
/// price cache, and the bridge ledger. The append-only trade log lives in
/// its own JSONL files (see `tradelog`); this snapshot only tracks a
/// running count of trades for quick inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub inventory: InventorySnapshot,
    pub cooldowns: HashMap<String, CooldownEntry>,
    pub price_cache: HashMap<String, PriceCacheEntry>,
    pub bridges: Vec<BridgeRecord>,
    pub trade_count: u64,
    pub last_persisted: DateTime<Utc>,
    #[serde(default)]
    pub schema_version: u32,
}

impl StateSnapshot {
    pub fn default_snapshot() -> Self {
        Self {
            inventory: InventorySnapshot::empty(),
            cooldowns: HashMap::new(),
            price_cache: HashMap::new(),
            bridges: Vec::new(),
            trade_count: 0,
            last_persisted: Utc::now(),
            schema_version: 1,
        }
    }
}
