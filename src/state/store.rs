//! State store (C2)
//!
//! Single-writer, multi-reader structure backed by a JSON snapshot file.
//! Writes go to a temp file then an atomic rename, directly grounded in
//! the teacher's `SharedPoolState::write_to_file`. Readers always see a
//! complete snapshot, never a torn one, because `std::sync::RwLock` hands
//! out a read guard over the whole in-memory copy and the file is only
//! ever replaced by rename.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::errors::StateStoreError;
use crate::types::{BridgeRecord, BridgeStatus, CooldownEntry, PriceCacheEntry, TokenBalance, Venue};

use super::snapshot::StateSnapshot;

type Subscriber = Box<dyn Fn(&StateSnapshot) + Send + Sync>;

pub struct StateStore {
    path: PathBuf,
    snapshot: RwLock<StateSnapshot>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl StateStore {
    /// Load the snapshot from disk, creating a default one if the file is
    /// absent. A corrupt (present but unparseable) file is a fail-closed
    /// condition: the caller should refuse to start.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StateStoreError> {
        let path = path.as_ref().to_path_buf();

        let snapshot = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| StateStoreError::Corrupt(e.to_string()))?;
            serde_json::from_str(&raw).map_err(|e| StateStoreError::Corrupt(e.to_string()))?
        } else {
            StateSnapshot::default_snapshot()
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// A consistent read-only view of the current snapshot.
    pub fn get_state(&self) -> StateSnapshot {
        self.snapshot.read().expect("state lock poisoned").clone()
    }

    pub fn subscribe(&self, callback: Subscriber) {
        self.subscribers.lock().expect("subscriber lock poisoned").push(callback);
    }

    /// Apply a pure function to a mutable clone of the snapshot, validate
    /// invariants, then persist via write-to-temp + atomic rename. On
    /// success, subscribers are notified and the in-memory copy is
    /// swapped. On any failure the previous snapshot is left intact.
    pub fn apply_update<F>(&self, f: F) -> Result<(), StateStoreError>
    where
        F: FnOnce(&mut StateSnapshot),
    {
        let prev = self.get_state();
        let mut candidate = prev.clone();
        f(&mut candidate);
        candidate.last_persisted = Utc::now();

        Self::validate_invariants(&prev, &candidate)?;
        self.write_to_file(&candidate)?;

        {
            let mut guard = self.snapshot.write().expect("state lock poisoned");
            *guard = candidate.clone();
        }

        for sub in self.subscribers.lock().expect("subscriber lock poisoned").iter() {
            sub(&candidate);
        }

        Ok(())
    }

    fn validate_invariants(prev: &StateSnapshot, next: &StateSnapshot) -> Result<(), StateStoreError> {
        if next.trade_count < prev.trade_count {
            return Err(StateStoreError::Serialize(
                "trade_count must be monotonically non-decreasing".to_string(),
            ));
        }
        if next.schema_version != prev.schema_version {
            return Err(StateStoreError::Serialize(
                "schema_version must not change across an update".to_string(),
            ));
        }
        Ok(())
    }

    fn write_to_file(&self, snapshot: &StateSnapshot) -> Result<(), StateStoreError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StateStoreError::Serialize(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &json).map_err(|e| StateStoreError::Write(e.to_string()))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| StateStoreError::Write(e.to_string()))?;

        crate::events::state_persisted(&self.path.display().to_string());
        Ok(())
    }

    pub fn set_cooldown(&self, symbol: &str, duration_ms: i64, reason: &str) -> Result<(), StateStoreError> {
        let symbol = symbol.to_string();
        let reason = reason.to_string();
        self.apply_update(|s| {
            let ends_at = Utc::now().timestamp_millis() + duration_ms;
            s.cooldowns.insert(
                symbol.clone(),
                CooldownEntry { symbol: symbol.clone(), ends_at_epoch_ms: ends_at, reason: reason.clone() },
            );
        })
    }

    /// A token is in cooldown iff an unexpired entry exists. Expired
    /// entries are dropped lazily on this read.
    pub fn is_token_in_cooldown(&self, symbol: &str) -> bool {
        let now = Utc::now();
        let snapshot = self.get_state();
        match snapshot.cooldowns.get(symbol) {
            Some(entry) if entry.is_active(now) => true,
            Some(_) => {
                let _ = self.apply_update(|s| {
                    s.cooldowns.remove(symbol);
                });
                false
            }
            None => false,
        }
    }

    pub fn record_trade(&self) -> Result<(), StateStoreError> {
        self.apply_update(|s| {
            s.trade_count += 1;
        })
    }

    pub fn update_chain_inventory(&self, venue: Venue, balance: TokenBalance) -> Result<(), StateStoreError> {
        self.apply_update(|s| {
            let map = match venue {
                Venue::Primary => &mut s.inventory.primary,
                Venue::Secondary => &mut s.inventory.secondary,
            };
            map.insert(balance.symbol.clone(), balance.clone());
            s.inventory.last_updated = Utc::now();
            s.inventory.version += 1;
        })
    }

    pub fn update_price_cache(&self, entry: PriceCacheEntry) -> Result<(), StateStoreError> {
        self.apply_update(|s| {
            s.price_cache.insert(entry.symbol.clone(), entry.clone());
        })
    }

    pub fn append_bridge(&self, record: BridgeRecord) -> Result<(), StateStoreError> {
        self.apply_update(|s| {
            s.bridges.push(record.clone());
        })
    }

    pub fn update_bridge_status(&self, bridge_id: &str, status: BridgeStatus) -> Result<(), StateStoreError> {
        let bridge_id = bridge_id.to_string();
        self.apply_update(|s| {
            if let Some(b) = s.bridges.iter_mut().find(|b| b.id == bridge_id) {
                b.status = status;
                b.last_poll_at = Some(Utc::now());
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("galasol_arb_state_test_{}_{}", name, std::process::id()))
    }

    #[test]
    fn load_creates_default_when_absent() {
        let path = temp_path("default");
        let _ = std::fs::remove_file(&path);
        let store = StateStore::load(&path).unwrap();
        assert_eq!(store.get_state().trade_count, 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn apply_update_persists_and_roundtrips() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);
        let store = StateStore::load(&path).unwrap();

        store.record_trade().unwrap();
        store.record_trade().unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        assert_eq!(reloaded.get_state().trade_count, 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn cooldown_lifecycle() {
        let path = temp_path("cooldown");
        let _ = std::fs::remove_file(&path);
        let store = StateStore::load(&path).unwrap();

        assert!(!store.is_token_in_cooldown("T"));
        store.set_cooldown("T", 60_000, "post-trade").unwrap();
        assert!(store.is_token_in_cooldown("T"));

        store.set_cooldown("T", -1, "already expired").unwrap();
        assert!(!store.is_token_in_cooldown("T"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn trade_count_cannot_go_backwards() {
        let path = temp_path("monotonic");
        let _ = std::fs::remove_file(&path);
        let store = StateStore::load(&path).unwrap();
        store.record_trade().unwrap();

        let result = store.apply_update(|s| {
            s.trade_count = 0;
        });
        assert!(result.is_err());
        assert_eq!(store.get_state().trade_count, 1);
        let _ = std::fs::remove_file(&path);
    }
}
