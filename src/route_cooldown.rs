//! Route-level cooldown with escalating backoff (supplemented feature)
//!
//! Suppresses a (token, strategy) pair after repeated failures so the
//! engine doesn't keep re-evaluating a route that just failed. Time-based
//! rather than block-based since neither venue here exposes a shared
//! block height. Escalation and reset behaviour follow the teacher's
//! route cooldown: each failure multiplies the suppression window by 5x
//! up to a cap; any success clears the entry instantly.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

type RouteKey = (String, String);

struct RouteCooldownEntry {
    last_failed_at: DateTime<Utc>,
    cooldown: Duration,
    failure_count: u32,
}

const ESCALATION_FACTOR: u32 = 5;

pub struct RouteCooldown {
    entries: HashMap<RouteKey, RouteCooldownEntry>,
    initial_cooldown: Duration,
    max_cooldown: Duration,
}

impl RouteCooldown {
    /// `initial_cooldown` of zero disables suppression entirely.
    pub fn new(initial_cooldown: Duration, max_cooldown: Duration) -> Self {
        Self { entries: HashMap::new(), initial_cooldown, max_cooldown }
    }

    pub fn is_suppressed(&self, token: &str, strategy_id: &str, now: DateTime<Utc>) -> bool {
        if self.initial_cooldown.is_zero() {
            return false;
        }
        let key = (token.to_string(), strategy_id.to_string());
        match self.entries.get(&key) {
            Some(entry) => now < entry.last_failed_at + chrono::Duration::from_std(entry.cooldown).unwrap_or_default(),
            None => false,
        }
    }

    pub fn record_failure(&mut self, token: &str, strategy_id: &str, now: DateTime<Utc>) {
        if self.initial_cooldown.is_zero() {
            return;
        }
        let key = (token.to_string(), strategy_id.to_string());
        let initial = self.initial_cooldown;
        let entry = self.entries.entry(key).or_insert_with(|| RouteCooldownEntry {
            last_failed_at: now,
            cooldown: Duration::ZERO,
            failure_count: 0,
        });

        entry.failure_count += 1;
        entry.last_failed_at = now;
        let escalated = initial.saturating_mul(ESCALATION_FACTOR.saturating_pow(entry.failure_count.saturating_sub(1)));
        entry.cooldown = escalated.min(self.max_cooldown);

        debug!(token, strategy_id, failures = entry.failure_count, cooldown_secs = entry.cooldown.as_secs(), "route cooldown escalated");
    }

    pub fn record_success(&mut self, token: &str, strategy_id: &str) {
        let key = (token.to_string(), strategy_id.to_string());
        if self.entries.remove(&key).is_some() {
            info!(token, strategy_id, "route cooldown reset on success");
        }
    }

    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| {
            now < entry.last_failed_at + chrono::Duration::from_std(entry.cooldown).unwrap_or_default()
        });
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn no_cooldown_initially() {
        let cd = RouteCooldown::new(secs(10), secs(1800));
        assert!(!cd.is_suppressed("GALA", "s1", Utc::now()));
    }

    #[test]
    fn cooldown_after_failure_expires() {
        let mut cd = RouteCooldown::new(secs(10), secs(1800));
        let t0 = Utc::now();
        cd.record_failure("GALA", "s1", t0);
        assert!(cd.is_suppressed("GALA", "s1", t0 + chrono::Duration::seconds(5)));
        assert!(!cd.is_suppressed("GALA", "s1", t0 + chrono::Duration::seconds(11)));
    }

    #[test]
    fn escalates_by_five_and_caps() {
        let mut cd = RouteCooldown::new(secs(10), secs(1800));
        let t0 = Utc::now();
        cd.record_failure("GALA", "s1", t0);
        assert_eq!(cd.entries.get(&("GALA".to_string(), "s1".to_string())).unwrap().cooldown, secs(10));
        cd.record_failure("GALA", "s1", t0);
        assert_eq!(cd.entries.get(&("GALA".to_string(), "s1".to_string())).unwrap().cooldown, secs(50));
        for _ in 0..10 {
            cd.record_failure("GALA", "s1", t0);
        }
        assert_eq!(cd.entries.get(&("GALA".to_string(), "s1".to_string())).unwrap().cooldown, secs(1800));
    }

    #[test]
    fn success_clears_entry() {
        let mut cd = RouteCooldown::new(secs(10), secs(1800));
        let t0 = Utc::now();
        cd.record_failure("GALA", "s1", t0);
        assert!(cd.is_suppressed("GALA", "s1", t0));
        cd.record_success("GALA", "s1");
        assert!(!cd.is_suppressed("GALA", "s1", t0));
        assert_eq!(cd.active_count(), 0);
    }

    #[test]
    fn disabled_when_initial_is_zero() {
        let mut cd = RouteCooldown::new(Duration::ZERO, secs(1800));
        cd.record_failure("GALA", "s1", Utc::now());
        assert!(!cd.is_suppressed("GALA", "s1", Utc::now()));
    }

    #[test]
    fn routes_are_independent() {
        let mut cd = RouteCooldown::new(secs(10), secs(1800));
        let t0 = Utc::now();
        cd.record_failure("GALA", "s1", t0);
        assert!(!cd.is_suppressed("GALA", "s2", t0));
        assert!(!cd.is_suppressed("SILK", "s1", t0));
    }
}
