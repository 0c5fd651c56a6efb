//! Strategy registry
//!
//! Holds the configured strategies and exposes the enabled subset sorted
//! by ascending priority, ready for the evaluator.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;

use crate::types::StrategyDescriptor;

pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyDescriptor>,
}

impl StrategyRegistry {
    pub fn new(strategies: HashMap<String, StrategyDescriptor>) -> Self {
        Self { strategies }
    }

    /// Enabled, well-formed strategies sorted by ascending priority
    /// (unset priority sorts as 0).
    pub fn enabled_strategies(&self) -> Vec<StrategyDescriptor> {
        let mut enabled: Vec<StrategyDescriptor> = self
            .strategies
            .values()
            .filter(|s| s.enabled && s.is_well_formed())
            .cloned()
            .collect();
        enabled.sort_by_key(|s| s.priority.unwrap_or(0));
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Op, StrategySide};

    fn strategy(id: &str, priority: Option<i32>, enabled: bool) -> StrategyDescriptor {
        StrategyDescriptor {
            id: id.to_string(),
            primary_side: StrategySide { quote_currency: "REF".into(), op: Op::Sell },
            secondary_side: StrategySide { quote_currency: "SOL".into(), op: Op::Buy },
            enabled,
            min_edge_bps: None,
            priority,
        }
    }

    #[test]
    fn disabled_strategies_are_excluded() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), strategy("a", Some(1), false));
        map.insert("b".to_string(), strategy("b", Some(2), true));
        let registry = StrategyRegistry::new(map);
        let enabled = registry.enabled_strategies();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "b");
    }

    #[test]
    fn sorted_by_ascending_priority() {
        let mut map = HashMap::new();
        map.insert("high".to_string(), strategy("high", Some(5), true));
        map.insert("low".to_string(), strategy("low", Some(1), true));
        let registry = StrategyRegistry::new(map);
        let enabled = registry.enabled_strategies();
        assert_eq!(enabled[0].id, "low");
        assert_eq!(enabled[1].id, "high");
    }

    #[test]
    fn malformed_strategies_are_excluded() {
        let mut map = HashMap::new();
        let mut bad = strategy("bad", Some(1), true);
        bad.secondary_side.op = Op::Sell;
        map.insert("bad".to_string(), bad);
        let registry = StrategyRegistry::new(map);
        assert!(registry.enabled_strategies().is_empty());
    }
}
