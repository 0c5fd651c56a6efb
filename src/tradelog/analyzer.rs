//! Trade log analyzer (C14)
//!
//! Computes summary statistics over a trade log without requiring the
//! engine to be running. Used both by the scheduler's periodic reporting
//! and by the standalone analyzer binary.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;

use chrono::Timelike;

use crate::money::Money;
use crate::types::{Direction, TradeLogEntry};

#[derive(Debug, Clone, Default)]
pub struct Totals {
    pub trade_count: u64,
    pub success_count: u64,
    pub net_edge: Money,
}

impl Totals {
    fn record(&mut self, entry: &TradeLogEntry) {
        self.trade_count += 1;
        if entry.success {
            self.success_count += 1;
        }
        self.net_edge = self.net_edge + entry.expected.net_edge;
    }

    pub fn success_rate(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.trade_count as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub overall: Totals,
    pub by_token: HashMap<String, Totals>,
    pub by_direction: HashMap<String, Totals>,
    pub by_hour: HashMap<u32, Totals>,
}

pub fn analyze(entries: &[TradeLogEntry]) -> AnalysisReport {
    let mut report = AnalysisReport::default();

    for entry in entries {
        report.overall.record(entry);
        report.by_token.entry(entry.token.clone()).or_default().record(entry);

        let direction_key = match entry.direction {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        };
        report.by_direction.entry(direction_key.to_string()).or_default().record(entry);

        if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(&entry.timestamp_iso) {
            report.by_hour.entry(timestamp.hour()).or_default().record(entry);
        }
    }

    report
}
