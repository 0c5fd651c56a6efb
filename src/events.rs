//! Structured event emission
//!
//! Thin wrappers over `tracing` so every emitted event carries the field
//! names the external observability sink expects (spec §6). Delivery to
//! any concrete sink (file, webhook, dashboard mirror) is external to this
//! crate; these functions only log.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use crate::errors::ErrorKind;
use tracing::{error, info, warn};

pub fn tick_started(tick: u64) {
    info!(event = "tick.started", tick, "tick started");
}

pub fn tick_completed(tick: u64, duration_ms: u64, executed_count: usize) {
    info!(
        event = "tick.completed",
        tick, duration_ms, executed_count, "tick completed"
    );
}

pub fn quote_received(venue: &str, symbol: &str) {
    info!(event = "quote.received", venue, symbol, "quote received");
}

pub fn quote_rejected(venue: &str, symbol: &str, reasons: &[String]) {
    warn!(
        event = "quote.rejected",
        venue,
        symbol,
        reasons = ?reasons,
        "quote rejected"
    );
}

pub fn strategy_evaluated(token: &str, strategy_id: &str, net_edge_bps: i64, proceed: bool) {
    info!(
        event = "strategy.evaluated",
        token, strategy_id, net_edge_bps, proceed, "strategy evaluated"
    );
}

pub fn trade_planned(token: &str, strategy_id: &str) {
    info!(event = "trade.planned", token, strategy_id, "trade planned");
}

pub fn trade_submitted(token: &str, strategy_id: &str) {
    info!(event = "trade.submitted", token, strategy_id, "trade submitted");
}

pub fn trade_settled(token: &str, strategy_id: &str, partial_success: bool) {
    info!(
        event = "trade.settled",
        token, strategy_id, partial_success, "trade settled"
    );
}

pub fn bridge_submitted(token: &str, amount: &str) {
    info!(event = "bridge.submitted", token, amount, "bridge submitted");
}

pub fn bridge_settled(token: &str, status: &str) {
    info!(event = "bridge.settled", token, status, "bridge settled");
}

pub fn inventory_refreshed(token_count: usize) {
    info!(event = "inventory.refreshed", token_count, "inventory refreshed");
}

pub fn state_persisted(path: &str) {
    info!(event = "state.persisted", path, "state persisted");
}

pub fn error_event(kind: ErrorKind, component: &str, context: &str, cause: &str) {
    error!(
        event = format!("error.{}", kind),
        component, context, cause, "error"
    );
}
