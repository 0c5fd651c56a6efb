//! Edge calculator (C6)
//!
//! Direction-agnostic income/expense/net-edge computation in the
//! reference unit. Bridge cost is amortised across `tradesPerBridge`
//! trades and converted through `refUsdPrice`; with neither an oracle
//! price nor an explicit fallback configured, bridge cost is zero rather
//! than fabricated (the risk manager still sees it reflected in
//! `invalidationReasons` via `BridgeCostUnavailable` upstream, which is
//! raised by the caller, not by this pure function).
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use crate::money::Money;
use crate::types::{Direction, EdgeResult, Impacts, Venue};

#[derive(Debug, Clone, Copy)]
pub struct EdgeInput {
    pub direction: Direction,
    pub trade_size: Money,
    pub primary_price: Money,
    pub secondary_price: Money,
    pub primary_impact_bps: i64,
    pub secondary_impact_bps: i64,
    pub quote_to_ref_rate: Money,
    pub risk_buffer_bps: i64,
    pub bridge_cost_ref: Money,
    pub threshold_bps: i64,
    pub max_price_impact_bps: i64,
}

/// Computes income/expense/net-edge for one direction. `bridge_cost_ref`
/// is precomputed by the caller (amortised bridge-cost-in-USD divided by
/// `refUsdPrice` divided by `tradesPerBridge`) since whether a price is
/// available at all is a fallible, async concern that belongs to the
/// rate converter / oracle, not to this pure calculation.
pub fn compute_edge(input: EdgeInput) -> EdgeResult {
    let (income, expense) = match input.direction {
        Direction::Forward => (
            input.primary_price * input.trade_size,
            input.secondary_price * input.trade_size * input.quote_to_ref_rate,
        ),
        Direction::Reverse => (
            input.secondary_price * input.trade_size * input.quote_to_ref_rate,
            input.primary_price * input.trade_size,
        ),
    };

    let risk_buffer = income.bps_of(input.risk_buffer_bps);
    let bridge_cost = input.bridge_cost_ref;
    let net_edge = income - expense - bridge_cost - risk_buffer;

    let net_edge_bps: i64 = if expense.is_zero() {
        0
    } else {
        ((net_edge / expense).inner() * rust_decimal::Decimal::from(10_000))
            .round()
            .to_string()
            .parse()
            .unwrap_or(0)
    };

    let impacts = Impacts {
        primary_bps: input.primary_impact_bps,
        secondary_bps: input.secondary_impact_bps,
    };

    let impact_within_bounds = input.primary_impact_bps.abs() <= input.max_price_impact_bps
        && input.secondary_impact_bps.abs() <= input.max_price_impact_bps;
    let meets_threshold = net_edge_bps >= input.threshold_bps;
    let profitable = net_edge.is_positive() && meets_threshold && impact_within_bounds;

    let mut invalidation_reasons = Vec::new();
    if !net_edge.is_positive() {
        invalidation_reasons.push("net edge is not positive".to_string());
    }
    if !meets_threshold {
        invalidation_reasons.push(format!("net edge {}bps below threshold {}bps", net_edge_bps, input.threshold_bps));
    }
    if !impact_within_bounds {
        invalidation_reasons.push("price impact exceeds maximum".to_string());
    }

    let (sell_side, buy_side) = (input.direction.sell_side(), input.direction.buy_side());

    EdgeResult {
        direction: input.direction,
        income,
        expense,
        bridge_cost,
        risk_buffer,
        net_edge,
        net_edge_bps,
        impacts,
        sell_side,
        buy_side,
        profitable,
        meets_threshold,
        invalidation_reasons,
    }
}

/// Amortises a USD bridge cost into the reference unit. Returns `None`
/// when neither an oracle-derived nor a configured fallback price is
/// available — callers treat `None` as zero bridge cost for the edge
/// calculation but should surface the gap via the risk manager / logs,
/// not silently.
pub fn amortised_bridge_cost_ref(
    bridge_cost_usd: Option<Money>,
    trades_per_bridge: Option<u32>,
    ref_usd_price: Option<Money>,
    fallback_ref_usd_price: Option<Money>,
) -> Option<Money> {
    let cost_usd = bridge_cost_usd?;
    let trades = trades_per_bridge.unwrap_or(1).max(1);
    let price = ref_usd_price.or(fallback_ref_usd_price)?;
    if !price.is_positive() {
        return None;
    }
    Some(cost_usd / price / Money::from_i64(trades as i64))
}
