//! Main scheduler (C12)
//!
//! Fixed-interval tick loop grounded in the teacher's
//! `data_collector::run_data_collector` shape (`tokio::time::interval` +
//! `loop { interval.tick().await; ... }`), generalized to drive the whole
//! trading pipeline rather than a single pool sync. Balance checking and
//! auto-bridging run every tick even while globally paused; strategy
//! evaluation and execution are skipped while paused. Inventory refresh
//! runs on its own longer-period interval, ticked independently inside
//! the same loop.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::balance::BalanceChecker;
use crate::bridge::BridgeController;
use crate::config::EngineConfig;
use crate::edge::amortised_bridge_cost_ref;
use crate::events;
use crate::executor::{DualLegExecutor, ExecutionPlan};
use crate::inventory::InventoryRefresher;
use crate::money::Money;
use crate::oracle::PriceOracle;
use crate::pricelog::{PriceLogRow, PriceLogger};
use crate::quotes::QuoteProvider;
use crate::route_cooldown::RouteCooldown;
use crate::state::StateStore;
use crate::strategy::{select_best, QuoteCache, StrategyEvaluator, StrategyRegistry};
use crate::tradelog::TradeLogWriter;
use crate::types::{
    BridgeStatus, Direction, Impacts, LegExpectation, RunMode, TokenDescriptor, TradeLogEntry, Venue,
};
use crate::validator::QuoteValidator;
use crate::whitelist::RouteWhitelist;

/// Everything the scheduler needs to drive one tick. Owns no I/O itself;
/// every side effect goes through one of these collaborators.
pub struct Scheduler {
    pub config: EngineConfig,
    pub state: Arc<StateStore>,
    pub primary_quotes: Arc<dyn QuoteProvider>,
    pub secondary_quotes: Arc<dyn QuoteProvider>,
    pub validator: QuoteValidator,
    pub oracle: PriceOracle,
    pub registry: StrategyRegistry,
    pub executor: DualLegExecutor,
    pub inventory_refresher: InventoryRefresher,
    pub trade_log: TradeLogWriter,
    pub price_log: PriceLogger,
    pub whitelist: RouteWhitelist,
    pub tokens: Vec<TokenDescriptor>,
    pub ref_symbol: String,
    pub paused: AtomicBool,
    tick_count: std::sync::atomic::AtomicU64,
    cooldown: RouteCooldown,
    balance_checker: BalanceChecker,
    bridge_controller: BridgeController,
    trades_today: HashMap<String, u32>,
    ticks_since_inventory_refresh: std::sync::atomic::AtomicU64,
    consecutive_execution_failures: u32,
}

/// Everything required to assemble a `Scheduler`, collected so `main`
/// doesn't have to know about its private bookkeeping fields.
pub struct SchedulerDeps {
    pub config: EngineConfig,
    pub state: Arc<StateStore>,
    pub primary_quotes: Arc<dyn QuoteProvider>,
    pub secondary_quotes: Arc<dyn QuoteProvider>,
    pub validator: QuoteValidator,
    pub oracle: PriceOracle,
    pub registry: StrategyRegistry,
    pub executor: DualLegExecutor,
    pub inventory_refresher: InventoryRefresher,
    pub trade_log: TradeLogWriter,
    pub price_log: PriceLogger,
    pub whitelist: RouteWhitelist,
    pub tokens: Vec<TokenDescriptor>,
    pub ref_symbol: String,
    pub balance_checker: BalanceChecker,
    pub bridge_controller: BridgeController,
}

impl Scheduler {
    pub fn new(deps: SchedulerDeps) -> Self {
        let paused = deps.config.paused;
        Self {
            config: deps.config,
            state: deps.state,
            primary_quotes: deps.primary_quotes,
            secondary_quotes: deps.secondary_quotes,
            validator: deps.validator,
            oracle: deps.oracle,
            registry: deps.registry,
            executor: deps.executor,
            inventory_refresher: deps.inventory_refresher,
            trade_log: deps.trade_log,
            price_log: deps.price_log,
            whitelist: deps.whitelist,
            tokens: deps.tokens,
            ref_symbol: deps.ref_symbol,
            paused: AtomicBool::new(paused),
            tick_count: std::sync::atomic::AtomicU64::new(0),
            cooldown: RouteCooldown::new(Duration::from_secs(60), Duration::from_secs(3600)),
            balance_checker: deps.balance_checker,
            bridge_controller: deps.bridge_controller,
            trades_today: HashMap::new(),
            ticks_since_inventory_refresh: std::sync::atomic::AtomicU64::new(0),
            consecutive_execution_failures: 0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Drives the engine forever at `config.tick_interval_secs`. Returns
    /// only on an unrecoverable error (state store corruption, etc).
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.tick_interval_secs));
        let refresh_every_ticks = (self.config.inventory_refresh_interval_secs / self.config.tick_interval_secs.max(1)).max(1);

        loop {
            ticker.tick().await;
            self.run_tick(refresh_every_ticks).await;
        }
    }

    async fn run_tick(&mut self, refresh_every_ticks: u64) {
        let tick = self.tick_count.fetch_add(1, Ordering::SeqCst) + 1;
        let start = std::time::Instant::now();
        events::tick_started(tick);

        let symbols: Vec<String> = self.tokens.iter().map(|t| t.symbol.clone()).collect();
        let inventory = self.state.get_state().inventory;

        self.balance_checker.check_balances(&self.tokens, &inventory);

        let bridge_plans = self.bridge_controller.plan_bridges(&symbols, &inventory, Utc::now());
        for plan in bridge_plans {
            self.issue_bridge(plan).await;
        }

        let mut executed_count = 0;
        if !self.is_paused() {
            executed_count = self.evaluate_and_execute(&inventory).await;
        } else {
            info!("engine paused, skipping strategy evaluation this tick");
        }

        if self.ticks_since_inventory_refresh.fetch_add(1, Ordering::SeqCst) + 1 >= refresh_every_ticks {
            self.ticks_since_inventory_refresh.store(0, Ordering::SeqCst);
            self.refresh_inventory().await;
        }

        events::tick_completed(tick, start.elapsed().as_millis() as u64, executed_count);
    }

    async fn issue_bridge(&mut self, plan: crate::bridge::BridgePlan) {
        let record = crate::types::BridgeRecord {
            id: format!("bridge-{}-{}", plan.token, Utc::now().timestamp_millis()),
            token: plan.token.clone(),
            from_venue: plan.from_venue,
            to_venue: plan.to_venue,
            amount: plan.amount,
            submitted_at: Utc::now(),
            status: BridgeStatus::Pending,
            last_poll_at: None,
            chain_refs: Vec::new(),
            retry_count: 0,
        };

        events::bridge_submitted(&plan.token, &plan.amount.to_string());
        self.bridge_controller.record_issued(&plan.token, Utc::now());
        if let Err(e) = self.state.append_bridge(record) {
            warn!(error = %e, "failed to persist bridge record");
        }
    }

    async fn evaluate_and_execute(&mut self, inventory: &crate::types::InventorySnapshot) -> usize {
        let strategies = self.registry.enabled_strategies();
        let mut executed = 0;

        let bridge_cost_ref = self
            .oracle
            .get_price_usd(&self.ref_symbol)
            .await
            .ok()
            .and_then(|ref_usd| {
                amortised_bridge_cost_ref(
                    self.config.auto_bridging.bridge_cost_usd,
                    self.config.auto_bridging.trades_per_bridge,
                    Some(ref_usd),
                    self.config.trading.fallback_ref_usd_price,
                )
            })
            .unwrap_or(Money::ZERO);

        for token in &self.tokens {
            if !token.enabled || !self.balance_checker.can_token_trade(&token.symbol) {
                continue;
            }
            if !self.whitelist.is_allowed(Venue::Secondary, &token.symbol) {
                continue;
            }

            let evaluator = StrategyEvaluator {
                primary: self.primary_quotes.clone(),
                secondary: self.secondary_quotes.clone(),
                validator: &self.validator,
                oracle: &self.oracle,
                cooldown: &self.cooldown,
                ref_symbol: &self.ref_symbol,
                risk_buffer_bps: self.config.trading.risk_buffer_bps,
                max_price_impact_bps: self.config.trading.max_price_impact_bps,
                max_daily_trades: self.config.trading.max_daily_trades,
                min_edge_bps: self.config.trading.min_edge_bps,
                reverse_min_edge_bps: self.config.trading.reverse_min_edge_bps(),
                pacing: crate::strategy::DEFAULT_STRATEGY_PACING,
                bridge_cost_ref,
            };

            let trades_today = *self.trades_today.get(&token.symbol).unwrap_or(&0);
            let token_in_cooldown = self.state.is_token_in_cooldown(&token.symbol);
            let mut cache = QuoteCache::new();
            let results = evaluator
                .evaluate_token(token, &strategies, trades_today, token_in_cooldown, inventory, &mut cache)
                .await;

            for result in &results {
                if let Some(edge) = &result.edge {
                    events::strategy_evaluated(&token.symbol, &result.strategy_id, edge.net_edge_bps, result.should_proceed);
                    self.price_log.log_row(&PriceLogRow {
                        token: &token.symbol,
                        strategy_id: &result.strategy_id,
                        direction: edge.direction,
                        primary_price: result.primary_price.unwrap_or(Money::ZERO),
                        secondary_price: result.secondary_price.unwrap_or(Money::ZERO),
                        net_edge_bps: edge.net_edge_bps,
                    });
                }
                if !result.success {
                    events::quote_rejected(&token.symbol, &result.strategy_id, &result.reasons);
                }
            }

            if let Some(best) = select_best(&results) {
                self.execute_best(token, best, &strategies).await;
                executed += 1;
                *self.trades_today.entry(token.symbol.clone()).or_insert(0) += 1;
            }
        }

        executed
    }

    async fn execute_best(&mut self, token: &TokenDescriptor, best: &crate::strategy::EvaluationResult, strategies: &[crate::types::StrategyDescriptor]) {
        let Some(strategy) = strategies.iter().find(|s| s.id == best.strategy_id) else {
            return;
        };
        let Some(edge) = &best.edge else {
            return;
        };
        let Some(direction) = strategy.direction() else {
            return;
        };

        events::trade_planned(&token.symbol, &strategy.id);

        // `income` is whatever the sell-side leg receives, `expense` is
        // whatever the buy-side leg pays; which venue sells flips with
        // direction (see Direction::sell_side).
        let (primary_expected_amount, secondary_expected_amount) = match direction {
            Direction::Forward => (edge.income, edge.expense),
            Direction::Reverse => (edge.expense, edge.income),
        };

        let plan = ExecutionPlan {
            direction,
            symbol: &token.symbol,
            trade_size: token.trade_size,
            primary_op: strategy.primary_side.op,
            primary_quote_currency: &strategy.primary_side.quote_currency,
            primary_expected_amount,
            secondary_op: strategy.secondary_side.op,
            secondary_quote_currency: &strategy.secondary_side.quote_currency,
            secondary_expected_amount,
            edge_bps: edge.net_edge_bps,
            mode: self.config.run_mode,
        };

        if self.config.run_mode == RunMode::Live {
            events::trade_submitted(&token.symbol, &strategy.id);
        }

        let result = self.executor.execute(&plan).await;
        events::trade_settled(&token.symbol, &strategy.id, result.partial_success);

        let both_failed = !result.primary.is_ok() && !result.secondary.is_ok();
        if !result.partial_success && result.primary.is_ok() && result.secondary.is_ok() {
            self.cooldown.record_success(&token.symbol, &strategy.id);
            self.consecutive_execution_failures = 0;
        } else {
            self.cooldown.record_failure(&token.symbol, &strategy.id, Utc::now());
            if both_failed {
                self.consecutive_execution_failures += 1;
                if self.consecutive_execution_failures >= self.config.trading.circuit_breaker_max_consecutive_failures {
                    events::error_event(
                        crate::errors::ErrorKind::Execution,
                        "scheduler",
                        "circuit breaker tripped",
                        &format!("{} consecutive execution failures", self.consecutive_execution_failures),
                    );
                    self.set_paused(true);
                }
            }
        }

        let _ = self.state.record_trade();
        let _ = self.state.set_cooldown(&token.symbol, token.cooldown_minutes.unwrap_or(15) as i64 * 60_000, "post-trade rest");

        let entry = TradeLogEntry {
            timestamp_iso: Utc::now().to_rfc3339(),
            mode: self.config.run_mode,
            token: token.symbol.clone(),
            trade_size: token.trade_size,
            direction,
            strategy_id: strategy.id.clone(),
            success: result.primary.is_ok() && result.secondary.is_ok(),
            expected: LegExpectation {
                gc_proceeds: edge.income,
                sol_cost: edge.expense,
                net_edge: edge.net_edge,
                net_edge_bps: edge.net_edge_bps,
                impacts: Impacts { primary_bps: edge.impacts.primary_bps, secondary_bps: edge.impacts.secondary_bps },
            },
            actual: None,
            primary_txid: leg_txid(&result.primary),
            secondary_txid: leg_txid(&result.secondary),
            primary_error: leg_error(&result.primary),
            secondary_error: leg_error(&result.secondary),
            execution_duration_ms: result.duration_ms,
        };

        if let Err(e) = self.trade_log.append(&entry) {
            warn!(error = %e, "failed to append trade log entry");
        }

        // Re-check balances immediately after execution so a depleted
        // token pauses before the next tick rather than one tick late.
        let inventory = self.state.get_state().inventory;
        self.balance_checker.check_balances(std::slice::from_ref(token), &inventory);
    }

    async fn refresh_inventory(&mut self) {
        let targets: Vec<_> = self
            .tokens
            .iter()
            .map(|t| crate::inventory::RefreshTarget {
                symbol: &t.symbol,
                primary_mint: &t.primary_mint,
                secondary_mint: &t.secondary_mint,
                decimals: t.decimals,
            })
            .collect();

        let previous = self.state.get_state().inventory;
        let next = self.inventory_refresher.refresh(&targets, &previous).await;
        let count = next.primary.len() + next.secondary.len();

        for (symbol, balance) in next.primary.iter() {
            let _ = self.state.update_chain_inventory(Venue::Primary, balance.clone());
            let _ = symbol;
        }
        for (symbol, balance) in next.secondary.iter() {
            let _ = self.state.update_chain_inventory(Venue::Secondary, balance.clone());
            let _ = symbol;
        }

        events::inventory_refreshed(count);
    }
}

fn leg_txid(leg: &crate::executor::LegResult) -> Option<String> {
    match leg {
        crate::executor::LegResult::Settled(outcome) => Some(outcome.txid.clone()),
        _ => None,
    }
}

fn leg_error(leg: &crate::executor::LegResult) -> Option<String> {
    match leg {
        crate::executor::LegResult::Failed(e) => Some(e.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_txid_only_present_on_settlement() {
        let settled = crate::executor::LegResult::Settled(crate::executor::LegOutcome { txid: "tx1".into(), actual_amount: Money::ZERO });
        assert_eq!(leg_txid(&settled), Some("tx1".to_string()));
        let failed = crate::executor::LegResult::Failed("boom".into());
        assert_eq!(leg_txid(&failed), None);
        assert_eq!(leg_error(&failed), Some("boom".to_string()));
    }

    #[test]
    fn refresh_interval_ticks_are_at_least_one() {
        let tick_secs: u64 = 15;
        let refresh_secs: u64 = 5;
        let ratio = (refresh_secs / tick_secs.max(1)).max(1);
        assert_eq!(ratio, 1);
    }
}
