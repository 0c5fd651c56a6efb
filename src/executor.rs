//! Dual-leg executor (C9)
//!
//! Submits both legs of a selected arbitrage concurrently and aggregates
//! the outcome. A leg that has been broadcast is never retried; if only
//! one leg confirms, the trade is marked `partialSuccess` and the token
//! is flagged for operator attention rather than unwound automatically.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, warn};

use crate::errors::ExecutionError;
use crate::money::Money;
use crate::quotes::QuoteProvider;
use crate::types::{Direction, Op, RunMode};

/// Capability: submit a swap and wait for it to settle.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn submit_swap(
        &self,
        symbol: &str,
        trade_size: Money,
        op: Op,
        quote_currency: &str,
        slippage_bps: i64,
    ) -> Result<LegOutcome, ExecutionError>;
}

#[derive(Debug, Clone)]
pub struct LegOutcome {
    pub txid: String,
    pub actual_amount: Money,
}

#[derive(Debug, Clone)]
pub enum LegResult {
    Planned { expected_amount: Money },
    Settled(LegOutcome),
    Failed(String),
}

impl LegResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, LegResult::Planned { .. } | LegResult::Settled(_))
    }
}

#[derive(Debug, Clone)]
pub struct DualLegResult {
    pub primary: LegResult,
    pub secondary: LegResult,
    pub partial_success: bool,
    pub duration_ms: u64,
}

/// Clamp the dynamic slippage tolerance: floor at `base_bps`, cap at
/// `base_bps * max_multiplier`, target `edge_bps * edge_ratio`.
pub fn dynamic_slippage_bps(base_bps: i64, max_multiplier: f64, edge_ratio: f64, edge_bps: i64) -> i64 {
    let floor = base_bps as f64;
    let cap = base_bps as f64 * max_multiplier;
    let target = edge_bps as f64 * edge_ratio;
    target.clamp(floor, cap).round() as i64
}

/// `None` when the re-quote is usable (fetched and not expired); otherwise
/// a reason describing why submission must not proceed.
fn requote_problem(
    result: &Result<crate::types::Quote, crate::errors::QuoteError>,
    now: chrono::DateTime<Utc>,
    leg: &str,
) -> Option<String> {
    match result {
        Err(e) => Some(format!("{leg} requote failed: {e}")),
        Ok(quote) if quote.is_expired(now) => Some(format!("{leg} requote expired immediately")),
        Ok(_) => None,
    }
}

pub struct DualLegExecutor {
    pub primary: Arc<dyn SwapExecutor>,
    pub secondary: Arc<dyn SwapExecutor>,
    pub primary_quotes: Arc<dyn QuoteProvider>,
    pub secondary_quotes: Arc<dyn QuoteProvider>,
    pub base_slippage_bps: i64,
    pub max_slippage_multiplier: f64,
    pub slippage_edge_ratio: f64,
}

pub struct ExecutionPlan<'a> {
    pub direction: Direction,
    pub symbol: &'a str,
    pub trade_size: Money,
    pub primary_op: Op,
    pub primary_quote_currency: &'a str,
    pub primary_expected_amount: Money,
    pub secondary_op: Op,
    pub secondary_quote_currency: &'a str,
    pub secondary_expected_amount: Money,
    pub edge_bps: i64,
    pub mode: RunMode,
}

impl DualLegExecutor {
    pub async fn execute(&self, plan: &ExecutionPlan<'_>) -> DualLegResult {
        let start = Instant::now();

        if plan.mode == RunMode::DryRun {
            return DualLegResult {
                primary: LegResult::Planned { expected_amount: plan.primary_expected_amount },
                secondary: LegResult::Planned { expected_amount: plan.secondary_expected_amount },
                partial_success: false,
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        // Quotes used to select this trade may be stale by the time we get
        // here — re-quote both venues and bail out before submitting
        // anything broadcast-irreversible if either leg can't be refreshed.
        let (primary_requote, secondary_requote) = tokio::join!(
            self.primary_quotes.get_quote(plan.symbol, plan.trade_size, plan.primary_op, plan.primary_quote_currency),
            self.secondary_quotes.get_quote(plan.symbol, plan.trade_size, plan.secondary_op, plan.secondary_quote_currency),
        );

        let now = Utc::now();
        let stale_reason = requote_problem(&primary_requote, now, "primary")
            .or_else(|| requote_problem(&secondary_requote, now, "secondary"));

        if let Some(reason) = stale_reason {
            warn!(symbol = plan.symbol, reason = %reason, "aborting execution: requote failed before submission");
            return DualLegResult {
                primary: LegResult::Failed(reason.clone()),
                secondary: LegResult::Failed(reason),
                partial_success: false,
                duration_ms: start.elapsed().as_millis() as u64,
            };
        }

        let slippage_bps = dynamic_slippage_bps(
            self.base_slippage_bps,
            self.max_slippage_multiplier,
            self.slippage_edge_ratio,
            plan.edge_bps,
        );

        let primary_fut = self.primary.submit_swap(
            plan.symbol,
            plan.trade_size,
            plan.primary_op,
            plan.primary_quote_currency,
            slippage_bps,
        );
        let secondary_fut = self.secondary.submit_swap(
            plan.symbol,
            plan.trade_size,
            plan.secondary_op,
            plan.secondary_quote_currency,
            slippage_bps,
        );

        let (primary_res, secondary_res) = tokio::join!(primary_fut, secondary_fut);

        let primary = match primary_res {
            Ok(outcome) => LegResult::Settled(outcome),
            Err(e) => LegResult::Failed(e.to_string()),
        };
        let secondary = match secondary_res {
            Ok(outcome) => LegResult::Settled(outcome),
            Err(e) => LegResult::Failed(e.to_string()),
        };

        let partial_success = primary.is_ok() != secondary.is_ok();
        if partial_success {
            warn!(symbol = plan.symbol, "partial execution: one leg settled, one failed; no automatic unwind");
        } else if !primary.is_ok() && !secondary.is_ok() {
            error!(symbol = plan.symbol, "both legs failed");
        }

        DualLegResult {
            primary,
            secondary,
            partial_success,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QuoteError;
    use crate::types::{Quote, Venue};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubExecutor {
        should_fail: AtomicBool,
    }

    #[async_trait]
    impl SwapExecutor for StubExecutor {
        async fn submit_swap(
            &self,
            _symbol: &str,
            trade_size: Money,
            _op: Op,
            _quote_currency: &str,
            _slippage_bps: i64,
        ) -> Result<LegOutcome, ExecutionError> {
            if self.should_fail.load(Ordering::SeqCst) {
                Err(ExecutionError::Rejected("stub rejection".to_string()))
            } else {
                Ok(LegOutcome { txid: "tx123".to_string(), actual_amount: trade_size })
            }
        }
    }

    enum RequoteBehavior {
        Fresh,
        Expired,
        NetworkError,
    }

    struct StubQuoteProvider {
        venue: Venue,
        behavior: RequoteBehavior,
    }

    #[async_trait]
    impl QuoteProvider for StubQuoteProvider {
        fn venue(&self) -> Venue {
            self.venue
        }

        async fn get_quote(&self, symbol: &str, trade_size: Money, op: Op, quote_currency: &str) -> Result<Quote, QuoteError> {
            match self.behavior {
                RequoteBehavior::NetworkError => Err(QuoteError::Network("stub timeout".to_string())),
                RequoteBehavior::Fresh | RequoteBehavior::Expired => {
                    let now = Utc::now();
                    let expires_at = match self.behavior {
                        RequoteBehavior::Expired => now - chrono::Duration::seconds(5),
                        _ => now + chrono::Duration::seconds(30),
                    };
                    Ok(Quote {
                        venue: self.venue,
                        symbol: symbol.to_string(),
                        side: op,
                        trade_size,
                        quote_currency: quote_currency.to_string(),
                        price: Money::new(dec!(0.001)),
                        price_impact_bps: 10,
                        min_output: trade_size,
                        fees: Money::ZERO,
                        timestamp: now,
                        expires_at,
                        liquidity: None,
                    })
                }
            }
        }
    }

    fn fresh_quote_providers() -> (Arc<dyn QuoteProvider>, Arc<dyn QuoteProvider>) {
        (
            Arc::new(StubQuoteProvider { venue: Venue::Primary, behavior: RequoteBehavior::Fresh }),
            Arc::new(StubQuoteProvider { venue: Venue::Secondary, behavior: RequoteBehavior::Fresh }),
        )
    }

    fn plan(mode: RunMode) -> ExecutionPlan<'static> {
        ExecutionPlan {
            direction: Direction::Forward,
            symbol: "GALA",
            trade_size: Money::from_i64(1500),
            primary_op: Op::Sell,
            primary_quote_currency: "REF",
            primary_expected_amount: Money::from_i64(2),
            secondary_op: Op::Buy,
            secondary_quote_currency: "SOL",
            secondary_expected_amount: Money::from_i64(1),
            edge_bps: 80,
            mode,
        }
    }

    #[test]
    fn slippage_floors_at_base() {
        assert_eq!(dynamic_slippage_bps(50, 2.0, 0.75, 10), 50);
    }

    #[test]
    fn slippage_caps_at_base_times_multiplier() {
        assert_eq!(dynamic_slippage_bps(50, 2.0, 0.75, 10_000), 100);
    }

    #[test]
    fn slippage_targets_edge_ratio_between_bounds() {
        assert_eq!(dynamic_slippage_bps(50, 2.0, 0.75, 100), 75);
    }

    #[tokio::test]
    async fn dry_run_never_submits() {
        let (primary_quotes, secondary_quotes) = fresh_quote_providers();
        let executor = DualLegExecutor {
            primary: Arc::new(StubExecutor { should_fail: AtomicBool::new(true) }),
            secondary: Arc::new(StubExecutor { should_fail: AtomicBool::new(true) }),
            primary_quotes,
            secondary_quotes,
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::DryRun)).await;
        assert!(result.primary.is_ok());
        assert!(result.secondary.is_ok());
        assert!(!result.partial_success);
    }

    #[tokio::test]
    async fn partial_success_is_flagged() {
        let (primary_quotes, secondary_quotes) = fresh_quote_providers();
        let executor = DualLegExecutor {
            primary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            secondary: Arc::new(StubExecutor { should_fail: AtomicBool::new(true) }),
            primary_quotes,
            secondary_quotes,
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::Live)).await;
        assert!(result.partial_success);
        assert!(result.primary.is_ok());
        assert!(!result.secondary.is_ok());
    }

    #[tokio::test]
    async fn both_legs_succeed_live() {
        let (primary_quotes, secondary_quotes) = fresh_quote_providers();
        let executor = DualLegExecutor {
            primary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            secondary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            primary_quotes,
            secondary_quotes,
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::Live)).await;
        assert!(!result.partial_success);
        assert!(result.primary.is_ok() && result.secondary.is_ok());
    }

    #[tokio::test]
    async fn live_execution_requotes_before_submitting() {
        let requoted = Arc::new(AtomicBool::new(false));
        struct TrackingProvider {
            venue: Venue,
            requoted: Arc<AtomicBool>,
        }
        #[async_trait]
        impl QuoteProvider for TrackingProvider {
            fn venue(&self) -> Venue {
                self.venue
            }
            async fn get_quote(&self, symbol: &str, trade_size: Money, op: Op, quote_currency: &str) -> Result<Quote, QuoteError> {
                self.requoted.store(true, Ordering::SeqCst);
                let now = Utc::now();
                Ok(Quote {
                    venue: self.venue,
                    symbol: symbol.to_string(),
                    side: op,
                    trade_size,
                    quote_currency: quote_currency.to_string(),
                    price: Money::new(dec!(0.001)),
                    price_impact_bps: 10,
                    min_output: trade_size,
                    fees: Money::ZERO,
                    timestamp: now,
                    expires_at: now + chrono::Duration::seconds(30),
                    liquidity: None,
                })
            }
        }

        let executor = DualLegExecutor {
            primary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            secondary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            primary_quotes: Arc::new(TrackingProvider { venue: Venue::Primary, requoted: requoted.clone() }),
            secondary_quotes: Arc::new(StubQuoteProvider { venue: Venue::Secondary, behavior: RequoteBehavior::Fresh }),
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::Live)).await;
        assert!(requoted.load(Ordering::SeqCst), "execute() must re-fetch a quote before submitting");
        assert!(result.primary.is_ok() && result.secondary.is_ok());
    }

    #[tokio::test]
    async fn expired_requote_aborts_without_submitting() {
        let submitted = Arc::new(AtomicBool::new(false));
        struct TrackingExecutor {
            submitted: Arc<AtomicBool>,
        }
        #[async_trait]
        impl SwapExecutor for TrackingExecutor {
            async fn submit_swap(&self, _symbol: &str, trade_size: Money, _op: Op, _quote_currency: &str, _slippage_bps: i64) -> Result<LegOutcome, ExecutionError> {
                self.submitted.store(true, Ordering::SeqCst);
                Ok(LegOutcome { txid: "should-not-happen".to_string(), actual_amount: trade_size })
            }
        }

        let executor = DualLegExecutor {
            primary: Arc::new(TrackingExecutor { submitted: submitted.clone() }),
            secondary: Arc::new(TrackingExecutor { submitted: submitted.clone() }),
            primary_quotes: Arc::new(StubQuoteProvider { venue: Venue::Primary, behavior: RequoteBehavior::Expired }),
            secondary_quotes: Arc::new(StubQuoteProvider { venue: Venue::Secondary, behavior: RequoteBehavior::Fresh }),
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::Live)).await;
        assert!(!submitted.load(Ordering::SeqCst), "expired requote must prevent any leg submission");
        assert!(!result.primary.is_ok());
        assert!(!result.secondary.is_ok());
        assert!(!result.partial_success);
    }

    #[tokio::test]
    async fn requote_network_error_aborts_without_submitting() {
        let (_, secondary_quotes) = fresh_quote_providers();
        let executor = DualLegExecutor {
            primary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            secondary: Arc::new(StubExecutor { should_fail: AtomicBool::new(false) }),
            primary_quotes: Arc::new(StubQuoteProvider { venue: Venue::Primary, behavior: RequoteBehavior::NetworkError }),
            secondary_quotes,
            base_slippage_bps: 50,
            max_slippage_multiplier: 2.0,
            slippage_edge_ratio: 0.75,
        };
        let result = executor.execute(&plan(RunMode::Live)).await;
        assert!(!result.primary.is_ok());
        assert!(!result.partial_success);
    }
}
