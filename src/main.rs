//! Cross-venue arbitrage engine — entry point
//!
//! Loads config/tokens/strategies, wires up both venues' capability clients,
//! assembles the scheduler, and drives it until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use dexarb_engine::balance::BalanceChecker;
use dexarb_engine::bridge::BridgeController;
use dexarb_engine::config;
use dexarb_engine::executor::DualLegExecutor;
use dexarb_engine::inventory::InventoryRefresher;
use dexarb_engine::oracle::PriceOracle;
use dexarb_engine::pricelog::PriceLogger;
use dexarb_engine::quotes::{PrimaryQuoteProvider, SecondaryQuoteProvider};
use dexarb_engine::state::StateStore;
use dexarb_engine::strategy::StrategyRegistry;
use dexarb_engine::tradelog::TradeLogWriter;
use dexarb_engine::types::RunMode;
use dexarb_engine::validator::{QuoteValidator, ValidatorConfig};
use dexarb_engine::whitelist::RouteWhitelist;
use dexarb_engine::{Scheduler, SchedulerDeps};

#[derive(Parser, Debug)]
#[command(name = "dexarb-engine", about = "Cross-venue (GalaChain/Solana) arbitrage engine")]
struct Cli {
    /// Path to the trading/autoBridging/balanceChecking JSON config.
    #[arg(long, env = "ENGINE_CONFIG_PATH", default_value = "config/trading.json")]
    config: String,

    /// Path to the tokens + quote-tokens JSON file.
    #[arg(long, env = "ENGINE_TOKENS_PATH", default_value = "config/tokens.json")]
    tokens: String,

    /// Path to the strategies JSON file.
    #[arg(long, env = "ENGINE_STRATEGIES_PATH", default_value = "config/strategies.json")]
    strategies: String,

    /// Force live execution regardless of RUN_MODE.
    #[arg(long)]
    live: bool,

    /// Force dry-run regardless of RUN_MODE.
    #[arg(long)]
    dry_run: bool,

    /// Override the tick interval, in seconds.
    #[arg(long)]
    tick_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut engine_config =
        config::load_config(&cli.config).with_context(|| format!("loading config from {}", cli.config))?;
    if cli.live {
        engine_config.run_mode = RunMode::Live;
    } else if cli.dry_run {
        engine_config.run_mode = RunMode::DryRun;
    }
    if let Some(secs) = cli.tick_interval {
        engine_config.tick_interval_secs = secs;
    }

    info!(run_mode = ?engine_config.run_mode, tick_interval_secs = engine_config.tick_interval_secs, "engine config loaded");

    let tokens_file =
        config::load_tokens(&cli.tokens).with_context(|| format!("loading tokens from {}", cli.tokens))?;
    let tokens: Vec<_> = tokens_file.tokens.into_values().collect();

    let strategies = config::load_strategies(&cli.strategies)
        .with_context(|| format!("loading strategies from {}", cli.strategies))?;

    let state = Arc::new(
        StateStore::load(&engine_config.state_snapshot_path)
            .with_context(|| format!("loading state snapshot from {}", engine_config.state_snapshot_path))?,
    );

    let primary_client = Arc::new(
        PrimaryQuoteProvider::new(engine_config.credentials.primary_endpoint.clone())
            .with_signer(engine_config.credentials.primary_signer.clone()),
    );
    let secondary_client = Arc::new(
        SecondaryQuoteProvider::new(engine_config.credentials.secondary_endpoint.clone())
            .with_signer(engine_config.credentials.secondary_signer.clone()),
    );

    let oracle = PriceOracle::new(
        engine_config.credentials.primary_endpoint.clone(),
        engine_config.credentials.oracle_api_key.clone(),
    );
    let validator = QuoteValidator::new(ValidatorConfig::default());
    let registry = StrategyRegistry::new(strategies);

    let executor = DualLegExecutor {
        primary: primary_client.clone(),
        secondary: secondary_client.clone(),
        primary_quotes: primary_client.clone(),
        secondary_quotes: secondary_client.clone(),
        base_slippage_bps: engine_config.trading.max_slippage_bps,
        max_slippage_multiplier: engine_config.trading.dynamic_slippage_max_multiplier,
        slippage_edge_ratio: engine_config.trading.dynamic_slippage_edge_ratio,
    };
    let inventory_refresher = InventoryRefresher::new(primary_client.clone(), secondary_client.clone());

    let trade_log = TradeLogWriter::new(&engine_config.trade_log_dir)
        .with_context(|| format!("opening trade log at {}", engine_config.trade_log_dir))?;
    let price_log = PriceLogger::new(&engine_config.price_log_dir, engine_config.price_log_enabled);
    let whitelist = match &engine_config.route_whitelist_path {
        Some(path) => RouteWhitelist::load(path).with_context(|| format!("loading route whitelist from {path}"))?,
        None => RouteWhitelist::default(),
    };

    let balance_checker = BalanceChecker::new(engine_config.balance_checking.clone());
    let bridge_controller = BridgeController::new(engine_config.auto_bridging.clone());
    let ref_symbol = engine_config.ref_symbol.clone();

    let scheduler = Scheduler::new(SchedulerDeps {
        config: engine_config,
        state,
        primary_quotes: primary_client,
        secondary_quotes: secondary_client,
        validator,
        oracle,
        registry,
        executor,
        inventory_refresher,
        trade_log,
        price_log,
        whitelist,
        tokens,
        ref_symbol,
        balance_checker,
        bridge_controller,
    });

    info!("engine assembled, starting tick loop");
    run_until_signal(scheduler).await
}

/// Drives the scheduler until SIGINT/SIGTERM, then returns so `main` can
/// unwind cleanly. State is durable after every tick (write-temp-then-rename
/// in `StateStore`), so there is no separate flush step on the way out.
#[cfg(unix)]
async fn run_until_signal(scheduler: Scheduler) -> Result<()> {
    use futures::StreamExt;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("registering signal handlers")?;

    tokio::select! {
        _ = scheduler.run() => {}
        Some(signal) = signals.next() => {
            info!(signal, "shutdown signal received, stopping tick loop");
        }
    }

    Ok(())
}

#[cfg(not(unix))]
async fn run_until_signal(scheduler: Scheduler) -> Result<()> {
    scheduler.run().await;
    Ok(())
}
