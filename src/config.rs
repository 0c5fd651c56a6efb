//! Configuration layer
//!
//! Config FILE parsing and schema validation live outside this crate; what
//! lives here is the closed-form typed struct the core consumes, and a
//! loader that turns the three JSON config files plus environment
//! credentials into it. Defaults are applied at load; unknown JSON keys
//! are ignored rather than rejected.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use crate::errors::ConfigError;
use crate::money::Money;
use crate::types::{QuoteTokenDescriptor, RunMode, StrategyDescriptor, TokenDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArbitrageDirection {
    Forward,
    Reverse,
    Best,
}

impl Default for ArbitrageDirection {
    fn default() -> Self {
        ArbitrageDirection::Best
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingConfig {
    pub min_edge_bps: i64,
    #[serde(default)]
    pub reverse_arbitrage_min_edge_bps: Option<i64>,
    pub max_slippage_bps: i64,
    pub risk_buffer_bps: i64,
    pub max_price_impact_bps: i64,
    pub cooldown_minutes: u32,
    pub max_daily_trades: u32,
    #[serde(default)]
    pub enable_reverse_arbitrage: bool,
    #[serde(default)]
    pub arbitrage_direction: ArbitrageDirection,
    #[serde(default = "default_dynamic_slippage_multiplier")]
    pub dynamic_slippage_max_multiplier: f64,
    #[serde(default = "default_dynamic_slippage_edge_ratio")]
    pub dynamic_slippage_edge_ratio: f64,
    /// Explicit opt-in fallback for the reference-unit USD price used in
    /// bridge-cost amortization when the oracle is unavailable. Absent by
    /// default — absence means `Err(OracleUnavailable)` rather than a
    /// silently fabricated price.
    #[serde(default)]
    pub fallback_ref_usd_price: Option<Money>,
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_max_consecutive_failures: u32,
}

fn default_circuit_breaker_threshold() -> u32 {
    5
}

fn default_dynamic_slippage_multiplier() -> f64 {
    2.0
}

fn default_dynamic_slippage_edge_ratio() -> f64 {
    0.75
}

impl TradingConfig {
    pub fn reverse_min_edge_bps(&self) -> i64 {
        self.reverse_arbitrage_min_edge_bps.unwrap_or(self.min_edge_bps)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBridgingConfig {
    pub enabled: bool,
    pub imbalance_threshold_percent: f64,
    pub target_split_percent: f64,
    pub min_rebalance_amount: Money,
    pub check_interval_minutes: u32,
    pub cooldown_minutes: u32,
    pub max_bridges_per_day: u32,
    #[serde(default)]
    pub enabled_tokens: Vec<String>,
    #[serde(default)]
    pub skip_tokens: Vec<String>,
    #[serde(default)]
    pub bridge_cost_usd: Option<Money>,
    #[serde(default)]
    pub trades_per_bridge: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheckingConfig {
    pub min_native_primary: Money,
    pub min_native_secondary: Money,
    pub balance_check_cooldown_seconds: u32,
    #[serde(default)]
    pub skip_tokens: Vec<String>,
}

/// Venue endpoints and secrets. Read from the environment rather than the
/// JSON config files, per spec's "Environment inputs the core consumes".
#[derive(Debug, Clone)]
pub struct Credentials {
    pub primary_endpoint: String,
    pub secondary_endpoint: String,
    pub primary_signer: String,
    pub secondary_signer: String,
    pub oracle_api_key: Option<String>,
    pub aggregator_api_key: Option<String>,
}

/// The fully assembled, validated configuration the core operates on.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub run_mode: RunMode,
    pub paused: bool,
    pub tick_interval_secs: u64,
    pub inventory_refresh_interval_secs: u64,
    pub trading: TradingConfig,
    pub auto_bridging: AutoBridgingConfig,
    pub balance_checking: BalanceCheckingConfig,
    pub credentials: Credentials,
    pub state_snapshot_path: String,
    pub trade_log_dir: String,
    pub price_log_enabled: bool,
    pub price_log_dir: String,
    pub route_whitelist_path: Option<String>,
    /// Denomination every edge, cost, and profit is reported in — the
    /// primary chain's base token by convention.
    pub ref_symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    trading: TradingConfig,
    auto_bridging: AutoBridgingConfig,
    balance_checking: BalanceCheckingConfig,
    #[serde(default)]
    state_snapshot_path: Option<String>,
    #[serde(default)]
    trade_log_dir: Option<String>,
    #[serde(default)]
    price_log_enabled: bool,
    #[serde(default)]
    price_log_dir: Option<String>,
    #[serde(default)]
    route_whitelist_path: Option<String>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load the JSON config file and merge in environment-sourced run mode,
/// pause flag, intervals, and credentials.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    dotenv::dotenv().ok();

    let file: ConfigFile = read_json(path.as_ref())?;

    let run_mode = match std::env::var("RUN_MODE").as_deref() {
        Ok("live") => RunMode::Live,
        _ => RunMode::DryRun,
    };

    let paused = std::env::var("ENGINE_PAUSED")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let tick_interval_secs = std::env::var("TICK_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15);

    let inventory_refresh_interval_secs = std::env::var("INVENTORY_REFRESH_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);

    let credentials = Credentials {
        primary_endpoint: std::env::var("PRIMARY_VENUE_ENDPOINT")
            .unwrap_or_else(|_| "https://dex-backend-prod1.defi.gala.com".to_string()),
        secondary_endpoint: std::env::var("SECONDARY_VENUE_ENDPOINT")
            .unwrap_or_else(|_| "https://quote-api.jup.ag".to_string()),
        primary_signer: std::env::var("PRIMARY_SIGNER").unwrap_or_default(),
        secondary_signer: std::env::var("SECONDARY_SIGNER").unwrap_or_default(),
        oracle_api_key: std::env::var("ORACLE_API_KEY").ok(),
        aggregator_api_key: std::env::var("AGGREGATOR_API_KEY").ok(),
    };

    if run_mode == RunMode::Live && (credentials.primary_signer.is_empty() || credentials.secondary_signer.is_empty()) {
        return Err(ConfigError::Invariant(
            "live run mode requires PRIMARY_SIGNER and SECONDARY_SIGNER".to_string(),
        ));
    }

    Ok(EngineConfig {
        run_mode,
        paused,
        tick_interval_secs,
        inventory_refresh_interval_secs,
        trading: file.trading,
        auto_bridging: file.auto_bridging,
        balance_checking: file.balance_checking,
        credentials,
        state_snapshot_path: file.state_snapshot_path.unwrap_or_else(|| "data/state.json".to_string()),
        trade_log_dir: file.trade_log_dir.unwrap_or_else(|| "data/trades".to_string()),
        price_log_enabled: file.price_log_enabled,
        price_log_dir: file.price_log_dir.unwrap_or_else(|| "data/prices".to_string()),
        route_whitelist_path: file.route_whitelist_path,
        ref_symbol: std::env::var("REF_SYMBOL").unwrap_or_else(|_| "GALA".to_string()),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokensFile {
    pub tokens: HashMap<String, TokenDescriptor>,
    #[serde(rename = "quoteTokens", alias = "quote_tokens")]
    pub quote_tokens: HashMap<String, QuoteTokenDescriptor>,
}

pub fn load_tokens<P: AsRef<Path>>(path: P) -> Result<TokensFile, ConfigError> {
    read_json(path.as_ref())
}

pub fn load_strategies<P: AsRef<Path>>(
    path: P,
) -> Result<HashMap<String, StrategyDescriptor>, ConfigError> {
    read_json(path.as_ref())
}
