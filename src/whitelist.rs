//! Route whitelist/blacklist (supplemented)
//!
//! An optional allow/deny list of (venue, symbol) routes, consulted by the
//! strategy evaluator before a quote is ever fetched. Lets an operator pull
//! one venue route out of rotation without editing the tokens file. Absent
//! a config file, every route is allowed (advisory default).
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::types::Venue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteWhitelistFile {
    /// "strict" = only allow-listed routes trade; "advisory" = only deny-listed routes blocked.
    pub enforcement: String,
    #[serde(default)]
    pub allow: Vec<RouteEntry>,
    #[serde(default)]
    pub deny: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub venue: Venue,
    pub symbol: String,
    #[serde(default)]
    pub reason: Option<String>,
}

pub struct RouteWhitelist {
    allowed: HashSet<(Venue, String)>,
    denied: HashSet<(Venue, String)>,
    strict: bool,
}

impl RouteWhitelist {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        let file: RouteWhitelistFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: RouteWhitelistFile) -> Self {
        let strict = file.enforcement.eq_ignore_ascii_case("strict");
        let allowed = file.allow.iter().map(|e| (e.venue, e.symbol.to_uppercase())).collect();
        let denied = file.deny.iter().map(|e| (e.venue, e.symbol.to_uppercase())).collect();
        info!(strict, allowed = file.allow.len(), denied = file.deny.len(), "route whitelist loaded");
        Self { allowed, denied, strict }
    }

    /// Is this (venue, symbol) route currently permitted to trade?
    pub fn is_allowed(&self, venue: Venue, symbol: &str) -> bool {
        let key = (venue, symbol.to_uppercase());
        if self.denied.contains(&key) {
            return false;
        }
        if self.strict {
            return self.allowed.contains(&key);
        }
        true
    }
}

impl Default for RouteWhitelist {
    fn default() -> Self {
        warn!("route whitelist not configured, defaulting to permissive advisory mode");
        Self { allowed: HashSet::new(), denied: HashSet::new(), strict: false }
    }
}
