//! Quote validator (C4)
//!
//! Freshness, completeness, and liquidity-sufficiency checks. Pure and
//! synchronous — no I/O, per spec's design note that non-I/O logic stays
//! testable without an async runtime.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;

use crate::money::Money;
use crate::types::Quote;

/// Minimum acceptable liquidity floor, independent of trade size.
pub const MIN_ABSOLUTE_LIQUIDITY: i64 = 100;

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub min_price: Money,
    pub max_acceptable_impact_bps: i64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_price: Money::new(dec!(0.00000001)),
            max_acceptable_impact_bps: 1_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub age_sec: i64,
    pub expired: bool,
}

pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, quote: Option<&Quote>, trade_size: Money, now: DateTime<Utc>) -> ValidationOutcome {
        let Some(quote) = quote else {
            return ValidationOutcome {
                valid: false,
                errors: vec!["null".to_string()],
                warnings: Vec::new(),
                age_sec: 0,
                expired: true,
            };
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let age_sec = quote.age_seconds(now);
        let expired = quote.is_expired(now);
        if expired {
            errors.push("Quote expired".to_string());
        }

        if quote.price < self.config.min_price {
            errors.push("Price below minimum".to_string());
        }

        if quote.price_impact_bps < 0 || quote.price_impact_bps > self.config.max_acceptable_impact_bps {
            errors.push("Price impact outside acceptable range".to_string());
        }

        // `liquidity` is optional per the venue — the secondary/aggregator
        // venue legitimately has no pool-liquidity figure to report. The
        // floor only applies when a venue actually reports one.
        let min_required_liquidity = Money::from_i64(MIN_ABSOLUTE_LIQUIDITY).max(trade_size * Money::from_i64(2));
        if let Some(liquidity) = quote.liquidity {
            if liquidity < min_required_liquidity {
                errors.push("Insufficient pool liquidity".to_string());
            } else if liquidity < trade_size * Money::from_i64(3) {
                warnings.push("Liquidity within 2x-3x of trade size".to_string());
            }
        }

        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
            warnings,
            age_sec,
            expired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Op, Venue};
    use chrono::Duration;

    fn fresh_quote(liquidity: Option<Money>) -> Quote {
        let now = Utc::now();
        Quote {
            venue: Venue::Primary,
            symbol: "T".to_string(),
            side: Op::Sell,
            trade_size: Money::from_i64(1500),
            quote_currency: "REF".to_string(),
            price: Money::new(dec!(0.001234)),
            price_impact_bps: 25,
            min_output: Money::from_i64(1),
            fees: Money::ZERO,
            timestamp: now,
            expires_at: now + Duration::seconds(30),
            liquidity,
        }
    }

    #[test]
    fn null_quote_is_invalid() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let outcome = validator.validate(None, Money::from_i64(100), Utc::now());
        assert!(!outcome.valid);
        assert_eq!(outcome.errors, vec!["null".to_string()]);
    }

    #[test]
    fn expired_quote_fails() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let mut quote = fresh_quote(Some(Money::from_i64(5000)));
        quote.expires_at = quote.timestamp - Duration::seconds(1);
        let outcome = validator.validate(Some(&quote), Money::from_i64(1500), Utc::now());
        assert!(!outcome.valid);
        assert!(outcome.expired);
    }

    #[test]
    fn insufficient_liquidity_rejected() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let quote = fresh_quote(Some(Money::from_i64(50)));
        let outcome = validator.validate(Some(&quote), Money::from_i64(1500), Utc::now());
        assert!(!outcome.valid);
        assert!(outcome.errors.iter().any(|e| e.contains("liquidity")));
    }

    #[test]
    fn borderline_liquidity_warns_but_passes() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let quote = fresh_quote(Some(Money::from_i64(2500)));
        let outcome = validator.validate(Some(&quote), Money::from_i64(1000), Utc::now());
        assert!(outcome.valid);
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn absent_liquidity_is_not_an_error() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let quote = fresh_quote(None);
        let outcome = validator.validate(Some(&quote), Money::from_i64(1500), Utc::now());
        assert!(outcome.valid, "errors: {:?}", outcome.errors);
    }

    #[test]
    fn ample_liquidity_has_no_warnings() {
        let validator = QuoteValidator::new(ValidatorConfig::default());
        let quote = fresh_quote(Some(Money::from_i64(10_000)));
        let outcome = validator.validate(Some(&quote), Money::from_i64(1000), Utc::now());
        assert!(outcome.valid);
        assert!(outcome.warnings.is_empty());
    }
}
