//! Error taxonomy
//!
//! Every component error converts into `EngineError` so the scheduler
//! boundary can log `{kind, component, context, cause}` uniformly.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use thiserror::Error;

/// The six policy-bearing error kinds from the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transient transport/API errors. Retried at the next tick.
    Network,
    /// Quote malformed, liquidity insufficient, stale, impact excessive.
    Validation,
    /// Threshold, cooldown, inventory gate tripped.
    RiskGate,
    /// Swap submission rejected / confirmed-fail / partial success.
    Execution,
    /// Oracle/aggregator unavailable.
    ExternalApi,
    /// State corruption, config invariant violation, credential absent.
    System,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::RiskGate => "risk_gate",
            ErrorKind::Execution => "execution",
            ErrorKind::ExternalApi => "external_api",
            ErrorKind::System => "system",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level engine error. Carries the kind, the component that raised it,
/// free-form context, and the underlying cause.
#[derive(Debug, Error)]
#[error("[{kind}] {component}: {context} ({cause})")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub component: &'static str,
    pub context: String,
    pub cause: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, component: &'static str, context: impl Into<String>) -> Self {
        Self {
            kind,
            component,
            context: context.into(),
            cause: String::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = cause.to_string();
        self
    }
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("transport error: {0}")]
    Network(String),
    #[error("no route available for requested size")]
    NoRoute,
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(String),
    #[error("failed to write snapshot: {0}")]
    Write(String),
    #[error("snapshot corrupt on load: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate unavailable: no venue quote, no oracle cross, no fallback hint")]
    RateUnavailable,
    #[error("reference-unit USD price unavailable and no fallback configured")]
    OracleUnavailable,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("venue rejected submission: {0}")]
    Rejected(String),
    #[error("confirmed failure: {0}")]
    ConfirmedFail(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<QuoteError> for EngineError {
    fn from(e: QuoteError) -> Self {
        let kind = match &e {
            QuoteError::Network(_) => ErrorKind::Network,
            QuoteError::NoRoute | QuoteError::Malformed(_) => ErrorKind::Validation,
        };
        EngineError::new(kind, "quote_provider", e.to_string())
    }
}

impl From<RateError> for EngineError {
    fn from(e: RateError) -> Self {
        EngineError::new(ErrorKind::ExternalApi, "rate_converter", e.to_string())
    }
}

impl From<ExecutionError> for EngineError {
    fn from(e: ExecutionError) -> Self {
        EngineError::new(ErrorKind::Execution, "executor", e.to_string())
    }
}

impl From<StateStoreError> for EngineError {
    fn from(e: StateStoreError) -> Self {
        EngineError::new(ErrorKind::System, "state_store", e.to_string())
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::new(ErrorKind::System, "config", e.to_string())
    }
}
