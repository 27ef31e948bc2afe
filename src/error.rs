use crate::domain::network::NetworkId;
use crate::domain::transaction::TransactionStatus;
use std::time::Duration;
use thiserror::Error;

/// Failures that abort a routing request.
///
/// Everything else (a single network's metrics, the AI advisor, an empty
/// candidate set) degrades into a valid decision instead of surfacing here.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid routing preferences: {0}")]
    InvalidPreferences(String),
    #[error("routing deadline of {0:?} exceeded")]
    Timeout(Duration),
    #[error("failed to record routing decision: {0}")]
    LogAppend(#[source] LogError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no routing config for merchant '{0}'")]
    NotFound(String),
    #[error("invalid routing config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("metrics unavailable for {network}: {reason}")]
pub struct MetricsUnavailable {
    pub network: NetworkId,
    pub reason: String,
}

impl MetricsUnavailable {
    pub fn new(network: NetworkId, reason: impl Into<String>) -> Self {
        Self {
            network,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("AI advisor unavailable: {0}")]
pub struct AiUnavailable(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogError {
    #[error("transaction '{0}' not found")]
    NotFound(String),
    #[error("transaction '{id}' cannot move from {from} to {to}")]
    InvalidStatusTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },
    #[error("transaction id '{0}' is already taken")]
    DuplicateId(String),
    #[error("transaction log storage error: {0}")]
    Storage(String),
}

/// Rejections of untrusted input at the crate boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),
    #[error("invalid measure '{0}': expected '<number> <unit>'")]
    InvalidMeasure(String),
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Errors raised while loading or writing the file formats in `interfaces`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = RoutingError> = std::result::Result<T, E>;
