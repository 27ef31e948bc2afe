use crate::domain::network::{NetworkId, NetworkMetrics};
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMethod {
    /// Configured rules and live metrics only.
    Heuristic,
    /// The AI advisor answered, whether or not it changed the outcome.
    Hybrid,
}

impl fmt::Display for DecisionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionMethod::Heuristic => f.write_str("heuristic"),
            DecisionMethod::Hybrid => f.write_str("hybrid"),
        }
    }
}

impl FromStr for DecisionMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(DecisionMethod::Heuristic),
            "hybrid" => Ok(DecisionMethod::Hybrid),
            other => Err(ParseError::UnknownVariant {
                kind: "decision method",
                value: other.to_string(),
            }),
        }
    }
}

/// Why a candidate failed the hard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    ConfirmationTooSlow { observed: Decimal, limit: Decimal },
    FeeTooHigh { fee_percent: Decimal, limit: Decimal },
    GasTooHigh { gas_price_gwei: Decimal, limit: Decimal },
}

/// Metrics of one candidate and the verdict of the hard filters on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub network: NetworkId,
    pub metrics: NetworkMetrics,
    pub fee_percent: Decimal,
    pub rejections: Vec<Rejection>,
}

impl CandidateEvaluation {
    pub fn passed(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// A configured network that never reached scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub network: NetworkId,
    pub reason: String,
}

/// What the engine saw when it decided. Never recomputed after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rationale {
    /// Candidates with metrics, in ranking order for survivors followed by the rejected ones.
    pub evaluated: Vec<CandidateEvaluation>,
    pub unavailable: Vec<Exclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_note: Option<String>,
}

impl Rationale {
    pub fn metrics_for(&self, network: NetworkId) -> Option<&NetworkMetrics> {
        self.evaluated
            .iter()
            .find(|evaluation| evaluation.network == network)
            .map(|evaluation| &evaluation.metrics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub request_id: Uuid,
    pub merchant_id: String,
    pub selected_network: NetworkId,
    pub decision_method: DecisionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<NetworkId>,
    pub rationale: Rationale,
    /// Reached through the fallback network rather than filtering and ranking.
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    /// Id the transaction log assigned to the record of this decision.
    pub transaction_id: String,
}
