use crate::domain::decision::DecisionMethod;
use crate::domain::network::NetworkId;
use crate::error::ParseError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A magnitude with a free-form unit suffix, e.g. `0.0045 ETH` or `15 seconds`.
///
/// Ordering and comparisons in the log only ever look at `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Measure {
    pub value: Decimal,
    pub unit: String,
}

impl Measure {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn seconds(value: Decimal) -> Self {
        Self::new(value, "seconds")
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

impl FromStr for Measure {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let value = parts
            .next()
            .and_then(|number| Decimal::from_str(number).ok())
            .ok_or_else(|| ParseError::InvalidMeasure(s.to_string()))?;
        let unit = parts.collect::<Vec<_>>().join(" ");
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for Measure {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Measure> for String {
    fn from(measure: Measure) -> Self {
        measure.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Status only moves forward, from `Pending` to one of the terminal states.
    pub fn can_advance_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (
                TransactionStatus::Pending,
                TransactionStatus::Completed | TransactionStatus::Failed
            )
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A transaction before the log has given it an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub merchant_id: String,
    pub network: NetworkId,
    pub fee: Measure,
    pub confirmation_time: Measure,
    pub decision_method: DecisionMethod,
    pub amount: Measure,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub merchant_id: String,
    #[serde(serialize_with = "serialize_network_label")]
    pub network: NetworkId,
    pub fee: Measure,
    pub confirmation_time: Measure,
    pub decision_method: DecisionMethod,
    pub amount: Measure,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

fn serialize_network_label<S>(network: &NetworkId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(network.label())
}

impl TransactionRecord {
    pub fn from_new(id: String, timestamp: DateTime<Utc>, tx: NewTransaction) -> Self {
        Self {
            id,
            merchant_id: tx.merchant_id,
            network: tx.network,
            fee: tx.fee,
            confirmation_time: tx.confirmation_time,
            decision_method: tx.decision_method,
            amount: tx.amount,
            status: tx.status,
            timestamp,
        }
    }
}
