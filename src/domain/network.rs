use crate::error::ParseError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A settlement network the engine knows how to route to.
///
/// The set is closed: identifiers coming from configuration files, CLI flags or
/// CSV logs are parsed into this type and anything unknown is rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NetworkId {
    Arbitrum,
    Ethereum,
    Optimism,
    Polygon,
}

impl NetworkId {
    pub const ALL: [NetworkId; 4] = [
        NetworkId::Arbitrum,
        NetworkId::Ethereum,
        NetworkId::Optimism,
        NetworkId::Polygon,
    ];

    /// Stable identifier used as the configuration key.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Arbitrum => "arbitrum",
            NetworkId::Ethereum => "ethereum",
            NetworkId::Optimism => "optimism",
            NetworkId::Polygon => "polygon",
        }
    }

    /// Human readable name, as shown in transaction logs.
    pub fn label(&self) -> &'static str {
        match self {
            NetworkId::Arbitrum => "Arbitrum",
            NetworkId::Ethereum => "Ethereum Mainnet",
            NetworkId::Optimism => "Optimism",
            NetworkId::Polygon => "Polygon",
        }
    }

    /// Symbol of the token fees are paid in.
    pub fn fee_symbol(&self) -> &'static str {
        match self {
            NetworkId::Polygon => "MATIC",
            NetworkId::Arbitrum | NetworkId::Ethereum | NetworkId::Optimism => "ETH",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the identifier ("ethereum"), the label ("Ethereum Mainnet") or the
/// short name ("Ethereum"), case-insensitively.
impl FromStr for NetworkId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        NetworkId::ALL
            .into_iter()
            .find(|id| {
                needle.eq_ignore_ascii_case(id.as_str()) || needle.eq_ignore_ascii_case(id.label())
            })
            .ok_or_else(|| ParseError::UnknownNetwork(needle.to_string()))
    }
}

impl TryFrom<String> for NetworkId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.as_str().to_string()
    }
}

// Lexical order of the identifier, used as the final ranking tie-break.
impl Ord for NetworkId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for NetworkId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CongestionLevel {
    #[serde(alias = "Low")]
    Low,
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Medium => "Medium",
            CongestionLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Operating conditions of one network, as observed at fetch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub gas_price_gwei: Decimal,
    pub confirmation_time_seconds: Decimal,
    pub congestion: CongestionLevel,
}

impl NetworkMetrics {
    pub fn new(
        gas_price_gwei: Decimal,
        confirmation_time_seconds: Decimal,
        congestion: CongestionLevel,
    ) -> Self {
        Self {
            gas_price_gwei,
            confirmation_time_seconds,
            congestion,
        }
    }
}
