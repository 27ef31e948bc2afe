//! Filtering and ordering of transaction log snapshots.
//!
//! A [`LogQuery`] is a plain value; evaluating it against a fresh snapshot on
//! every call is what makes query results restartable.

use super::decision::DecisionMethod;
use super::network::NetworkId;
use super::transaction::TransactionRecord;
use crate::error::ParseError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetworkFilter {
    #[default]
    All,
    Only(NetworkId),
}

impl NetworkFilter {
    pub fn matches(&self, network: NetworkId) -> bool {
        match self {
            NetworkFilter::All => true,
            NetworkFilter::Only(wanted) => *wanted == network,
        }
    }
}

impl FromStr for NetworkFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(NetworkFilter::All)
        } else {
            s.parse().map(NetworkFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Timestamp,
    Fee,
    ConfirmationTime,
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "timestamp" => Ok(SortKey::Timestamp),
            "fee" => Ok(SortKey::Fee),
            "confirmationtime" => Ok(SortKey::ConfirmationTime),
            _ => Err(ParseError::UnknownVariant {
                kind: "sort key",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(ParseError::UnknownVariant {
                kind: "sort direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Search, filter and sort parameters for the transaction log.
///
/// Defaults to every record, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    pub search: String,
    pub network: NetworkFilter,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn network(mut self, filter: NetworkFilter) -> Self {
        self.network = filter;
        self
    }

    pub fn sort_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.direction = direction;
        self
    }

    /// Case-insensitive substring match on id, network and merchant id, combined
    /// with the network filter. An empty search term matches everything.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || record.id.to_lowercase().contains(&term)
            || record.network.label().to_lowercase().contains(&term)
            || record.network.as_str().contains(&term)
            || record.merchant_id.to_lowercase().contains(&term);

        matches_search && self.network.matches(record.network)
    }

    pub fn evaluate(&self, records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        let mut selected: Vec<TransactionRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();

        selected.sort_by(|a, b| {
            let primary = match self.sort_key {
                SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
                SortKey::Fee => a.fee.value.cmp(&b.fee.value),
                SortKey::ConfirmationTime => {
                    a.confirmation_time.value.cmp(&b.confirmation_time.value)
                }
            };
            let primary = match self.direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            // ties: newest first, whatever the direction
            primary.then_with(|| b.timestamp.cmp(&a.timestamp))
        });
        selected
    }
}

/// Distinct networks present in `records`, for building filter pickers.
pub fn distinct_networks(records: &[TransactionRecord]) -> Vec<NetworkId> {
    records
        .iter()
        .map(|record| record.network)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Share of the log carried by one network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkUsage {
    pub network: NetworkId,
    pub count: usize,
    pub share_percent: Decimal,
    pub average_confirmation_seconds: Decimal,
}

/// Totals and averages over a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub total: usize,
    /// Mean fee per fee unit; fees in different tokens are never mixed.
    pub average_fee: BTreeMap<String, Decimal>,
    pub average_confirmation_seconds: Option<Decimal>,
    /// Networks present, in identifier order.
    pub networks: Vec<NetworkUsage>,
    pub heuristic: usize,
    pub hybrid: usize,
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    (sum / Decimal::from(count)).round_dp(8).normalize()
}

pub fn summarize(records: &[TransactionRecord]) -> LogSummary {
    if records.is_empty() {
        return LogSummary::default();
    }
    let total = records.len();

    let mut fees: BTreeMap<String, (Decimal, usize)> = BTreeMap::new();
    let mut per_network: BTreeMap<NetworkId, (Decimal, usize)> = BTreeMap::new();
    let mut confirmation_sum = Decimal::ZERO;
    let mut heuristic = 0;
    for record in records {
        let fee = fees.entry(record.fee.unit.clone()).or_default();
        fee.0 += record.fee.value;
        fee.1 += 1;

        let network = per_network.entry(record.network).or_default();
        network.0 += record.confirmation_time.value;
        network.1 += 1;

        confirmation_sum += record.confirmation_time.value;
        if record.decision_method == DecisionMethod::Heuristic {
            heuristic += 1;
        }
    }

    LogSummary {
        total,
        average_fee: fees
            .into_iter()
            .map(|(unit, (sum, count))| (unit, mean(sum, count)))
            .collect(),
        average_confirmation_seconds: Some(mean(confirmation_sum, total)),
        networks: per_network
            .into_iter()
            .map(|(network, (seconds, count))| NetworkUsage {
                network,
                count,
                share_percent: mean(Decimal::from(count * 100), total),
                average_confirmation_seconds: mean(seconds, count),
            })
            .collect(),
        heuristic,
        hybrid: total - heuristic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::DecisionMethod;
    use crate::domain::transaction::{Measure, TransactionStatus};

    fn record(id: &str, network: NetworkId, fee: &str, secs: &str, ts: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            merchant_id: "merchant123".to_string(),
            network,
            fee: fee.parse().unwrap(),
            confirmation_time: secs.parse::<Measure>().unwrap(),
            decision_method: DecisionMethod::Heuristic,
            amount: "1 ETH".parse().unwrap(),
            status: TransactionStatus::Completed,
            timestamp: ts.parse().unwrap(),
        }
    }

    #[test]
    fn test_filter_parses_all_sentinel_and_labels() {
        assert_eq!("all".parse::<NetworkFilter>().unwrap(), NetworkFilter::All);
        assert_eq!(
            "Polygon".parse::<NetworkFilter>().unwrap(),
            NetworkFilter::Only(NetworkId::Polygon)
        );
        assert!("Dogecoin".parse::<NetworkFilter>().is_err());
    }

    #[test]
    fn test_sort_key_accepts_spellings() {
        assert_eq!(
            "confirmationTime".parse::<SortKey>().unwrap(),
            SortKey::ConfirmationTime
        );
        assert_eq!(
            "confirmation-time".parse::<SortKey>().unwrap(),
            SortKey::ConfirmationTime
        );
        assert!("amount".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_ties_fall_back_to_newest_first() {
        let records = vec![
            record("tx1", NetworkId::Optimism, "0.001 ETH", "3 seconds", "2023-11-10T10:00:00Z"),
            record("tx2", NetworkId::Arbitrum, "0.001 ETH", "3 seconds", "2023-11-10T11:00:00Z"),
        ];

        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let ordered = LogQuery::new()
                .sort_by(SortKey::Fee, direction)
                .evaluate(records.clone());
            let ids: Vec<_> = ordered.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(ids, vec!["tx2", "tx1"]);
        }
    }

    #[test]
    fn test_search_matches_network_identifier_and_merchant() {
        let records = vec![
            record("tx1", NetworkId::Ethereum, "0.0045 ETH", "15 seconds", "2023-11-10T12:30:45Z"),
            record("tx2", NetworkId::Polygon, "0.5 MATIC", "8 seconds", "2023-11-10T12:15:30Z"),
        ];

        let by_label = LogQuery::new().search("mainnet").evaluate(records.clone());
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].id, "tx1");

        let by_merchant = LogQuery::new().search("MERCHANT").evaluate(records);
        assert_eq!(by_merchant.len(), 2);
    }

    #[test]
    fn test_distinct_networks_are_sorted_and_unique() {
        let records = vec![
            record("tx1", NetworkId::Polygon, "0.5 MATIC", "8 seconds", "2023-11-10T12:15:30Z"),
            record("tx2", NetworkId::Ethereum, "0.004 ETH", "15 seconds", "2023-11-10T12:30:45Z"),
            record("tx3", NetworkId::Polygon, "0.4 MATIC", "7 seconds", "2023-11-10T12:45:00Z"),
        ];
        assert_eq!(
            distinct_networks(&records),
            vec![NetworkId::Ethereum, NetworkId::Polygon]
        );
    }

    #[test]
    fn test_summary_keeps_fee_units_apart() {
        let records = vec![
            record("tx1", NetworkId::Polygon, "0.5 MATIC", "8 seconds", "2023-11-10T10:00:00Z"),
            record("tx2", NetworkId::Polygon, "1.5 MATIC", "4 seconds", "2023-11-10T11:00:00Z"),
            record("tx3", NetworkId::Arbitrum, "0.002 ETH", "6 seconds", "2023-11-10T12:00:00Z"),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.average_fee["MATIC"], Decimal::ONE);
        assert_eq!(summary.average_fee["ETH"].to_string(), "0.002");
        assert_eq!(summary.average_confirmation_seconds, Some(Decimal::from(6)));
        assert_eq!(summary.networks[0].network, NetworkId::Arbitrum);
        assert_eq!(summary.networks[1].average_confirmation_seconds, Decimal::from(6));
        assert_eq!(summary.heuristic, 3);
        assert_eq!(summary.hybrid, 0);
    }

    #[test]
    fn test_summary_of_nothing_is_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.average_fee.is_empty());
        assert_eq!(summary.average_confirmation_seconds, None);
    }
}
