use crate::domain::config::MerchantConfig;
use crate::domain::network::{CongestionLevel, NetworkId, NetworkMetrics};
use crate::error::LoadError;
use crate::infrastructure::in_memory::InMemoryConfigStore;
use crate::infrastructure::metrics::StaticMetricsProvider;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

/// Loads a document mapping merchant ids to their routing configs.
///
/// ```json
/// { "merchant123": { "fallback_network": "ethereum", "max_gas_price_gwei": 100,
///   "ai_enabled": true, "networks": [{ "network": "polygon", "priority": 1 }] } }
/// ```
///
/// Every config is validated; the first invalid one fails the whole load.
pub fn load_configs<R: Read>(source: R) -> Result<InMemoryConfigStore, LoadError> {
    let configs: BTreeMap<String, MerchantConfig> = serde_json::from_reader(source)?;
    Ok(InMemoryConfigStore::from_configs(configs)?)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEntry {
    Down {
        unavailable: String,
    },
    Published {
        gas_price_gwei: Decimal,
        confirmation_time_seconds: Decimal,
        congestion: CongestionLevel,
        #[serde(default)]
        delay_ms: u64,
    },
}

/// Loads a metrics snapshot keyed by network.
///
/// An entry either carries the three metrics (plus an optional `delay_ms`
/// response latency) or an `unavailable` reason. Networks left out of the
/// document are unavailable too.
pub fn load_metrics<R: Read>(source: R) -> Result<StaticMetricsProvider, LoadError> {
    let snapshot: BTreeMap<NetworkId, SnapshotEntry> = serde_json::from_reader(source)?;
    let provider = snapshot
        .into_iter()
        .fold(StaticMetricsProvider::new(), |provider, (network, entry)| {
            match entry {
                SnapshotEntry::Down { unavailable } => provider.with_failure(network, unavailable),
                SnapshotEntry::Published {
                    gas_price_gwei,
                    confirmation_time_seconds,
                    congestion,
                    delay_ms,
                } => provider.with_latency(
                    network,
                    NetworkMetrics::new(gas_price_gwei, confirmation_time_seconds, congestion),
                    Duration::from_millis(delay_ms),
                ),
            }
        });
    Ok(provider)
}
