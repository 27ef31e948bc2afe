#![allow(dead_code)]

use async_trait::async_trait;
use chainroute::domain::config::{MerchantConfig, RoutingPreferences};
use chainroute::domain::network::{CongestionLevel, NetworkId, NetworkMetrics};
use chainroute::domain::ports::{AiAdvisor, TransactionLog};
use chainroute::domain::transaction::{NewTransaction, TransactionRecord, TransactionStatus};
use chainroute::error::{AiUnavailable, LogError};
use chainroute::infrastructure::metrics::StaticMetricsProvider;
use chainroute::interfaces::csv::transaction_reader::TransactionReader;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const MERCHANT: &str = "merchant123";

/// Ethereum, Polygon, Optimism and Arbitrum at priorities 1 to 4.
pub fn merchant_config(ai_enabled: bool) -> MerchantConfig {
    MerchantConfig {
        ai_enabled,
        ..MerchantConfig::default()
    }
}

/// Ethereum is too expensive (6% at 60 gwei), Arbitrum too slow; Polygon and
/// Optimism pass the default preferences.
pub fn busy_network_metrics() -> StaticMetricsProvider {
    StaticMetricsProvider::new()
        .with(
            NetworkId::Ethereum,
            NetworkMetrics::new(dec!(60), dec!(15), CongestionLevel::High),
        )
        .with(
            NetworkId::Polygon,
            NetworkMetrics::new(dec!(40), dec!(8), CongestionLevel::Medium),
        )
        .with(
            NetworkId::Optimism,
            NetworkMetrics::new(dec!(2), dec!(3), CongestionLevel::Low),
        )
        .with(
            NetworkId::Arbitrum,
            NetworkMetrics::new(dec!(1), dec!(45), CongestionLevel::Low),
        )
}

pub fn heuristic_only() -> RoutingPreferences {
    RoutingPreferences {
        use_ai_fallback: false,
        ..RoutingPreferences::default()
    }
}

/// The five records shipped in `tests/fixtures/transactions.csv`.
pub fn sample_records() -> Vec<TransactionRecord> {
    let file = File::open("tests/fixtures/transactions.csv").unwrap();
    TransactionReader::new(file).read_all().unwrap()
}

/// Always recommends the same network and counts how often it was asked.
pub struct FixedAdvisor {
    pick: NetworkId,
    calls: AtomicUsize,
}

impl FixedAdvisor {
    pub fn new(pick: NetworkId) -> Self {
        Self {
            pick,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiAdvisor for FixedAdvisor {
    async fn recommend(
        &self,
        _candidates: &[NetworkId],
        _metrics: &HashMap<NetworkId, NetworkMetrics>,
        _preferences: &RoutingPreferences,
        _timeout: Duration,
    ) -> Result<NetworkId, AiUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pick)
    }
}

pub struct FailingAdvisor;

#[async_trait]
impl AiAdvisor for FailingAdvisor {
    async fn recommend(
        &self,
        _candidates: &[NetworkId],
        _metrics: &HashMap<NetworkId, NetworkMetrics>,
        _preferences: &RoutingPreferences,
        _timeout: Duration,
    ) -> Result<NetworkId, AiUnavailable> {
        Err(AiUnavailable("model endpoint returned 500".to_string()))
    }
}

/// Answers only after `delay`, ignoring the timeout it is given.
pub struct SlowAdvisor {
    pub pick: NetworkId,
    pub delay: Duration,
}

#[async_trait]
impl AiAdvisor for SlowAdvisor {
    async fn recommend(
        &self,
        _candidates: &[NetworkId],
        _metrics: &HashMap<NetworkId, NetworkMetrics>,
        _preferences: &RoutingPreferences,
        _timeout: Duration,
    ) -> Result<NetworkId, AiUnavailable> {
        tokio::time::sleep(self.delay).await;
        Ok(self.pick)
    }
}

/// A log whose storage is gone.
pub struct BrokenLog;

#[async_trait]
impl TransactionLog for BrokenLog {
    async fn append(&self, _tx: NewTransaction) -> Result<TransactionRecord, LogError> {
        Err(LogError::Storage("disk full".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<TransactionRecord>, LogError> {
        Ok(None)
    }

    async fn update_status(
        &self,
        id: &str,
        _status: TransactionStatus,
    ) -> Result<TransactionRecord, LogError> {
        Err(LogError::NotFound(id.to_string()))
    }

    async fn snapshot(&self) -> Result<Vec<TransactionRecord>, LogError> {
        Ok(Vec::new())
    }
}
