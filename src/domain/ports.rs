use super::config::{MerchantConfig, RoutingPreferences};
use super::network::{NetworkId, NetworkMetrics};
use super::query::{LogQuery, LogSummary, distinct_networks, summarize};
use super::transaction::{NewTransaction, TransactionRecord, TransactionStatus};
use crate::error::{AiUnavailable, ConfigError, LogError, MetricsUnavailable};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, merchant_id: &str) -> Result<MerchantConfig, ConfigError>;
}

#[async_trait]
pub trait NetworkMetricsProvider: Send + Sync {
    async fn fetch(
        &self,
        network: NetworkId,
        timeout: Duration,
    ) -> Result<NetworkMetrics, MetricsUnavailable>;
}

/// Secondary recommendation source. Advisory only; the engine decides whether
/// to follow it.
#[async_trait]
pub trait AiAdvisor: Send + Sync {
    async fn recommend(
        &self,
        candidates: &[NetworkId],
        metrics: &HashMap<NetworkId, NetworkMetrics>,
        preferences: &RoutingPreferences,
        timeout: Duration,
    ) -> Result<NetworkId, AiUnavailable>;
}

#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Assigns the id and timestamp and stores the record.
    async fn append(&self, tx: NewTransaction) -> Result<TransactionRecord, LogError>;
    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>, LogError>;
    async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<TransactionRecord, LogError>;
    /// Point-in-time copy of every record, in append order.
    async fn snapshot(&self) -> Result<Vec<TransactionRecord>, LogError>;

    /// Re-evaluated against the current contents on every call.
    async fn query(&self, query: &LogQuery) -> Result<Vec<TransactionRecord>, LogError> {
        Ok(query.evaluate(self.snapshot().await?))
    }

    async fn networks(&self) -> Result<Vec<NetworkId>, LogError> {
        Ok(distinct_networks(&self.snapshot().await?))
    }

    async fn summary(&self) -> Result<LogSummary, LogError> {
        Ok(summarize(&self.snapshot().await?))
    }
}

pub type ConfigStoreRef = Arc<dyn ConfigStore>;
pub type MetricsProviderRef = Arc<dyn NetworkMetricsProvider>;
pub type AiAdvisorRef = Arc<dyn AiAdvisor>;
pub type TransactionLogRef = Arc<dyn TransactionLog>;
