use crate::domain::config::MerchantConfig;
use crate::domain::ports::{ConfigStore, TransactionLog};
use crate::domain::transaction::{NewTransaction, TransactionRecord, TransactionStatus};
use crate::error::{ConfigError, LogError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store of merchant routing configs.
///
/// Configs are validated on the way in, so readers only ever see configs that
/// passed `MerchantConfig::validate`.
#[derive(Default, Clone)]
pub struct InMemoryConfigStore {
    configs: Arc<RwLock<HashMap<String, MerchantConfig>>>,
}

impl InMemoryConfigStore {
    /// Creates a new, empty config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(merchant_id, config)` pairs, rejecting the first invalid config.
    pub fn from_configs<I>(configs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, MerchantConfig)>,
    {
        let mut map = HashMap::new();
        for (merchant_id, config) in configs {
            config
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("merchant '{}': {}", merchant_id, e)))?;
            map.insert(merchant_id, config);
        }
        Ok(Self {
            configs: Arc::new(RwLock::new(map)),
        })
    }

    /// Validates and stores `config`, replacing any previous one.
    pub async fn put(
        &self,
        merchant_id: impl Into<String>,
        config: MerchantConfig,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        let mut configs = self.configs.write().await;
        configs.insert(merchant_id.into(), config);
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, merchant_id: &str) -> Result<MerchantConfig, ConfigError> {
        let configs = self.configs.read().await;
        configs
            .get(merchant_id)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(merchant_id.to_string()))
    }
}

#[derive(Debug, Default)]
struct LogState {
    records: Vec<TransactionRecord>,
    positions: HashMap<String, usize>,
    next_seq: u64,
    last_timestamp: HashMap<String, DateTime<Utc>>,
}

impl LogState {
    fn push(&mut self, record: TransactionRecord) -> Result<(), LogError> {
        if self.positions.contains_key(&record.id) {
            return Err(LogError::DuplicateId(record.id));
        }
        if let Some(seq) = record
            .id
            .strip_prefix("tx")
            .and_then(|n| n.parse::<u64>().ok())
        {
            self.next_seq = self.next_seq.max(seq);
        }
        let last = self
            .last_timestamp
            .entry(record.merchant_id.clone())
            .or_insert(record.timestamp);
        *last = (*last).max(record.timestamp);
        self.positions.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Now, or just after the merchant's latest record if the clock has not moved past it.
    fn next_timestamp(&self, merchant_id: &str) -> DateTime<Utc> {
        let now = Utc::now();
        match self.last_timestamp.get(merchant_id) {
            Some(last) if now <= *last => *last + chrono::Duration::microseconds(1),
            _ => now,
        }
    }
}

/// A thread-safe, append-only in-memory transaction log.
///
/// Appends and status updates take the write lock, so id and timestamp
/// assignment is serialized. Ids are `tx1`, `tx2`, ... in append order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransactionLog {
    state: Arc<RwLock<LogState>>,
    capacity: Option<usize>,
}

impl InMemoryTransactionLog {
    /// Creates a new, empty, unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log with existing records, keeping their ids and timestamps.
    /// New ids continue after the highest `tx<N>` id seen. Fails on the first
    /// repeated id.
    pub fn with_records(
        records: impl IntoIterator<Item = TransactionRecord>,
    ) -> Result<Self, LogError> {
        let mut state = LogState::default();
        for record in records {
            state.push(record)?;
        }
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            capacity: None,
        })
    }

    /// Refuses appends once `capacity` records are stored.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, tx: NewTransaction) -> Result<TransactionRecord, LogError> {
        let mut state = self.state.write().await;
        if let Some(capacity) = self.capacity
            && state.records.len() >= capacity
        {
            return Err(LogError::Storage(format!(
                "log is full ({} records)",
                capacity
            )));
        }

        let seq = state
            .next_seq
            .checked_add(1)
            .ok_or_else(|| LogError::Storage("transaction id space exhausted".to_string()))?;
        let timestamp = state.next_timestamp(&tx.merchant_id);
        let record = TransactionRecord::from_new(format!("tx{}", seq), timestamp, tx);
        state.push(record.clone())?;
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<TransactionRecord>, LogError> {
        let state = self.state.read().await;
        Ok(state
            .positions
            .get(id)
            .map(|&position| state.records[position].clone()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<TransactionRecord, LogError> {
        let mut state = self.state.write().await;
        let position = *state
            .positions
            .get(id)
            .ok_or_else(|| LogError::NotFound(id.to_string()))?;
        let record = &mut state.records[position];
        if !record.status.can_advance_to(status) {
            return Err(LogError::InvalidStatusTransition {
                id: id.to_string(),
                from: record.status,
                to: status,
            });
        }
        record.status = status;
        Ok(record.clone())
    }

    async fn snapshot(&self) -> Result<Vec<TransactionRecord>, LogError> {
        let state = self.state.read().await;
        Ok(state.records.clone())
    }
}
