use crate::domain::network::{NetworkId, NetworkMetrics};
use crate::domain::ports::NetworkMetricsProvider;
use crate::error::MetricsUnavailable;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Feed {
    Publish {
        metrics: NetworkMetrics,
        latency: Duration,
    },
    Down(String),
}

/// Serves a fixed snapshot of network metrics.
///
/// Each network can be given a response latency or marked as down, which is
/// how slow and failing upstream feeds are simulated. Networks with no entry
/// are reported as unavailable.
#[derive(Debug, Default)]
pub struct StaticMetricsProvider {
    feeds: HashMap<NetworkId, Feed>,
    calls: AtomicUsize,
}

impl StaticMetricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, network: NetworkId, metrics: NetworkMetrics) -> Self {
        self.with_latency(network, metrics, Duration::ZERO)
    }

    pub fn with_latency(
        mut self,
        network: NetworkId,
        metrics: NetworkMetrics,
        latency: Duration,
    ) -> Self {
        self.feeds
            .insert(network, Feed::Publish { metrics, latency });
        self
    }

    pub fn with_failure(mut self, network: NetworkId, reason: impl Into<String>) -> Self {
        self.feeds.insert(network, Feed::Down(reason.into()));
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkMetricsProvider for StaticMetricsProvider {
    async fn fetch(
        &self,
        network: NetworkId,
        timeout: Duration,
    ) -> Result<NetworkMetrics, MetricsUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.feeds.get(&network) {
            Some(Feed::Publish { metrics, latency }) => {
                if *latency > timeout {
                    tokio::time::sleep(timeout).await;
                    return Err(MetricsUnavailable::new(
                        network,
                        format!("timed out after {:?}", timeout),
                    ));
                }
                if !latency.is_zero() {
                    tokio::time::sleep(*latency).await;
                }
                Ok(*metrics)
            }
            Some(Feed::Down(reason)) => Err(MetricsUnavailable::new(network, reason.clone())),
            None => Err(MetricsUnavailable::new(network, "no metrics published")),
        }
    }
}
