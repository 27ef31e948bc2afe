use crate::domain::config::RoutingPreferences;
use crate::domain::network::{NetworkId, NetworkMetrics};
use crate::domain::ports::{AiAdvisor, MetricsProviderRef};
use crate::error::AiUnavailable;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Recommends the least congested candidate.
///
/// Ties go to the faster confirmation, then the cheaper gas price. When the
/// engine hands over no metrics (it consults the advisor while its own fetches
/// are still in flight) the advisor reads its own feed.
pub struct CongestionAwareAdvisor {
    feed: MetricsProviderRef,
}

impl CongestionAwareAdvisor {
    pub fn new(feed: MetricsProviderRef) -> Self {
        Self { feed }
    }

    async fn observe(
        &self,
        candidates: &[NetworkId],
        timeout: Duration,
    ) -> HashMap<NetworkId, NetworkMetrics> {
        let fetches = candidates.iter().map(|network| async move {
            (*network, self.feed.fetch(*network, timeout).await)
        });
        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(network, result)| result.ok().map(|m| (network, m)))
            .collect()
    }
}

#[async_trait]
impl AiAdvisor for CongestionAwareAdvisor {
    async fn recommend(
        &self,
        candidates: &[NetworkId],
        metrics: &HashMap<NetworkId, NetworkMetrics>,
        preferences: &RoutingPreferences,
        timeout: Duration,
    ) -> Result<NetworkId, AiUnavailable> {
        let observed = if candidates.iter().any(|c| metrics.contains_key(c)) {
            metrics.clone()
        } else {
            self.observe(candidates, timeout).await
        };

        let pick = candidates
            .iter()
            .filter_map(|network| observed.get(network).map(|m| (*network, m)))
            .min_by(|(a_id, a), (b_id, b)| {
                // within the caller's wait bound first
                let a_slow = a.confirmation_time_seconds > preferences.max_confirmation_seconds;
                let b_slow = b.confirmation_time_seconds > preferences.max_confirmation_seconds;
                a_slow
                    .cmp(&b_slow)
                    .then_with(|| a.congestion.cmp(&b.congestion))
                    .then_with(|| a.confirmation_time_seconds.cmp(&b.confirmation_time_seconds))
                    .then_with(|| a.gas_price_gwei.cmp(&b.gas_price_gwei))
                    .then_with(|| a_id.cmp(b_id))
            })
            .map(|(network, _)| network)
            .ok_or_else(|| AiUnavailable("no candidate metrics to advise on".to_string()))?;

        debug!(%pick, "advisor recommendation");
        Ok(pick)
    }
}
