use crate::domain::config::{MerchantConfig, RoutingPreferences};
use crate::domain::decision::{CandidateEvaluation, Rejection};
use crate::domain::network::{NetworkId, NetworkMetrics};
use crate::domain::transaction::Measure;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const GWEI: Decimal = dec!(0.000000001);

/// Tunable numbers behind the hard filters and the fee estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Fee, as a percentage of the payment, per gwei of gas price.
    pub fee_percent_per_gwei: BTreeMap<NetworkId, Decimal>,
    pub default_fee_percent_per_gwei: Decimal,
    /// Gas consumed by a plain transfer, used to estimate the recorded fee.
    pub gas_units: BTreeMap<NetworkId, Decimal>,
    pub default_gas_units: Decimal,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            fee_percent_per_gwei: BTreeMap::from([
                (NetworkId::Ethereum, dec!(0.1)),
                (NetworkId::Polygon, dec!(0.001)),
                (NetworkId::Optimism, dec!(0.05)),
                (NetworkId::Arbitrum, dec!(0.05)),
            ]),
            default_fee_percent_per_gwei: dec!(0.1),
            gas_units: BTreeMap::new(),
            default_gas_units: dec!(21000),
        }
    }
}

impl ScoringParams {
    pub fn fee_percent(&self, network: NetworkId, metrics: &NetworkMetrics) -> Decimal {
        let factor = self
            .fee_percent_per_gwei
            .get(&network)
            .copied()
            .unwrap_or(self.default_fee_percent_per_gwei);
        metrics.gas_price_gwei * factor
    }

    /// Estimated fee in the network's fee token.
    pub fn estimated_fee(&self, network: NetworkId, metrics: &NetworkMetrics) -> Measure {
        let units = self
            .gas_units
            .get(&network)
            .copied()
            .unwrap_or(self.default_gas_units);
        let fee = (metrics.gas_price_gwei * units * GWEI).normalize();
        Measure::new(fee, network.fee_symbol())
    }
}

/// Result of ranking one candidate set.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoring {
    /// Survivors of the hard filters, best first.
    pub ranking: Vec<NetworkId>,
    /// Survivors in ranking order, then rejected candidates in input order.
    pub evaluations: Vec<CandidateEvaluation>,
    pub selected: NetworkId,
    /// No candidate survived and `selected` is the fallback network.
    pub degraded: bool,
}

/// Deterministic, side-effect free ranking of candidate networks.
pub struct HeuristicScorer<'a> {
    params: &'a ScoringParams,
}

impl<'a> HeuristicScorer<'a> {
    pub fn new(params: &'a ScoringParams) -> Self {
        Self { params }
    }

    pub fn evaluate(
        &self,
        network: NetworkId,
        metrics: &NetworkMetrics,
        preferences: &RoutingPreferences,
        config: &MerchantConfig,
    ) -> CandidateEvaluation {
        let fee_percent = self.params.fee_percent(network, metrics);
        let mut rejections = Vec::new();

        if metrics.confirmation_time_seconds > preferences.max_confirmation_seconds {
            rejections.push(Rejection::ConfirmationTooSlow {
                observed: metrics.confirmation_time_seconds,
                limit: preferences.max_confirmation_seconds,
            });
        }
        if fee_percent > preferences.max_fee_percent {
            rejections.push(Rejection::FeeTooHigh {
                fee_percent,
                limit: preferences.max_fee_percent,
            });
        }
        if metrics.gas_price_gwei > config.max_gas_price_gwei {
            rejections.push(Rejection::GasTooHigh {
                gas_price_gwei: metrics.gas_price_gwei,
                limit: config.max_gas_price_gwei,
            });
        }

        CandidateEvaluation {
            network,
            metrics: *metrics,
            fee_percent,
            rejections,
        }
    }

    pub fn passes_hard_filters(
        &self,
        network: NetworkId,
        metrics: &NetworkMetrics,
        preferences: &RoutingPreferences,
        config: &MerchantConfig,
    ) -> bool {
        self.evaluate(network, metrics, preferences, config).passed()
    }

    /// Filters and ranks `candidates`. Candidates without metrics are ignored.
    ///
    /// Ranking is by configured priority, then gas price, then confirmation
    /// time, then network identifier. With no survivors the merchant's fallback
    /// network is selected regardless of its own metrics.
    pub fn score(
        &self,
        candidates: &[NetworkId],
        metrics: &HashMap<NetworkId, NetworkMetrics>,
        preferences: &RoutingPreferences,
        config: &MerchantConfig,
    ) -> Scoring {
        let (mut survivors, rejected): (Vec<_>, Vec<_>) = candidates
            .iter()
            .filter_map(|network| {
                metrics
                    .get(network)
                    .map(|m| self.evaluate(*network, m, preferences, config))
            })
            .partition(CandidateEvaluation::passed);

        survivors.sort_by(|a, b| {
            let priority_a = config.priority_of(a.network).unwrap_or(u32::MAX);
            let priority_b = config.priority_of(b.network).unwrap_or(u32::MAX);
            priority_a
                .cmp(&priority_b)
                .then_with(|| a.metrics.gas_price_gwei.cmp(&b.metrics.gas_price_gwei))
                .then_with(|| {
                    a.metrics
                        .confirmation_time_seconds
                        .cmp(&b.metrics.confirmation_time_seconds)
                })
                .then_with(|| a.network.cmp(&b.network))
        });

        let ranking: Vec<NetworkId> = survivors.iter().map(|e| e.network).collect();
        let (selected, degraded) = match ranking.first() {
            Some(top) => (*top, false),
            None => (config.fallback_network, true),
        };

        let mut evaluations = survivors;
        evaluations.extend(rejected);

        Scoring {
            ranking,
            evaluations,
            selected,
            degraded,
        }
    }
}
