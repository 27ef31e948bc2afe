use super::combiner::{AiOutcome, combine};
use super::scorer::{HeuristicScorer, ScoringParams};
use crate::domain::config::RoutingPreferences;
use crate::domain::decision::{DecisionMethod, Exclusion, Rationale, RoutingDecision};
use crate::domain::network::{NetworkId, NetworkMetrics};
use crate::domain::ports::{AiAdvisorRef, ConfigStoreRef, MetricsProviderRef, TransactionLogRef};
use crate::domain::session::Session;
use crate::domain::transaction::{Measure, NewTransaction, TransactionStatus};
use crate::error::{MetricsUnavailable, Result, RoutingError};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Timeouts and scoring parameters shared by every request an engine serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Bound on each network's metrics fetch.
    pub metrics_timeout: Duration,
    /// Bound on the AI advisor call.
    pub ai_timeout: Duration,
    /// Bound on everything before the decision is recorded.
    pub deadline: Duration,
    pub scoring: ScoringParams,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            metrics_timeout: Duration::from_secs(2),
            ai_timeout: Duration::from_secs(3),
            deadline: Duration::from_secs(5),
            scoring: ScoringParams::default(),
        }
    }
}

/// Stages a routing request moves through. Used for tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPhase {
    CollectingInputs,
    Filtering,
    Scoring,
    ConsultingAi,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for RoutingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoutingPhase::CollectingInputs => "collecting_inputs",
            RoutingPhase::Filtering => "filtering",
            RoutingPhase::Scoring => "scoring",
            RoutingPhase::ConsultingAi => "consulting_ai",
            RoutingPhase::Finalizing => "finalizing",
            RoutingPhase::Done => "done",
            RoutingPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A decision that has been made but not yet recorded.
struct PendingDecision {
    request_id: Uuid,
    merchant_id: String,
    selected_network: NetworkId,
    decision_method: DecisionMethod,
    ai_recommendation: Option<NetworkId>,
    rationale: Rationale,
    degraded: bool,
    transaction: NewTransaction,
}

/// Selects the network that should carry a payment.
///
/// `RoutingEngine` owns handles to its collaborators and holds no per-request
/// state, so one instance can serve any number of concurrent `decide` calls.
/// A decision is either fully produced and recorded in the transaction log, or
/// not produced at all: dropping the `decide` future cancels in-flight calls
/// and nothing is written.
pub struct RoutingEngine {
    config_store: ConfigStoreRef,
    metrics: MetricsProviderRef,
    advisor: Option<AiAdvisorRef>,
    log: TransactionLogRef,
    settings: EngineSettings,
}

impl RoutingEngine {
    /// Creates a new `RoutingEngine` without an AI advisor.
    ///
    /// # Arguments
    ///
    /// * `config_store` - Source of merchant routing configs.
    /// * `metrics` - Source of live network metrics.
    /// * `log` - Where completed decisions are recorded.
    /// * `settings` - Timeouts and scoring parameters.
    pub fn new(
        config_store: ConfigStoreRef,
        metrics: MetricsProviderRef,
        log: TransactionLogRef,
        settings: EngineSettings,
    ) -> Self {
        Self {
            config_store,
            metrics,
            advisor: None,
            log,
            settings,
        }
    }

    pub fn with_advisor(mut self, advisor: AiAdvisorRef) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn log(&self) -> &TransactionLogRef {
        &self.log
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Opens a fresh session for `merchant_id` and routes with it.
    pub async fn decide_for(
        &self,
        merchant_id: &str,
        preferences: &RoutingPreferences,
    ) -> Result<RoutingDecision> {
        self.decide(&Session::new(merchant_id), preferences).await
    }

    /// Routes one payment and records the decision.
    ///
    /// Fails only when the merchant config is missing or invalid, the
    /// preferences are invalid, the deadline elapses before the decision is
    /// made, or the decision cannot be recorded.
    pub async fn decide(
        &self,
        session: &Session,
        preferences: &RoutingPreferences,
    ) -> Result<RoutingDecision> {
        let span = info_span!(
            "decide",
            merchant = %session.merchant_id,
            request_id = %session.request_id,
            authenticated = session.is_authenticated()
        );
        self.decide_inner(session, preferences).instrument(span).await
    }

    async fn decide_inner(
        &self,
        session: &Session,
        preferences: &RoutingPreferences,
    ) -> Result<RoutingDecision> {
        let started = Instant::now();
        let deadline = self.settings.deadline;

        let pending = match tokio::time::timeout(deadline, self.plan(session, preferences)).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => {
                warn!(phase = %RoutingPhase::Failed, error = %e, "routing failed");
                return Err(e);
            }
            Err(_) => {
                warn!(phase = %RoutingPhase::Failed, ?deadline, "routing deadline exceeded");
                return Err(RoutingError::Timeout(deadline));
            }
        };

        debug!(phase = %RoutingPhase::Finalizing, "recording decision");
        let record = self
            .log
            .append(pending.transaction)
            .await
            .map_err(|e| {
                error!(phase = %RoutingPhase::Failed, error = %e, "could not record decision");
                RoutingError::LogAppend(e)
            })?;

        let decision = RoutingDecision {
            request_id: pending.request_id,
            merchant_id: pending.merchant_id,
            selected_network: pending.selected_network,
            decision_method: pending.decision_method,
            ai_recommendation: pending.ai_recommendation,
            rationale: pending.rationale,
            degraded: pending.degraded,
            created_at: record.timestamp,
            transaction_id: record.id,
        };

        info!(
            phase = %RoutingPhase::Done,
            selected = %decision.selected_network,
            method = %decision.decision_method,
            degraded = decision.degraded,
            transaction_id = %decision.transaction_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "routing decision recorded"
        );
        Ok(decision)
    }

    /// Everything up to, but not including, writing to the log.
    async fn plan(
        &self,
        session: &Session,
        preferences: &RoutingPreferences,
    ) -> Result<PendingDecision> {
        preferences.validate()?;

        debug!(phase = %RoutingPhase::CollectingInputs, "loading merchant config");
        let config = self.config_store.get(&session.merchant_id).await?;
        config.validate()?;

        let enabled: Vec<NetworkId> = config.enabled_networks().map(|e| e.network).collect();
        let candidates = config.candidates(preferences);
        let ai_eligible = config.ai_enabled && preferences.use_ai_fallback;

        let ((metrics, unavailable), ai_outcome) = tokio::join!(
            self.collect_metrics(&enabled),
            self.consult_advisor(&candidates, preferences, ai_eligible)
        );

        debug!(
            phase = %RoutingPhase::Filtering,
            candidates = candidates.len(),
            with_metrics = metrics.len(),
            "filtering candidates"
        );
        let scorer = HeuristicScorer::new(&self.settings.scoring);
        let scoring = scorer.score(&candidates, &metrics, preferences, &config);
        debug!(phase = %RoutingPhase::Scoring, ranking = ?scoring.ranking, "candidates ranked");

        if scoring.degraded {
            warn!(
                fallback = %scoring.selected,
                "no eligible network; routing to fallback"
            );
        }

        debug!(phase = %RoutingPhase::ConsultingAi, outcome = ?ai_outcome, "advisor joined");
        let combined = combine(&scoring, ai_outcome);
        debug_assert!(
            config.is_enabled(combined.selected) || combined.selected == config.fallback_network
        );

        let selected = combined.selected;
        let (fee, confirmation_time) = match metrics.get(&selected) {
            Some(observed) => (
                self.settings.scoring.estimated_fee(selected, observed),
                Measure::seconds(observed.confirmation_time_seconds),
            ),
            None => (
                Measure::new(Decimal::ZERO, selected.fee_symbol()),
                Measure::seconds(Decimal::ZERO),
            ),
        };

        let transaction = NewTransaction {
            merchant_id: session.merchant_id.clone(),
            network: selected,
            fee,
            confirmation_time,
            decision_method: combined.method,
            amount: Measure::new(preferences.amount, selected.fee_symbol()),
            status: TransactionStatus::Pending,
        };

        Ok(PendingDecision {
            request_id: session.request_id,
            merchant_id: session.merchant_id.clone(),
            selected_network: selected,
            decision_method: combined.method,
            ai_recommendation: combined.ai_recommendation,
            rationale: Rationale {
                evaluated: scoring.evaluations,
                unavailable,
                ai_note: combined.ai_note,
            },
            degraded: scoring.degraded,
            transaction,
        })
    }

    /// Fetches metrics for every network concurrently. A failed or slow
    /// network is reported in the exclusions and otherwise ignored.
    async fn collect_metrics(
        &self,
        networks: &[NetworkId],
    ) -> (HashMap<NetworkId, NetworkMetrics>, Vec<Exclusion>) {
        let timeout = self.settings.metrics_timeout;
        let fetches = networks.iter().map(|network| async move {
            let result = match tokio::time::timeout(timeout, self.metrics.fetch(*network, timeout))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(MetricsUnavailable::new(
                    *network,
                    format!("timed out after {:?}", timeout),
                )),
            };
            (*network, result)
        });

        let mut metrics = HashMap::new();
        let mut unavailable = Vec::new();
        for (network, result) in join_all(fetches).await {
            match result {
                Ok(observed) => {
                    metrics.insert(network, observed);
                }
                Err(e) => {
                    warn!(%network, reason = %e.reason, "excluding network without metrics");
                    unavailable.push(Exclusion {
                        network,
                        reason: e.reason,
                    });
                }
            }
        }
        (metrics, unavailable)
    }

    /// Runs alongside metrics collection, so the advisor sees the candidate
    /// set and preferences but no metrics snapshot.
    async fn consult_advisor(
        &self,
        candidates: &[NetworkId],
        preferences: &RoutingPreferences,
        eligible: bool,
    ) -> AiOutcome {
        let Some(advisor) = self.advisor.as_ref().filter(|_| eligible) else {
            return AiOutcome::NotConsulted;
        };
        if candidates.is_empty() {
            return AiOutcome::Unavailable("no candidates to advise on".to_string());
        }

        let timeout = self.settings.ai_timeout;
        let no_metrics = HashMap::new();
        match tokio::time::timeout(
            timeout,
            advisor.recommend(candidates, &no_metrics, preferences, timeout),
        )
        .await
        {
            Ok(Ok(pick)) => AiOutcome::Recommended(pick),
            Ok(Err(e)) => {
                warn!(reason = %e.0, "AI advisor unavailable");
                AiOutcome::Unavailable(e.0)
            }
            Err(_) => {
                warn!(?timeout, "AI advisor timed out");
                AiOutcome::Unavailable(format!("timed out after {:?}", timeout))
            }
        }
    }
}
