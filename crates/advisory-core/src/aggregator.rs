//! Advisory aggregator.
//!
//! Fans one request out to every registered agent under a shared deadline,
//! then drives validation, conflict resolution, rollup and plan building in
//! that order. Agents that fail, time out or are rejected simply drop out;
//! the request only fails when nothing survives validation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::{Id, JoinSet};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::agents::{AgentError, AgentRegistry};
use crate::conflict::{resolve_conflicts, ConflictResolution, ConflictRuleTable};
use crate::domain::{
    AdvisoryError, AdvisoryRequest, AdvisoryResponse, AgentId, RawRecommendation, Result,
};
use crate::metrics::METRICS;
use crate::obs::{self, AdvisorySpan};
use crate::plan::{build_unified_plan, order_recommendations};
use crate::rollup::{rollup_confidence, rollup_risk};
use crate::validator::{validate_batch, ClampEvent, Rejection};

/// Shared deadline for one fan-out.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(1800);

/// Longest deadline honoured; larger configured values are capped.
pub const MAX_DEADLINE: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub deadline: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// What happened to one agent during a request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    Completed { elapsed_ms: u64 },
    Failed { error: String },
    TimedOut,
    Rejected { reason: String },
}

/// Per-request bookkeeping that does not belong in the response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub request_id: Uuid,
    pub outcomes: BTreeMap<AgentId, AgentOutcome>,
    pub clamps: Vec<ClampEvent>,
    pub rejections: Vec<Rejection>,
    pub resolutions: Vec<ConflictResolution>,
}

impl AggregationReport {
    fn count(&self, pred: impl Fn(&AgentOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| pred(o)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, AgentOutcome::Completed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AgentOutcome::Failed { .. }))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|o| matches!(o, AgentOutcome::TimedOut))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, AgentOutcome::Rejected { .. }))
    }
}

/// A successful advisory plus its report.
#[derive(Debug, Clone)]
pub struct AdvisoryOutcome {
    pub response: AdvisoryResponse,
    pub report: AggregationReport,
}

pub struct Aggregator {
    agents: AgentRegistry,
    rules: Arc<ConflictRuleTable>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(agents: AgentRegistry, rules: ConflictRuleTable, config: AggregatorConfig) -> Self {
        Self {
            agents,
            rules: Arc::new(rules),
            config,
        }
    }

    /// Built-in agents, built-in rule table, default deadline.
    pub fn builtin() -> Self {
        Self::new(
            AgentRegistry::builtin(),
            ConflictRuleTable::standard(),
            AggregatorConfig::default(),
        )
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn rules(&self) -> &ConflictRuleTable {
        &self.rules
    }

    pub fn config(&self) -> AggregatorConfig {
        self.config
    }

    /// Produce an advisory for `request`.
    pub async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisoryOutcome> {
        self.advise_until(request, CancellationToken::new()).await
    }

    /// Like [`advise`](Self::advise), but abandons in-flight agents and
    /// returns [`AdvisoryError::Cancelled`] once `cancel` fires.
    pub async fn advise_until(
        &self,
        request: AdvisoryRequest,
        cancel: CancellationToken,
    ) -> Result<AdvisoryOutcome> {
        let span = AdvisorySpan::new(&request.profile.farmer_id);
        self.advise_in_span(request, cancel, span).await
    }

    /// Run under a caller-supplied span, so the caller can report the same
    /// request id.
    pub async fn advise_in_span(
        &self,
        request: AdvisoryRequest,
        cancel: CancellationToken,
        span: AdvisorySpan,
    ) -> Result<AdvisoryOutcome> {
        let started = Instant::now();
        let request_id = span.request_id();
        let result = self
            .run(request, cancel, request_id, started)
            .instrument(span.span().clone())
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        span.span().in_scope(|| match &result {
            Ok(outcome) => {
                METRICS.inc_served();
                obs::emit_advisory_finished(
                    outcome.response.recommendations.len(),
                    outcome.response.unified_plan.len(),
                    outcome.response.confidence_overall,
                    elapsed_ms,
                );
            }
            Err(e) => {
                METRICS.inc_failed();
                obs::emit_advisory_failed(e, elapsed_ms);
            }
        });
        result
    }

    async fn run(
        &self,
        request: AdvisoryRequest,
        cancel: CancellationToken,
        request_id: Uuid,
        started: Instant,
    ) -> Result<AdvisoryOutcome> {
        request.validate()?;

        let deadline = self.config.deadline.min(MAX_DEADLINE);
        let deadline_ms = deadline.as_millis() as u64;
        obs::emit_advisory_started(
            &request.profile.farmer_id,
            &request.profile.crop,
            self.agents.len(),
            deadline_ms,
        );

        let request = Arc::new(request);
        let mut report = AggregationReport {
            request_id,
            ..Default::default()
        };
        let completed = self
            .fan_out(&request, &cancel, &mut report, started + deadline)
            .await?;

        let batch = validate_batch(completed.into_iter().map(|(id, raw)| (Some(id), raw)));
        for rejection in &batch.rejections {
            obs::emit_recommendation_rejected(rejection);
            if let Some(source) = rejection.source {
                report.outcomes.insert(
                    source,
                    AgentOutcome::Rejected {
                        reason: rejection.reason.to_string(),
                    },
                );
            }
        }
        for clamp in &batch.clamps {
            obs::emit_recommendation_clamped(clamp);
        }
        METRICS.add_rejections(batch.rejections.len() as u64);
        METRICS.add_clamps(batch.clamps.len() as u64);
        report.clamps = batch.clamps;
        report.rejections = batch.rejections;

        if batch.accepted.is_empty() {
            return Err(AdvisoryError::AggregationFailed {
                attempted: self.agents.len(),
                failed: report.failed() + report.timed_out(),
                rejected: report.rejected(),
            });
        }

        let resolved = resolve_conflicts(&self.rules, batch.accepted);
        for resolution in &resolved.applied {
            obs::emit_conflict_resolved(resolution);
        }
        METRICS.add_conflicts(resolved.applied.len() as u64);
        report.resolutions = resolved.applied;

        let mut recommendations = resolved.recommendations;
        let risk_assessment = rollup_risk(&recommendations);
        let confidence_overall = rollup_confidence(&recommendations).unwrap_or_default();
        let unified_plan = build_unified_plan(&recommendations);
        order_recommendations(&mut recommendations);

        let response = AdvisoryResponse {
            farmer_id: request.profile.farmer_id.clone(),
            crop: request.profile.crop.clone(),
            horizon_days: request.horizon_days,
            generated_at: Utc::now(),
            recommendations,
            unified_plan,
            confidence_overall,
            risk_assessment,
            response_time_ms: started.elapsed().as_millis() as u64,
        };

        Ok(AdvisoryOutcome { response, report })
    }

    /// Invoke every agent concurrently and collect what completes before
    /// `deadline`. Stragglers are aborted, never awaited.
    async fn fan_out(
        &self,
        request: &Arc<AdvisoryRequest>,
        cancel: &CancellationToken,
        report: &mut AggregationReport,
        deadline: Instant,
    ) -> Result<Vec<(AgentId, RawRecommendation)>> {
        let mut join_set = JoinSet::new();
        let mut task_agents: HashMap<Id, AgentId> = HashMap::new();
        for agent in self.agents.iter() {
            let id = agent.id();
            let agent = Arc::clone(agent);
            let request = Arc::clone(request);
            let handle = join_set.spawn(
                async move {
                    let started = Instant::now();
                    let result = agent.invoke(&request).await;
                    (result, started.elapsed())
                }
                .in_current_span(),
            );
            task_agents.insert(handle.id(), id);
        }

        let mut completed = Vec::new();
        let mut deadline_hit = false;
        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    join_set.abort_all();
                    debug!("advisory cancelled; abandoning in-flight agents");
                    return Err(AdvisoryError::Cancelled);
                }
                joined = timeout_at(deadline, join_set.join_next_with_id()) => joined,
            };

            let (task, (result, elapsed)) = match joined {
                Err(_) => {
                    deadline_hit = true;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok(finished))) => finished,
                Ok(Some(Err(e))) => {
                    if let Some(&id) = task_agents.get(&e.id()) {
                        let reason = if e.is_panic() {
                            "agent task panicked"
                        } else {
                            "agent task aborted"
                        };
                        record_failure(report, id, &AgentError::internal(id, reason));
                    }
                    continue;
                }
            };
            let Some(&id) = task_agents.get(&task) else {
                continue;
            };

            let elapsed_ms = elapsed.as_millis() as u64;
            match result {
                Ok(raw) => {
                    obs::emit_agent_completed(id, elapsed_ms);
                    report
                        .outcomes
                        .insert(id, AgentOutcome::Completed { elapsed_ms });
                    completed.push((id, raw));
                }
                Err(e) => {
                    record_failure(report, id, &e);
                }
            }
        }
        join_set.abort_all();

        let deadline_ms = self.config.deadline.min(MAX_DEADLINE).as_millis() as u64;
        for id in self.agents.ids() {
            if report.outcomes.contains_key(&id) {
                continue;
            }
            if deadline_hit {
                record_failure(
                    report,
                    id,
                    &AgentError::TimedOut {
                        agent: id,
                        deadline_ms,
                    },
                );
            } else {
                record_failure(report, id, &AgentError::internal(id, "agent task vanished"));
            }
        }

        Ok(completed)
    }
}

fn record_failure(report: &mut AggregationReport, id: AgentId, error: &AgentError) {
    if let AgentError::TimedOut { deadline_ms, .. } = error {
        METRICS.inc_agent_timeouts();
        obs::emit_agent_timed_out(id, *deadline_ms);
        report.outcomes.insert(id, AgentOutcome::TimedOut);
    } else {
        METRICS.inc_agent_failures();
        obs::emit_agent_failed(id, error);
        report.outcomes.insert(
            id,
            AgentOutcome::Failed {
                error: error.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AdvisoryAgent, AgentResult};
    use async_trait::async_trait;

    struct Fixed(RawRecommendation, AgentId);

    #[async_trait]
    impl AdvisoryAgent for Fixed {
        fn id(&self) -> AgentId {
            self.1
        }

        async fn invoke(&self, _request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
            Ok(self.0.clone())
        }
    }

    fn fixed(agent: AgentId, priority: i64, confidence: f64, tasks: &[&str]) -> Arc<Fixed> {
        Arc::new(Fixed(
            RawRecommendation::new(agent, priority, confidence, format!("{} summary", agent))
                .with_tasks(tasks.iter().copied()),
            agent,
        ))
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_fan_out() {
        let aggregator = Aggregator::builtin();
        let mut request = AdvisoryRequest::new("F001", "wheat");
        request.horizon_days = 0;
        let err = aggregator.advise(request).await.unwrap_err();
        assert!(matches!(err, AdvisoryError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_conflict_example_end_to_end() {
        let irrigation = fixed(AgentId::Irrigation, 8, 0.9, &["irrigate 20mm now"]);
        let weather = Arc::new(Fixed(
            RawRecommendation::new(AgentId::WeatherRisk, 9, 0.8, "rain")
                .with_tasks(["withhold irrigation, heavy rain in 6h"])
                .with_risk(crate::domain::RiskLevel::High),
            AgentId::WeatherRisk,
        ));
        let registry = AgentRegistry::empty()
            .with_agent(irrigation)
            .with_agent(weather);
        let aggregator = Aggregator::new(
            registry,
            ConflictRuleTable::standard(),
            AggregatorConfig::default(),
        );

        let outcome = aggregator
            .advise(AdvisoryRequest::new("F001", "wheat"))
            .await
            .unwrap();
        let response = outcome.response;
        assert_eq!(response.recommendations.len(), 2);
        assert_eq!(
            response.unified_plan,
            vec!["withhold irrigation, heavy rain in 6h"]
        );
        assert_eq!(
            response.risk_assessment.overall_risk_level,
            crate::domain::RiskLevel::High
        );
        assert_eq!(
            response.risk_assessment.high_risk_agents,
            vec![AgentId::WeatherRisk]
        );
        assert_eq!(outcome.report.resolutions.len(), 1);
        assert_eq!(outcome.report.resolutions[0].rule_id, "irrigation_vs_rain");
    }

    #[tokio::test]
    async fn test_recommendations_follow_plan_order() {
        let registry = AgentRegistry::empty()
            .with_agent(fixed(AgentId::Market, 5, 0.7, &["sell"]))
            .with_agent(fixed(AgentId::Pest, 9, 0.7, &["scout"]))
            .with_agent(fixed(AgentId::Fertilizer, 7, 0.7, &["feed"]));
        let aggregator = Aggregator::new(
            registry,
            ConflictRuleTable::empty(),
            AggregatorConfig::default(),
        );
        let response = aggregator
            .advise(AdvisoryRequest::new("F001", "wheat"))
            .await
            .unwrap()
            .response;
        assert_eq!(response.unified_plan, vec!["scout", "feed", "sell"]);
        let order: Vec<AgentId> = response.recommendations.iter().map(|r| r.agent).collect();
        assert_eq!(
            order,
            vec![AgentId::Pest, AgentId::Fertilizer, AgentId::Market]
        );
    }

    #[tokio::test]
    async fn test_builtin_aggregator_serves_a_complete_advisory() {
        let mut request = AdvisoryRequest::new("F001", "wheat");
        request.profile.farm_size_hectares = Some(1.5);
        let outcome = Aggregator::builtin().advise(request).await.unwrap();
        assert_eq!(outcome.response.recommendations.len(), 7);
        assert_eq!(outcome.report.completed(), 7);
        assert!((0.0..=1.0).contains(&outcome.response.confidence_overall));
        assert!(!outcome.response.unified_plan.is_empty());
    }
}
