//! Structured lifecycle events for one advisory request.
//!
//! Every event carries `event = "<name>"` so log pipelines can filter on it.
//! [`AdvisorySpan`] tags everything emitted while handling a request with its
//! `request_id`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::AgentError;
use crate::conflict::ConflictResolution;
use crate::domain::AgentId;
use crate::validator::{ClampEvent, Rejection};

/// Request-scoped span.
///
/// The span is not entered here; futures are instrumented with
/// [`AdvisorySpan::span`] so the guard never crosses an await point.
#[derive(Debug, Clone)]
pub struct AdvisorySpan {
    request_id: Uuid,
    span: tracing::Span,
}

impl AdvisorySpan {
    pub fn new(farmer_id: &str) -> Self {
        Self::with_id(Uuid::new_v4(), farmer_id)
    }

    pub fn with_id(request_id: Uuid, farmer_id: &str) -> Self {
        let span = tracing::info_span!(
            "advisory.request",
            request_id = %request_id,
            farmer_id = %farmer_id,
        );
        Self { request_id, span }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

pub fn emit_advisory_started(farmer_id: &str, crop: &str, agents: usize, deadline_ms: u64) {
    info!(
        event = "advisory.started",
        farmer_id = %farmer_id,
        crop = %crop,
        agents = agents,
        deadline_ms = deadline_ms,
    );
}

pub fn emit_agent_completed(agent: AgentId, elapsed_ms: u64) {
    info!(event = "agent.completed", agent = %agent, elapsed_ms = elapsed_ms);
}

pub fn emit_agent_failed(agent: AgentId, error: &AgentError) {
    warn!(event = "agent.failed", agent = %agent, error = %error);
}

pub fn emit_agent_timed_out(agent: AgentId, deadline_ms: u64) {
    warn!(event = "agent.timed_out", agent = %agent, deadline_ms = deadline_ms);
}

pub fn emit_recommendation_rejected(rejection: &Rejection) {
    warn!(
        event = "recommendation.rejected",
        agent = %rejection.agent,
        reason = %rejection.reason,
    );
}

pub fn emit_recommendation_clamped(clamp: &ClampEvent) {
    info!(
        event = "recommendation.clamped",
        agent = %clamp.agent,
        field = clamp.field,
        received = %clamp.received,
        applied = %clamp.applied,
    );
}

pub fn emit_conflict_resolved(resolution: &ConflictResolution) {
    info!(
        event = "conflict.resolved",
        rule_id = %resolution.rule_id,
        action = resolution.action,
        winner = ?resolution.winner,
        removed_tasks = resolution.removed_tasks.len(),
    );
}

pub fn emit_advisory_finished(
    recommendations: usize,
    plan_len: usize,
    confidence: f64,
    duration_ms: u64,
) {
    info!(
        event = "advisory.finished",
        recommendations = recommendations,
        plan_len = plan_len,
        confidence = confidence,
        duration_ms = duration_ms,
    );
}

pub fn emit_advisory_failed(error: &dyn std::fmt::Display, duration_ms: u64) {
    warn!(event = "advisory.failed", error = %error, duration_ms = duration_ms);
}
