//! `POST /api/advisory` response body.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::agent_id::AgentId;
use super::recommendation::{Recommendation, RiskLevel};

/// Rolled-up risk across surviving recommendations.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RiskAssessment {
    pub overall_risk_level: RiskLevel,
    /// Effective risk per agent (absent declarations reported as `low`).
    pub agent_risks: BTreeMap<AgentId, RiskLevel>,
    /// Agents at `high` or `critical`, in lexical agent order.
    pub high_risk_agents: Vec<AgentId>,
    /// Agents at `medium`, in lexical agent order.
    pub medium_risk_agents: Vec<AgentId>,
}

/// The unified advisory returned to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvisoryResponse {
    pub farmer_id: String,
    pub crop: String,
    pub horizon_days: i64,
    pub generated_at: DateTime<Utc>,
    /// At most one entry per agent, in plan order.
    pub recommendations: Vec<Recommendation>,
    pub unified_plan: Vec<String>,
    pub confidence_overall: f64,
    pub risk_assessment: RiskAssessment,
    pub response_time_ms: u64,
}
