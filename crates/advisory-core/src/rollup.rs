//! Risk and confidence rollup over surviving recommendations.

use std::collections::BTreeMap;

use crate::domain::{Recommendation, RiskAssessment, RiskLevel};

/// Roll declared risk levels up into a [`RiskAssessment`].
///
/// The overall level is the maximum severity (absent = `low`). An empty input
/// rolls up to `low` with no flagged agents.
pub fn rollup_risk(recommendations: &[Recommendation]) -> RiskAssessment {
    let agent_risks: BTreeMap<_, _> = recommendations
        .iter()
        .map(|r| (r.agent, r.effective_risk()))
        .collect();

    let overall_risk_level = agent_risks.values().copied().max().unwrap_or_default();

    let high_risk_agents = agent_risks
        .iter()
        .filter(|(_, risk)| **risk >= RiskLevel::High)
        .map(|(agent, _)| *agent)
        .collect();
    let medium_risk_agents = agent_risks
        .iter()
        .filter(|(_, risk)| **risk == RiskLevel::Medium)
        .map(|(agent, _)| *agent)
        .collect();

    RiskAssessment {
        overall_risk_level,
        agent_risks,
        high_risk_agents,
        medium_risk_agents,
    }
}

/// Priority-weighted mean confidence.
///
/// `sum(confidence * priority) / sum(priority)`, falling back to the plain
/// mean when every priority is zero. Returns `None` for an empty input.
pub fn rollup_confidence(recommendations: &[Recommendation]) -> Option<f64> {
    if recommendations.is_empty() {
        return None;
    }

    let weight: f64 = recommendations.iter().map(|r| f64::from(r.priority)).sum();
    let overall = if weight > 0.0 {
        recommendations
            .iter()
            .map(|r| r.confidence_score * f64::from(r.priority))
            .sum::<f64>()
            / weight
    } else {
        recommendations.iter().map(|r| r.confidence_score).sum::<f64>()
            / recommendations.len() as f64
    };

    Some(overall.clamp(0.0, 1.0))
}
