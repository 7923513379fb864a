//! Recommendation contract validation.
//!
//! Turns each [`RawRecommendation`] returned by an agent into a typed
//! [`Recommendation`], or rejects it. Rejections only remove that agent's
//! contribution; they never fail the request.
//!
//! Checks:
//! 1. `agent` is one of the seven known identifiers (and matches the agent
//!    that was invoked, when known).
//! 2. At least one non-blank task is present.
//! 3. `priority` is clamped to [1, 10] and `confidence_score` to [0, 1];
//!    non-numeric values fall back to 5 and 0 respectively.
//! 4. Unknown or non-string `risk_level` values normalise to `low`.
//! 5. `details` and `cost_estimate` decode against their typed schemas.
//!
//! Every normalisation in 3–5 is recorded as a [`ClampEvent`].

use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    AgentDetails, AgentId, CostEstimate, RawRecommendation, Recommendation, RiskLevel,
    PRIORITY_MAX, PRIORITY_MIN,
};

/// Priority assumed when an agent declares a non-numeric one.
const DEFAULT_PRIORITY: i64 = 5;

/// An out-of-range or malformed field that was bounded instead of trusted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClampEvent {
    pub agent: AgentId,
    pub field: &'static str,
    /// The value as received, rendered for logs.
    pub received: String,
    /// The value that replaced it.
    pub applied: String,
}

/// Why a recommendation was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectionReason {
    #[error("unknown agent identifier: {agent}")]
    UnknownAgent { agent: String },

    #[error("agent {expected} returned a recommendation labelled {actual}")]
    AgentMismatch { expected: AgentId, actual: String },

    #[error("recommendation from {agent} carries no tasks")]
    EmptyTasks { agent: AgentId },

    #[error("duplicate recommendation from {agent}")]
    DuplicateAgent { agent: AgentId },
}

/// A rejected recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// The identifier the recommendation claimed.
    pub agent: String,
    /// The agent that was invoked to produce it, when known.
    pub source: Option<AgentId>,
    pub reason: RejectionReason,
}

/// One accepted recommendation plus the clamps applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub recommendation: Recommendation,
    pub clamps: Vec<ClampEvent>,
}

impl Validated {
    pub fn was_clamped(&self) -> bool {
        !self.clamps.is_empty()
    }
}

/// Validate a single raw recommendation.
pub fn validate_recommendation(raw: RawRecommendation) -> Result<Validated, RejectionReason> {
    let agent: AgentId = raw
        .agent
        .trim()
        .parse()
        .map_err(|agent| RejectionReason::UnknownAgent { agent })?;

    let tasks: Vec<String> = raw
        .tasks
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tasks.is_empty() {
        return Err(RejectionReason::EmptyTasks { agent });
    }

    let mut clamps = Vec::new();
    let mut clamp = |field: &'static str, received: String, applied: String| {
        clamps.push(ClampEvent {
            agent,
            field,
            received,
            applied,
        });
    };

    if tasks.len() != raw.tasks.len() {
        clamp(
            "tasks",
            format!("{} tasks", raw.tasks.len()),
            format!("{} non-blank tasks", tasks.len()),
        );
    } else if tasks.iter().zip(&raw.tasks).any(|(t, r)| t != r) {
        clamp(
            "tasks",
            "untrimmed task text".to_string(),
            "trimmed task text".to_string(),
        );
    }

    let priority = coerce_priority(&raw.priority);
    if raw.priority.as_i64() != Some(priority) {
        clamp("priority", raw.priority.to_string(), priority.to_string());
    }

    let confidence_score = raw
        .confidence_score
        .as_f64()
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0);
    if raw.confidence_score.as_f64() != Some(confidence_score) {
        clamp(
            "confidence_score",
            raw.confidence_score.to_string(),
            confidence_score.to_string(),
        );
    }

    let risk_level = match &raw.risk_level {
        Value::Null => None,
        declared => match declared.as_str().map(str::parse::<RiskLevel>) {
            Some(Ok(level)) => Some(level),
            _ => {
                clamp("risk_level", declared.to_string(), RiskLevel::Low.to_string());
                Some(RiskLevel::Low)
            }
        },
    };

    let details = match AgentDetails::decode(agent, raw.details) {
        Ok(details) => details,
        Err(e) => {
            clamp("details", e.to_string(), "empty schema".to_string());
            AgentDetails::empty(agent)
        }
    };

    let cost_estimate = match raw.cost_estimate {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => match serde_json::from_value::<CostEstimate>(value) {
            Ok(cost) => Some(cost),
            Err(e) => {
                clamp("cost_estimate", e.to_string(), "dropped".to_string());
                None
            }
        },
    };

    Ok(Validated {
        recommendation: Recommendation {
            agent,
            // Bounded to [1, 10] above.
            priority: priority as u8,
            confidence_score,
            summary: raw.summary,
            explanation: raw.explanation,
            data_sources: raw.data_sources,
            tasks,
            risk_level,
            estimated_impact: raw.estimated_impact,
            cost_estimate,
            details,
        },
        clamps,
    })
}

/// Validate a recommendation returned by a known agent, rejecting it when it
/// claims to come from a different agent.
pub fn validate_from(
    expected: AgentId,
    raw: RawRecommendation,
) -> Result<Validated, RejectionReason> {
    if raw.agent.trim() != expected.as_str() {
        if raw.agent.trim().parse::<AgentId>().is_err() {
            return Err(RejectionReason::UnknownAgent { agent: raw.agent });
        }
        return Err(RejectionReason::AgentMismatch {
            expected,
            actual: raw.agent,
        });
    }
    validate_recommendation(raw)
}

/// Result of validating every completed agent result for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    /// At most one per agent.
    pub accepted: Vec<Recommendation>,
    pub clamps: Vec<ClampEvent>,
    pub rejections: Vec<Rejection>,
}

/// Validate a batch of raw recommendations.
///
/// When two recommendations claim the same agent, the one with the higher
/// `(priority, confidence_score)` is kept (the earlier one on a full tie) and
/// the other is rejected as a duplicate.
pub fn validate_batch<I>(raws: I) -> ValidatedBatch
where
    I: IntoIterator<Item = (Option<AgentId>, RawRecommendation)>,
{
    let mut batch = ValidatedBatch::default();
    let mut accepted: Vec<(Option<AgentId>, Validated)> = Vec::new();

    for (expected, raw) in raws {
        let claimed = raw.agent.clone();
        let result = match expected {
            Some(expected) => validate_from(expected, raw),
            None => validate_recommendation(raw),
        };

        let validated = match result {
            Ok(v) => v,
            Err(reason) => {
                batch.rejections.push(Rejection {
                    agent: claimed,
                    source: expected,
                    reason,
                });
                continue;
            }
        };

        let agent = validated.recommendation.agent;
        match accepted
            .iter()
            .position(|(_, v)| v.recommendation.agent == agent)
        {
            None => accepted.push((expected, validated)),
            Some(idx) => {
                let dropped_source =
                    if outranks(&validated.recommendation, &accepted[idx].1.recommendation) {
                        std::mem::replace(&mut accepted[idx], (expected, validated)).0
                    } else {
                        expected
                    };
                batch.rejections.push(Rejection {
                    agent: agent.as_str().to_string(),
                    source: dropped_source,
                    reason: RejectionReason::DuplicateAgent { agent },
                });
            }
        }
    }

    for (_, v) in accepted {
        batch.clamps.extend(v.clamps);
        batch.accepted.push(v.recommendation);
    }
    batch
}

/// Saturate a declared priority into [1, 10]. Fractions round to the
/// nearest integer; non-numbers fall back to the neutral default.
fn coerce_priority(declared: &Value) -> i64 {
    match declared.as_f64() {
        Some(p) => p.round().clamp(PRIORITY_MIN as f64, PRIORITY_MAX as f64) as i64,
        None => DEFAULT_PRIORITY,
    }
}

fn outranks(a: &Recommendation, b: &Recommendation) -> bool {
    (a.priority, a.confidence_score) > (b.priority, b.confidence_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(agent: &str, priority: i64, confidence: f64) -> RawRecommendation {
        RawRecommendation {
            agent: agent.to_string(),
            priority: Value::from(priority),
            confidence_score: Value::from(confidence),
            summary: "summary".to_string(),
            explanation: String::new(),
            data_sources: vec![],
            tasks: vec!["do the thing".to_string()],
            risk_level: Value::Null,
            estimated_impact: None,
            cost_estimate: None,
            details: Value::Null,
        }
    }

    #[test]
    fn test_in_range_recommendation_passes_without_clamps() {
        let v = validate_recommendation(raw("irrigation", 8, 0.9)).unwrap();
        assert_eq!(v.recommendation.agent, AgentId::Irrigation);
        assert_eq!(v.recommendation.priority, 8);
        assert!(!v.was_clamped());
    }

    #[test]
    fn test_confidence_above_one_is_clamped_and_kept() {
        let v = validate_recommendation(raw("pest", 6, 1.4)).unwrap();
        assert_eq!(v.recommendation.confidence_score, 1.0);
        assert_eq!(v.clamps.len(), 1);
        assert_eq!(v.clamps[0].field, "confidence_score");
        assert_eq!(v.clamps[0].received, "1.4");
    }

    #[test]
    fn test_priority_is_clamped_both_ways() {
        let low = validate_recommendation(raw("market", 0, 0.5)).unwrap();
        assert_eq!(low.recommendation.priority, 1);
        let high = validate_recommendation(raw("market", 42, 0.5)).unwrap();
        assert_eq!(high.recommendation.priority, 10);
        assert_eq!(high.clamps[0].field, "priority");
    }

    #[test]
    fn test_nan_confidence_becomes_zero() {
        let v = validate_recommendation(raw("pest", 6, f64::NAN)).unwrap();
        assert_eq!(v.recommendation.confidence_score, 0.0);
        assert!(v.was_clamped());
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let err = validate_recommendation(raw("drone_survey", 5, 0.5)).unwrap_err();
        assert_eq!(
            err,
            RejectionReason::UnknownAgent {
                agent: "drone_survey".to_string()
            }
        );
    }

    #[test]
    fn test_zero_tasks_rejected() {
        let mut r = raw("fertilizer", 7, 0.8);
        r.tasks = vec!["   ".to_string()];
        let err = validate_recommendation(r).unwrap_err();
        assert_eq!(
            err,
            RejectionReason::EmptyTasks {
                agent: AgentId::Fertilizer
            }
        );
    }

    #[test]
    fn test_unknown_risk_level_normalised_to_low() {
        let mut r = raw("weather_risk", 9, 0.8);
        r.risk_level = Value::from("apocalyptic");
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.risk_level, Some(RiskLevel::Low));
        assert_eq!(v.clamps[0].field, "risk_level");
    }

    #[test]
    fn test_numeric_risk_level_normalised_to_low() {
        let mut r = raw("pest", 6, 0.7);
        r.risk_level = serde_json::json!(3);
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.risk_level, Some(RiskLevel::Low));
        assert_eq!(v.clamps[0].field, "risk_level");
        assert_eq!(v.clamps[0].received, "3");
    }

    #[test]
    fn test_float_and_huge_priorities_saturate() {
        let mut r = raw("pest", 6, 0.7);
        r.priority = serde_json::json!(1e3);
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.priority, 10);
        assert_eq!(v.clamps[0].field, "priority");

        let mut r = raw("pest", 6, 0.7);
        r.priority = serde_json::json!(u64::MAX);
        assert_eq!(validate_recommendation(r).unwrap().recommendation.priority, 10);

        let mut r = raw("pest", 6, 0.7);
        r.priority = serde_json::json!(6.6);
        assert_eq!(validate_recommendation(r).unwrap().recommendation.priority, 7);
    }

    #[test]
    fn test_non_numeric_scores_fall_back_with_clamps() {
        let mut r = raw("market", 4, 0.7);
        r.priority = serde_json::json!("urgent");
        r.confidence_score = serde_json::json!(null);
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.priority, 5);
        assert_eq!(v.recommendation.confidence_score, 0.0);
        let fields: Vec<_> = v.clamps.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["priority", "confidence_score"]);
    }

    #[test]
    fn test_wire_payload_with_mistyped_scalars_is_kept() {
        let raw: RawRecommendation = serde_json::from_str(
            r#"{"agent":"pest","priority":1e3,"risk_level":3,"tasks":["Scout field margins"]}"#,
        )
        .unwrap();
        let v = validate_recommendation(raw).unwrap();
        assert_eq!(v.recommendation.priority, 10);
        assert_eq!(v.recommendation.risk_level, Some(RiskLevel::Low));
    }

    #[test]
    fn test_trimmed_task_text_is_recorded() {
        let mut r = raw("pest", 6, 0.7);
        r.tasks = vec!["  Scout field margins ".to_string()];
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.tasks, vec!["Scout field margins".to_string()]);
        assert_eq!(v.clamps.len(), 1);
        assert_eq!(v.clamps[0].field, "tasks");
    }

    #[test]
    fn test_mistyped_details_replaced_with_empty_schema() {
        let mut r = raw("irrigation", 8, 0.9);
        r.details = serde_json::json!({ "low_threshold": "dry" });
        let v = validate_recommendation(r).unwrap();
        assert_eq!(v.recommendation.details, AgentDetails::empty(AgentId::Irrigation));
        assert_eq!(v.clamps[0].field, "details");
    }

    #[test]
    fn test_mismatched_agent_label_rejected() {
        let err = validate_from(AgentId::Pest, raw("market", 4, 0.7)).unwrap_err();
        assert!(matches!(err, RejectionReason::AgentMismatch { .. }));
    }

    #[test]
    fn test_batch_keeps_one_entry_per_agent() {
        let batch = validate_batch(vec![
            (None, raw("pest", 5, 0.7)),
            (None, raw("pest", 6, 0.6)),
            (None, raw("market", 4, 0.7)),
            (None, raw("unknown", 4, 0.7)),
        ]);
        assert_eq!(batch.accepted.len(), 2);
        let pest = batch
            .accepted
            .iter()
            .find(|r| r.agent == AgentId::Pest)
            .unwrap();
        assert_eq!(pest.priority, 6);
        assert_eq!(batch.rejections.len(), 2);
        assert!(batch
            .rejections
            .iter()
            .any(|r| matches!(r.reason, RejectionReason::DuplicateAgent { .. })));
    }
}
