//! Agent recommendations: the raw wire form an agent returns and the
//! validated form that flows through conflict resolution and rollup.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::agent_id::AgentId;
use super::details::AgentDetails;

/// Inclusive bounds for `priority` after validation.
pub const PRIORITY_MIN: i64 = 1;
pub const PRIORITY_MAX: i64 = 10;

/// Declared risk severity. Declaration order is the severity order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(s.to_string()),
        }
    }
}

/// Estimated cost of following a recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostEstimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_inr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_unit: Option<String>,
    /// Agent-specific breakdown keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_priority() -> Value {
    Value::from(5)
}

fn default_confidence() -> Value {
    Value::from(0.5)
}

/// A recommendation exactly as an agent returned it.
///
/// Nothing here is trusted: the agent identifier is an open string, and
/// `priority`, `confidence_score`, `risk_level` and `details` are kept as
/// untyped JSON so that a mistyped field is normalised by the validator
/// instead of failing the decode. The validator turns this into a
/// [`Recommendation`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecommendation {
    pub agent: String,
    #[serde(default = "default_priority")]
    pub priority: Value,
    #[serde(default = "default_confidence")]
    pub confidence_score: Value,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    /// `null` when the agent declares no risk.
    #[serde(default)]
    pub risk_level: Value,
    #[serde(default)]
    pub estimated_impact: Option<String>,
    #[serde(default)]
    pub cost_estimate: Option<Value>,
    #[serde(default)]
    pub details: Value,
}

impl RawRecommendation {
    pub fn new(
        agent: AgentId,
        priority: i64,
        confidence_score: f64,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.as_str().to_string(),
            priority: Value::from(priority),
            confidence_score: Value::from(confidence_score),
            summary: summary.into(),
            explanation: String::new(),
            data_sources: Vec::new(),
            tasks: Vec::new(),
            risk_level: Value::Null,
            estimated_impact: None,
            cost_estimate: None,
            details: Value::Null,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tasks = tasks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk_level = Value::from(risk.as_str());
        self
    }

    /// Declared priority, when it is a JSON number.
    pub fn priority_value(&self) -> Option<f64> {
        self.priority.as_f64()
    }

    /// Declared confidence, when it is a JSON number.
    pub fn confidence_value(&self) -> Option<f64> {
        self.confidence_score.as_f64()
    }

    /// Declared risk label, when it is a JSON string.
    pub fn risk_label(&self) -> Option<&str> {
        self.risk_level.as_str()
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.estimated_impact = Some(impact.into());
        self
    }

    pub fn with_cost(mut self, cost: &CostEstimate) -> Self {
        self.cost_estimate = serde_json::to_value(cost).ok();
        self
    }

    pub fn with_details<T: Serialize>(mut self, details: &T) -> Self {
        self.details = serde_json::to_value(details).unwrap_or_default();
        self
    }
}

/// A recommendation that passed validation.
///
/// `priority` is within [1, 10] and `confidence_score` within [0, 1].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub agent: AgentId,
    pub priority: u8,
    pub confidence_score: f64,
    pub summary: String,
    pub explanation: String,
    pub data_sources: Vec<String>,
    pub tasks: Vec<String>,
    pub risk_level: Option<RiskLevel>,
    pub estimated_impact: Option<String>,
    pub cost_estimate: Option<CostEstimate>,
    pub details: AgentDetails,
}

impl Recommendation {
    /// Declared risk, with an absent level treated as `low`.
    pub fn effective_risk(&self) -> RiskLevel {
        self.risk_level.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_total_order() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
    }

    #[test]
    fn test_risk_level_parse_is_case_insensitive() {
        assert_eq!(" HIGH ".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_raw_recommendation_defaults_when_fields_missing() {
        let raw: RawRecommendation =
            serde_json::from_value(serde_json::json!({ "agent": "pest" })).unwrap();
        assert_eq!(raw.priority_value(), Some(5.0));
        assert_eq!(raw.confidence_value(), Some(0.5));
        assert!(raw.risk_level.is_null());
        assert!(raw.tasks.is_empty());
        assert!(raw.details.is_null());
    }

    #[test]
    fn test_mistyped_scalars_still_decode() {
        let raw: RawRecommendation = serde_json::from_str(
            r#"{"agent":"pest","priority":1e3,"confidence_score":"high","risk_level":3,"tasks":["scout"]}"#,
        )
        .unwrap();
        assert_eq!(raw.priority_value(), Some(1000.0));
        assert_eq!(raw.confidence_value(), None);
        assert_eq!(raw.risk_label(), None);
        assert_eq!(raw.risk_level, serde_json::json!(3));
    }

    #[test]
    fn test_cost_estimate_keeps_unknown_keys() {
        let cost: CostEstimate = serde_json::from_value(serde_json::json!({
            "estimated_cost_inr": 1500.0,
            "cost_unit": "INR per hectare",
            "cost_breakdown": { "monitoring": 300.0 }
        }))
        .unwrap();
        assert_eq!(cost.estimated_cost_inr, Some(1500.0));
        assert!(cost.extra.contains_key("cost_breakdown"));
    }

    #[test]
    fn test_builder_stores_risk_as_wire_string() {
        let raw = RawRecommendation::new(AgentId::WeatherRisk, 9, 0.8, "rain")
            .with_tasks(["withhold irrigation"])
            .with_risk(RiskLevel::High);
        assert_eq!(raw.agent, "weather_risk");
        assert_eq!(raw.risk_label(), Some("high"));
        assert_eq!(raw.tasks, vec!["withhold irrigation".to_string()]);
    }
}
