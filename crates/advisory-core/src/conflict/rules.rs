//! Conflict-rule table.
//!
//! Rules are data: an ordered list of [`ConflictRule`]s, each naming an agent
//! pair, one [`SideMatcher`] per side and a [`ResolutionAction`]. Tables are
//! built in code ([`ConflictRuleTable::standard`]) or loaded from TOML:
//!
//! ```toml
//! [[rules]]
//! id = "irrigation_vs_rain"
//! agents = ["irrigation", "weather_risk"]
//! action = { type = "suppress_lower_priority" }
//!
//! [rules.left]
//! task_keywords = ["irrigate"]
//!
//! [rules.right]
//! task_keywords = ["withhold irrigation", "heavy rain"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{RuleError, RuleResult};
use crate::domain::{AgentId, Recommendation, RiskLevel};

/// Predicate over one side of a rule. All constraints must hold; an empty
/// constraint always holds. Keyword matching is case-insensitive substring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SideMatcher {
    /// Tasks containing any of these are the conflicting tasks. When empty,
    /// every task of the recommendation conflicts.
    #[serde(default)]
    pub task_keywords: Vec<String>,
    /// The summary must contain at least one of these.
    #[serde(default)]
    pub summary_keywords: Vec<String>,
    /// The declared risk (absent = `low`) must be at least this severe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_risk: Option<RiskLevel>,
}

impl SideMatcher {
    pub fn tasks(keywords: &[&str]) -> Self {
        Self {
            task_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_min_risk(mut self, risk: RiskLevel) -> Self {
        self.min_risk = Some(risk);
        self
    }

    /// Indices of the conflicting tasks in `rec`, or `None` when this side
    /// does not match. A recommendation without tasks never matches.
    pub fn conflicting_tasks(&self, rec: &Recommendation) -> Option<Vec<usize>> {
        if rec.tasks.is_empty() {
            return None;
        }
        if let Some(min) = self.min_risk {
            if rec.effective_risk() < min {
                return None;
            }
        }
        if !self.summary_keywords.is_empty() && !contains_any(&rec.summary, &self.summary_keywords)
        {
            return None;
        }

        let indices: Vec<usize> = if self.task_keywords.is_empty() {
            (0..rec.tasks.len()).collect()
        } else {
            rec.tasks
                .iter()
                .enumerate()
                .filter(|(_, task)| contains_any(task, &self.task_keywords))
                .map(|(i, _)| i)
                .collect()
        };

        if indices.is_empty() {
            None
        } else {
            Some(indices)
        }
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .any(|k| haystack.contains(&k.to_lowercase()))
}

/// What to do when both sides of a rule match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Remove the losing side's conflicting tasks. The winner has the higher
    /// priority, then higher confidence, then the smaller agent identifier.
    SuppressLowerPriority,
    /// Keep everything; append a note about the other side to each explanation.
    AnnotateBoth {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// Replace the conflicting tasks of both sides with one combined task.
    Merge { combined_task: String },
}

impl ResolutionAction {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionAction::SuppressLowerPriority => "suppress_lower_priority",
            ResolutionAction::AnnotateBoth { .. } => "annotate_both",
            ResolutionAction::Merge { .. } => "merge",
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictRule {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// `agents[0]` is matched by `left`, `agents[1]` by `right`.
    pub agents: [AgentId; 2],
    #[serde(default)]
    pub left: SideMatcher,
    #[serde(default)]
    pub right: SideMatcher,
    pub action: ResolutionAction,
}

impl ConflictRule {
    pub fn new(
        id: impl Into<String>,
        agents: [AgentId; 2],
        left: SideMatcher,
        right: SideMatcher,
        action: ResolutionAction,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            agents,
            left,
            right,
            action,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered rule table. Rules are evaluated in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConflictRuleTable {
    #[serde(default)]
    pub rules: Vec<ConflictRule>,
}

impl ConflictRuleTable {
    /// A table with no rules: every recommendation coexists unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in agronomic rule set.
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(
                ConflictRule::new(
                    "irrigation_vs_rain",
                    [AgentId::Irrigation, AgentId::WeatherRisk],
                    SideMatcher::tasks(&["irrigate"]),
                    SideMatcher::tasks(&["withhold irrigation", "heavy rain"]),
                    ResolutionAction::SuppressLowerPriority,
                )
                .with_description("Do not schedule irrigation when heavy rain is forecast"),
            )
            .with_rule(
                ConflictRule::new(
                    "spray_vs_rain",
                    [AgentId::Pest, AgentId::WeatherRisk],
                    SideMatcher::tasks(&["spray"]),
                    SideMatcher::tasks(&["heavy rain", "rain expected"]),
                    ResolutionAction::SuppressLowerPriority,
                )
                .with_description("Sprays wash off when rain follows application"),
            )
            .with_rule(
                ConflictRule::new(
                    "irrigate_before_topdress",
                    [AgentId::Irrigation, AgentId::Fertilizer],
                    SideMatcher::tasks(&["irrigate"]),
                    SideMatcher::tasks(&["top-dress"]),
                    ResolutionAction::Merge {
                        combined_task:
                            "Irrigate first, then top-dress nitrogen once the topsoil is moist"
                                .to_string(),
                    },
                )
                .with_description("Nitrogen top-dressing follows irrigation"),
            )
            .with_rule(
                ConflictRule::new(
                    "fertilizer_vs_flood",
                    [AgentId::Fertilizer, AgentId::WeatherRisk],
                    SideMatcher::tasks(&["top-dress", "basal"]),
                    SideMatcher::tasks(&["drainage", "flood", "heavy rain"]),
                    ResolutionAction::AnnotateBoth {
                        note: Some(
                            "Fertilizer applied before heavy rain may leach; time application after the rain"
                                .to_string(),
                        ),
                    },
                )
                .with_description("Warn about nutrient leaching under flood risk"),
            )
            .with_rule(
                ConflictRule::new(
                    "sowing_under_high_weather_risk",
                    [AgentId::SeedCrop, AgentId::WeatherRisk],
                    SideMatcher::tasks(&["seed", "sow"]),
                    SideMatcher::default().with_min_risk(RiskLevel::High),
                    ResolutionAction::AnnotateBoth { note: None },
                )
                .with_description("Flag seed purchases while weather risk is high"),
            )
    }

    pub fn with_rule(mut self, rule: ConflictRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check structural invariants: non-empty unique ids, distinct agents per
    /// rule, non-empty merge text.
    pub fn validate(&self) -> RuleResult<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(RuleError::EmptyId);
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
            if rule.agents[0] == rule.agents[1] {
                return Err(RuleError::SelfPair {
                    id: rule.id.clone(),
                    agent: rule.agents[0],
                });
            }
            if let ResolutionAction::Merge { combined_task } = &rule.action {
                if combined_task.trim().is_empty() {
                    return Err(RuleError::EmptyMergeTask(rule.id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML rule table.
    pub fn from_toml_str(s: &str) -> RuleResult<Self> {
        let table: ConflictRuleTable = toml::from_str(s)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a TOML rule table from disk.
    pub fn load(path: &Path) -> RuleResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> RuleResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
