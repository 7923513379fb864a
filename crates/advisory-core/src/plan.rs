//! Unified plan builder.
//!
//! Orders surviving recommendations by precedence and flattens their tasks
//! into one list:
//! 1. `priority` descending
//! 2. `confidence_score` descending
//! 3. agent identifier ascending
//!
//! Within a recommendation, tasks keep their original order. Exact duplicate
//! task strings collapse to the first (highest-precedence) occurrence; no
//! other deduplication is performed.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::Recommendation;

/// Total precedence order between two recommendations. `Less` means `a`
/// comes first (wins).
pub fn precedence(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.confidence_score.total_cmp(&a.confidence_score))
        .then_with(|| a.agent.cmp(&b.agent))
}

/// Sort recommendations into plan order in place.
pub fn order_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(precedence);
}

/// Build the unified task list. Input order does not affect the output.
pub fn build_unified_plan(recommendations: &[Recommendation]) -> Vec<String> {
    let mut ordered: Vec<&Recommendation> = recommendations.iter().collect();
    ordered.sort_by(|a, b| precedence(a, b));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut plan = Vec::new();
    for rec in ordered {
        for task in &rec.tasks {
            if seen.insert(task.as_str()) {
                plan.push(task.clone());
            }
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentDetails, AgentId};

    fn rec(agent: AgentId, priority: u8, confidence: f64, tasks: &[&str]) -> Recommendation {
        Recommendation {
            agent,
            priority,
            confidence_score: confidence,
            summary: String::new(),
            explanation: String::new(),
            data_sources: vec![],
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
            risk_level: None,
            estimated_impact: None,
            cost_estimate: None,
            details: AgentDetails::empty(agent),
        }
    }

    #[test]
    fn test_plan_follows_priority_descending() {
        let recs = vec![
            rec(AgentId::Market, 5, 0.7, &["sell"]),
            rec(AgentId::WeatherRisk, 9, 0.8, &["shelter"]),
            rec(AgentId::Pest, 7, 0.7, &["scout"]),
        ];
        assert_eq!(build_unified_plan(&recs), vec!["shelter", "scout", "sell"]);
    }

    #[test]
    fn test_ties_break_on_confidence_then_agent_id() {
        let recs = vec![
            rec(AgentId::Pest, 6, 0.7, &["pest task"]),
            rec(AgentId::Market, 6, 0.7, &["market task"]),
            rec(AgentId::Irrigation, 6, 0.9, &["irrigation task"]),
        ];
        assert_eq!(
            build_unified_plan(&recs),
            vec!["irrigation task", "market task", "pest task"]
        );
    }

    #[test]
    fn test_tasks_keep_their_order_within_a_recommendation() {
        let recs = vec![rec(AgentId::Fertilizer, 7, 0.8, &["b", "a", "c"])];
        assert_eq!(build_unified_plan(&recs), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_exact_duplicates_collapse_to_highest_precedence_position() {
        let recs = vec![
            rec(AgentId::Market, 4, 0.7, &["Check weather alerts", "sell"]),
            rec(AgentId::WeatherRisk, 9, 0.8, &["shelter", "Check weather alerts"]),
        ];
        assert_eq!(
            build_unified_plan(&recs),
            vec!["shelter", "Check weather alerts", "sell"]
        );
    }

    #[test]
    fn test_near_duplicates_are_kept() {
        let recs = vec![
            rec(AgentId::Market, 4, 0.7, &["Check weather alerts"]),
            rec(AgentId::WeatherRisk, 9, 0.8, &["check weather alerts"]),
        ];
        assert_eq!(build_unified_plan(&recs).len(), 2);
    }

    #[test]
    fn test_plan_is_independent_of_input_order() {
        let a = vec![
            rec(AgentId::Pest, 6, 0.7, &["x", "y"]),
            rec(AgentId::Market, 6, 0.7, &["y", "z"]),
            rec(AgentId::SeedCrop, 7, 0.8, &["w"]),
        ];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(build_unified_plan(&a), build_unified_plan(&b));
        assert_eq!(build_unified_plan(&a), build_unified_plan(&a));
    }

    #[test]
    fn test_order_recommendations_matches_plan_order() {
        let mut recs = vec![
            rec(AgentId::Market, 4, 0.7, &["m"]),
            rec(AgentId::Irrigation, 8, 0.9, &["i"]),
        ];
        order_recommendations(&mut recs);
        assert_eq!(recs[0].agent, AgentId::Irrigation);
    }
}
