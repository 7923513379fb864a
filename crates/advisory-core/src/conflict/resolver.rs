//! Applies a [`ConflictRuleTable`] to a validated recommendation set.
//!
//! Rules are evaluated in table order and each sees the output of the
//! previous one. A rule applies only when both of its agents are present and
//! both side matchers match; otherwise the recommendations coexist unchanged.
//! The resolver never adds or drops recommendations, only tasks and
//! explanation text, so the number of recommendations is preserved.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use super::rules::{ConflictRule, ConflictRuleTable, ResolutionAction};
use crate::domain::{AgentId, Recommendation};
use crate::plan::precedence;

/// Record of one applied rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConflictResolution {
    pub rule_id: String,
    pub action: &'static str,
    pub agents: [AgentId; 2],
    /// The side that kept its guidance, for suppress and merge.
    pub winner: Option<AgentId>,
    /// Tasks removed from the plan input.
    pub removed_tasks: Vec<String>,
    /// The combined task inserted by a merge.
    pub merged_task: Option<String>,
}

/// Post-resolution recommendation set plus the rules that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOutcome {
    pub recommendations: Vec<Recommendation>,
    pub applied: Vec<ConflictResolution>,
}

/// Resolve conflicts between `recommendations` using `table`.
pub fn resolve_conflicts(
    table: &ConflictRuleTable,
    mut recommendations: Vec<Recommendation>,
) -> ResolutionOutcome {
    let mut applied = Vec::new();

    for rule in &table.rules {
        if let Some(resolution) = apply_rule(rule, &mut recommendations) {
            debug!(
                rule_id = %resolution.rule_id,
                action = resolution.action,
                removed = resolution.removed_tasks.len(),
                "conflict rule applied"
            );
            applied.push(resolution);
        }
    }

    ResolutionOutcome {
        recommendations,
        applied,
    }
}

fn apply_rule(rule: &ConflictRule, recs: &mut [Recommendation]) -> Option<ConflictResolution> {
    let left_idx = recs.iter().position(|r| r.agent == rule.agents[0])?;
    let right_idx = recs.iter().position(|r| r.agent == rule.agents[1])?;
    if left_idx == right_idx {
        return None;
    }

    let left_tasks = rule.left.conflicting_tasks(&recs[left_idx])?;
    let right_tasks = rule.right.conflicting_tasks(&recs[right_idx])?;

    // Winner first.
    let (win_idx, win_tasks, lose_idx, lose_tasks) =
        match precedence(&recs[left_idx], &recs[right_idx]) {
            Ordering::Greater => (right_idx, right_tasks, left_idx, left_tasks),
            _ => (left_idx, left_tasks, right_idx, right_tasks),
        };
    let winner = recs[win_idx].agent;
    let loser = recs[lose_idx].agent;

    let mut resolution = ConflictResolution {
        rule_id: rule.id.clone(),
        action: rule.action.kind(),
        agents: rule.agents,
        winner: None,
        removed_tasks: Vec::new(),
        merged_task: None,
    };

    match &rule.action {
        ResolutionAction::SuppressLowerPriority => {
            resolution.winner = Some(winner);
            resolution.removed_tasks = remove_tasks(&mut recs[lose_idx], &lose_tasks);
            let note = format!(
                "Some guidance was withdrawn in favour of {} advice: {}",
                winner,
                recs[win_idx].summary
            );
            append_note(&mut recs[lose_idx].explanation, &note);
        }
        ResolutionAction::AnnotateBoth { note } => {
            let left_note = stance_note(note.as_deref(), &recs[right_idx]);
            let right_note = stance_note(note.as_deref(), &recs[left_idx]);
            append_note(&mut recs[left_idx].explanation, &left_note);
            append_note(&mut recs[right_idx].explanation, &right_note);
        }
        ResolutionAction::Merge { combined_task } => {
            resolution.winner = Some(winner);
            // `win_tasks` is ascending and non-empty.
            let insert_at = win_tasks[0];
            let mut removed = remove_tasks(&mut recs[win_idx], &win_tasks);
            removed.extend(remove_tasks(&mut recs[lose_idx], &lose_tasks));

            let combined = combined_task.trim().to_string();
            if !recs[win_idx].tasks.contains(&combined) {
                let at = insert_at.min(recs[win_idx].tasks.len());
                recs[win_idx].tasks.insert(at, combined.clone());
            }
            append_note(
                &mut recs[win_idx].explanation,
                &format!("Combined with {} guidance: {}", loser, combined),
            );
            append_note(
                &mut recs[lose_idx].explanation,
                &format!("Combined with {} guidance: {}", winner, combined),
            );

            resolution.removed_tasks = removed;
            resolution.merged_task = Some(combined);
        }
    }

    Some(resolution)
}

/// Remove the tasks at `indices` (ascending), returning them in order.
fn remove_tasks(rec: &mut Recommendation, indices: &[usize]) -> Vec<String> {
    let mut removed = Vec::with_capacity(indices.len());
    for &idx in indices.iter().rev() {
        if idx < rec.tasks.len() {
            removed.push(rec.tasks.remove(idx));
        }
    }
    removed.reverse();
    removed
}

fn stance_note(note: Option<&str>, other: &Recommendation) -> String {
    match note {
        Some(note) => format!("Conflicts with {} advice ({}). {}", other.agent, other.summary, note),
        None => format!("Conflicts with {} advice: {}", other.agent, other.summary),
    }
}

fn append_note(explanation: &mut String, note: &str) {
    if !explanation.is_empty() {
        explanation.push(' ');
    }
    explanation.push('[');
    explanation.push_str(note.trim_end_matches('.'));
    explanation.push(']');
}
