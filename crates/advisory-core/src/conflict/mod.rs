//! Conflict detection and resolution between agent recommendations.
//!
//! # Module layout
//!
//! - [`rules`]: `ConflictRule`, `SideMatcher`, `ResolutionAction`, `ConflictRuleTable`
//! - [`resolver`]: `resolve_conflicts`, `ConflictResolution`, `ResolutionOutcome`
//! - [`error`]: `RuleError`, `RuleResult`

pub mod error;
pub mod resolver;
pub mod rules;

pub use error::{RuleError, RuleResult};
pub use resolver::{resolve_conflicts, ConflictResolution, ResolutionOutcome};
pub use rules::{ConflictRule, ConflictRuleTable, ResolutionAction, SideMatcher};
