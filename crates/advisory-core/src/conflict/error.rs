//! Errors for conflict-rule tables.

/// Errors produced while loading or checking a conflict-rule table.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule id must not be empty")]
    EmptyId,

    #[error("duplicate rule id: {0}")]
    DuplicateId(String),

    #[error("rule {id} pairs {agent} with itself")]
    SelfPair {
        id: String,
        agent: crate::domain::AgentId,
    },

    #[error("rule {0}: merge action needs a non-empty combined_task")]
    EmptyMergeTask(String),

    #[error("failed to parse rule table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize rule table: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rule-table operations.
pub type RuleResult<T> = std::result::Result<T, RuleError>;
