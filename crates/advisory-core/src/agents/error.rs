//! Agent failure types.
//!
//! An [`AgentError`] only ever removes one agent's contribution; the
//! aggregator records it and carries on with the rest.

use thiserror::Error;

use crate::domain::AgentId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("{agent} agent failed: {reason}")]
    Internal { agent: AgentId, reason: String },

    #[error("transport error calling {agent} agent: {reason}")]
    Transport { agent: AgentId, reason: String },

    #[error("{agent} agent returned HTTP {status}")]
    Status { agent: AgentId, status: u16 },

    #[error("{agent} agent returned a malformed payload: {reason}")]
    MalformedPayload { agent: AgentId, reason: String },

    #[error("{agent} agent did not respond within {deadline_ms} ms")]
    TimedOut { agent: AgentId, deadline_ms: u64 },
}

impl AgentError {
    pub fn internal(agent: AgentId, reason: impl Into<String>) -> Self {
        AgentError::Internal {
            agent,
            reason: reason.into(),
        }
    }

    pub fn agent(&self) -> AgentId {
        match self {
            AgentError::Internal { agent, .. }
            | AgentError::Transport { agent, .. }
            | AgentError::Status { agent, .. }
            | AgentError::MalformedPayload { agent, .. }
            | AgentError::TimedOut { agent, .. } => *agent,
        }
    }
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;
