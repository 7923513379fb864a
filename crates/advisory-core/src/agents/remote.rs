//! HTTP transport for agents that run out of process.
//!
//! The remote service receives the [`AdvisoryRequest`] as a JSON body and
//! answers with a raw recommendation. Anything else is an agent failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AdvisoryAgent, AgentError, AgentResult};
use crate::domain::{AdvisoryRequest, AgentId, RawRecommendation};

/// Where to reach one remote agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteEndpoint {
    pub url: String,
    /// Per-call timeout. The aggregator deadline still applies on top.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RemoteAgent {
    id: AgentId,
    url: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl RemoteAgent {
    pub fn new(id: AgentId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_endpoint(id: AgentId, endpoint: &RemoteEndpoint) -> Self {
        let agent = Self::new(id, endpoint.url.clone());
        match endpoint.timeout_ms {
            Some(ms) => agent.with_timeout(Duration::from_millis(ms)),
            None => agent,
        }
    }

    /// Share a connection pool across agents.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AdvisoryAgent for RemoteAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let mut call = self.client.post(&self.url).json(request);
        if let Some(timeout) = self.timeout {
            call = call.timeout(timeout);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::TimedOut {
                    agent: self.id,
                    deadline_ms: self.timeout.map_or(0, |t| t.as_millis() as u64),
                }
            } else {
                AgentError::Transport {
                    agent: self.id,
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Status {
                agent: self.id,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| AgentError::Transport {
            agent: self.id,
            reason: e.to_string(),
        })?;
        debug!(agent = %self.id, bytes = body.len(), "remote agent responded");

        serde_json::from_slice(&body).map_err(|e| AgentError::MalformedPayload {
            agent: self.id,
            reason: e.to_string(),
        })
    }
}
