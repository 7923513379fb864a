//! Daemon configuration: deadline, rule table and remote agent endpoints.
//!
//! The agents file maps agent identifiers to endpoints; unmapped agents keep
//! their built-in implementation:
//!
//! ```toml
//! [agents.pest]
//! url = "http://pest-model:9000/recommend"
//! timeout_ms = 1500
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use advisory_core::agents::{AgentRegistry, RemoteAgent, RemoteEndpoint};
use advisory_core::{AgentId, Aggregator, AggregatorConfig, ConflictRuleTable};
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsFile {
    #[serde(default)]
    pub agents: BTreeMap<AgentId, RemoteEndpoint>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub deadline: Duration,
    pub rules_path: Option<PathBuf>,
    pub agents_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deadline: AggregatorConfig::default().deadline,
            rules_path: None,
            agents_path: None,
        }
    }
}

pub fn load_agents(path: &Path) -> Result<AgentsFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read agents file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid agents file {}", path.display()))
}

/// Built-in agents with remote overrides applied. Remote agents share one
/// connection pool.
pub fn build_registry(agents: &AgentsFile) -> AgentRegistry {
    let client = reqwest::Client::new();
    let mut registry = AgentRegistry::builtin();
    for (id, endpoint) in &agents.agents {
        info!(agent = %id, url = %endpoint.url, timeout_ms = ?endpoint.timeout_ms, "using remote agent");
        let agent = RemoteAgent::from_endpoint(*id, endpoint).with_client(client.clone());
        registry.insert(Arc::new(agent));
    }
    registry
}

pub fn build_aggregator(settings: &Settings) -> Result<Aggregator> {
    let rules = match &settings.rules_path {
        Some(path) => ConflictRuleTable::load(path)
            .with_context(|| format!("failed to load rule table {}", path.display()))?,
        None => ConflictRuleTable::standard(),
    };
    let agents = match &settings.agents_path {
        Some(path) => load_agents(path)?,
        None => AgentsFile::default(),
    };

    info!(
        rules = rules.len(),
        remote_agents = agents.agents.len(),
        deadline_ms = settings.deadline.as_millis() as u64,
        "aggregator configured"
    );
    Ok(Aggregator::new(
        build_registry(&agents),
        rules,
        AggregatorConfig {
            deadline: settings.deadline,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisory_core::agents::AdvisoryAgent;
    use advisory_core::{AdvisoryRequest, AgentError};

    #[test]
    fn test_default_settings_use_builtin_everything() {
        let aggregator = build_aggregator(&Settings::default()).unwrap();
        assert_eq!(aggregator.agents().len(), 7);
        assert_eq!(aggregator.rules(), &ConflictRuleTable::standard());
        assert_eq!(aggregator.config().deadline, Duration::from_millis(1800));
    }

    #[tokio::test]
    async fn test_agents_file_overrides_selected_agents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(
            &path,
            "[agents.pest]\nurl = \"http://127.0.0.1:9/recommend\"\ntimeout_ms = 100\n",
        )
        .unwrap();

        let agents = load_agents(&path).unwrap();
        assert_eq!(agents.agents.len(), 1);
        assert_eq!(agents.agents[&AgentId::Pest].timeout_ms, Some(100));

        let registry = build_registry(&agents);
        assert_eq!(registry.len(), 7);
        let err = registry
            .get(AgentId::Pest)
            .unwrap()
            .invoke(&AdvisoryRequest::new("F001", "wheat"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::Transport { .. } | AgentError::TimedOut { .. }
        ));
    }

    #[test]
    fn test_unknown_agent_in_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        std::fs::write(&path, "[agents.drone]\nurl = \"http://x\"\n").unwrap();
        assert!(load_agents(&path).is_err());
    }

    #[test]
    fn test_missing_rules_file_is_reported() {
        let settings = Settings {
            rules_path: Some(PathBuf::from("/nonexistent/rules.toml")),
            ..Settings::default()
        };
        let err = build_aggregator(&settings).err().unwrap();
        assert!(err.to_string().contains("rule table"));
    }
}
