//! Advisory agents.
//!
//! An agent turns an [`AdvisoryRequest`] into at most one
//! [`RawRecommendation`]. The aggregator only sees the [`AdvisoryAgent`]
//! trait, so in-process rule-based agents and [`RemoteAgent`] endpoints are
//! interchangeable.

pub mod error;
pub mod fertilizer;
pub mod finance_policy;
pub mod irrigation;
pub mod market;
pub mod pest;
pub mod remote;
pub mod seed_crop;
pub mod weather_risk;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AdvisoryRequest, AgentId, RawRecommendation};

pub use error::{AgentError, AgentResult};
pub use fertilizer::FertilizerAgent;
pub use finance_policy::FinancePolicyAgent;
pub use irrigation::IrrigationAgent;
pub use market::MarketAgent;
pub use pest::PestAgent;
pub use remote::{RemoteAgent, RemoteEndpoint};
pub use seed_crop::SeedCropAgent;
pub use weather_risk::WeatherRiskAgent;

/// One advisory-generating collaborator.
///
/// Implementations must not rely on shared mutable state: the aggregator
/// invokes every agent concurrently against the same request snapshot and
/// may drop an invocation at any await point.
#[async_trait]
pub trait AdvisoryAgent: Send + Sync {
    /// The identifier this agent answers for.
    fn id(&self) -> AgentId;

    /// Produce a recommendation for `request`.
    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation>;
}

/// The set of agents one aggregator fans out to, at most one per identifier.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Arc<dyn AdvisoryAgent>>,
}

impl AgentRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// All seven in-process rule-based agents.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.insert(Arc::new(IrrigationAgent));
        registry.insert(Arc::new(FertilizerAgent));
        registry.insert(Arc::new(PestAgent));
        registry.insert(Arc::new(MarketAgent));
        registry.insert(Arc::new(WeatherRiskAgent));
        registry.insert(Arc::new(SeedCropAgent));
        registry.insert(Arc::new(FinancePolicyAgent));
        registry
    }

    /// Register `agent`, replacing any agent with the same identifier.
    pub fn insert(&mut self, agent: Arc<dyn AdvisoryAgent>) -> Option<Arc<dyn AdvisoryAgent>> {
        self.agents.insert(agent.id(), agent)
    }

    pub fn with_agent(mut self, agent: Arc<dyn AdvisoryAgent>) -> Self {
        self.insert(agent);
        self
    }

    pub fn get(&self, id: AgentId) -> Option<&Arc<dyn AdvisoryAgent>> {
        self.agents.get(&id)
    }

    /// Registered identifiers in lexical order.
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AdvisoryAgent>> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_covers_every_agent() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.len(), AgentId::ALL.len());
        for id in AgentId::ALL {
            assert_eq!(registry.get(id).map(|a| a.id()), Some(id));
        }
    }

    #[test]
    fn test_insert_replaces_same_identifier() {
        let mut registry = AgentRegistry::builtin();
        let previous = registry.insert(Arc::new(PestAgent));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn test_ids_are_lexically_ordered() {
        let ids = AgentRegistry::builtin().ids();
        let mut sorted = ids.clone();
        sorted.sort_by_key(|id| id.as_str());
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_every_builtin_agent_labels_its_output() {
        let mut request = AdvisoryRequest::new("F001", "wheat");
        request.profile.farm_size_hectares = Some(1.5);
        for agent in AgentRegistry::builtin().iter() {
            let raw = agent.invoke(&request).await.unwrap();
            assert_eq!(raw.agent, agent.id().as_str());
            assert!(!raw.tasks.is_empty(), "{} returned no tasks", agent.id());
        }
    }
}
