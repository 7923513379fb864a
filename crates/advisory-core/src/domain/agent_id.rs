//! The closed set of advisory agent identifiers.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the seven farming domains that contribute a recommendation.
///
/// Ordering is lexical on the wire identifier (`fertilizer` < `finance_policy`
/// < `irrigation` < ...), which is the deterministic tie-break used by the
/// conflict resolver and the plan builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Irrigation,
    Fertilizer,
    Pest,
    Market,
    WeatherRisk,
    SeedCrop,
    FinancePolicy,
}

impl AgentId {
    /// Every agent, in canonical invocation order.
    pub const ALL: [AgentId; 7] = [
        AgentId::Irrigation,
        AgentId::Fertilizer,
        AgentId::Pest,
        AgentId::Market,
        AgentId::WeatherRisk,
        AgentId::SeedCrop,
        AgentId::FinancePolicy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Irrigation => "irrigation",
            AgentId::Fertilizer => "fertilizer",
            AgentId::Pest => "pest",
            AgentId::Market => "market",
            AgentId::WeatherRisk => "weather_risk",
            AgentId::SeedCrop => "seed_crop",
            AgentId::FinancePolicy => "finance_policy",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl Ord for AgentId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for AgentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_round_trips_through_wire_name() {
        for id in AgentId::ALL {
            assert_eq!(id.as_str().parse::<AgentId>().unwrap(), id);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_unknown_agent_id_is_rejected() {
        assert_eq!("drone".parse::<AgentId>().unwrap_err(), "drone");
        assert!("Irrigation".parse::<AgentId>().is_err());
    }

    #[test]
    fn test_ordering_is_lexical_on_identifier() {
        let mut ids = AgentId::ALL.to_vec();
        ids.sort();
        let names: Vec<&str> = ids.iter().map(AgentId::as_str).collect();
        assert_eq!(
            names,
            vec![
                "fertilizer",
                "finance_policy",
                "irrigation",
                "market",
                "pest",
                "seed_crop",
                "weather_risk"
            ]
        );
    }
}
