//! Per-agent `details` schemas.
//!
//! Agents return `details` as open JSON. The validator decodes it with the
//! schema selected by the agent identifier, so downstream code can match on
//! [`AgentDetails`] instead of probing untyped maps. Every schema keeps keys
//! it does not know about in `extra`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::agent_id::AgentId;
use super::recommendation::RiskLevel;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IrrigationDetails {
    #[serde(default)]
    pub soil_moisture_pct: Option<f64>,
    #[serde(default)]
    pub low_threshold: Option<f64>,
    #[serde(default)]
    pub high_threshold: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Season nutrient target in kg/ha.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NpkTarget {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FertilizerDetails {
    #[serde(default)]
    pub npk_target_kg_per_ha: Option<NpkTarget>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PestDetails {
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub watchlist: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketDetails {
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Score for one weather hazard (drought, flood, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HazardAssessment {
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Percent, capped at 95.
    #[serde(default)]
    pub probability: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherRiskDetails {
    #[serde(default)]
    pub hazards: BTreeMap<String, HazardAssessment>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub forecast_available: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VarietyScore {
    pub variety_name: String,
    pub score: f64,
    #[serde(default)]
    pub yield_potential: String,
    #[serde(default)]
    pub disease_resistance: Vec<String>,
    #[serde(default)]
    pub drought_tolerance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeedCropDetails {
    #[serde(default)]
    pub variety_recommendations: Vec<VarietyScore>,
    #[serde(default)]
    pub soil_suitability: Option<f64>,
    #[serde(default)]
    pub climate_suitability: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchemeMatch {
    pub name: String,
    #[serde(default)]
    pub benefit_amount: String,
    #[serde(default)]
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoanMatch {
    pub name: String,
    #[serde(default)]
    pub interest_rate: String,
    #[serde(default)]
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinancePolicyDetails {
    #[serde(default)]
    pub farmer_category: Option<String>,
    #[serde(default)]
    pub schemes: Vec<SchemeMatch>,
    #[serde(default)]
    pub loans: Vec<LoanMatch>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Typed `details`, one variant per agent.
///
/// Serialized without a tag: the owning recommendation's `agent` field
/// already names the variant.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AgentDetails {
    Irrigation(IrrigationDetails),
    Fertilizer(FertilizerDetails),
    Pest(PestDetails),
    Market(MarketDetails),
    WeatherRisk(WeatherRiskDetails),
    SeedCrop(SeedCropDetails),
    FinancePolicy(FinancePolicyDetails),
}

impl AgentDetails {
    /// The empty schema for `agent`.
    pub fn empty(agent: AgentId) -> Self {
        match agent {
            AgentId::Irrigation => AgentDetails::Irrigation(Default::default()),
            AgentId::Fertilizer => AgentDetails::Fertilizer(Default::default()),
            AgentId::Pest => AgentDetails::Pest(Default::default()),
            AgentId::Market => AgentDetails::Market(Default::default()),
            AgentId::WeatherRisk => AgentDetails::WeatherRisk(Default::default()),
            AgentId::SeedCrop => AgentDetails::SeedCrop(Default::default()),
            AgentId::FinancePolicy => AgentDetails::FinancePolicy(Default::default()),
        }
    }

    /// Decode raw JSON with the schema for `agent`. `null` decodes to the
    /// empty schema.
    pub fn decode(agent: AgentId, value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::empty(agent));
        }
        Ok(match agent {
            AgentId::Irrigation => AgentDetails::Irrigation(serde_json::from_value(value)?),
            AgentId::Fertilizer => AgentDetails::Fertilizer(serde_json::from_value(value)?),
            AgentId::Pest => AgentDetails::Pest(serde_json::from_value(value)?),
            AgentId::Market => AgentDetails::Market(serde_json::from_value(value)?),
            AgentId::WeatherRisk => AgentDetails::WeatherRisk(serde_json::from_value(value)?),
            AgentId::SeedCrop => AgentDetails::SeedCrop(serde_json::from_value(value)?),
            AgentId::FinancePolicy => {
                AgentDetails::FinancePolicy(serde_json::from_value(value)?)
            }
        })
    }

    pub fn agent(&self) -> AgentId {
        match self {
            AgentDetails::Irrigation(_) => AgentId::Irrigation,
            AgentDetails::Fertilizer(_) => AgentId::Fertilizer,
            AgentDetails::Pest(_) => AgentId::Pest,
            AgentDetails::Market(_) => AgentId::Market,
            AgentDetails::WeatherRisk(_) => AgentId::WeatherRisk,
            AgentDetails::SeedCrop(_) => AgentId::SeedCrop,
            AgentDetails::FinancePolicy(_) => AgentId::FinancePolicy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_selects_schema_by_agent() {
        let details = AgentDetails::decode(
            AgentId::Fertilizer,
            serde_json::json!({
                "npk_target_kg_per_ha": { "N": 120.0, "P": 60.0, "K": 40.0 },
                "stage": "tillering"
            }),
        )
        .unwrap();
        match details {
            AgentDetails::Fertilizer(f) => {
                assert_eq!(f.npk_target_kg_per_ha.unwrap().n, 120.0);
                assert_eq!(f.stage.as_deref(), Some("tillering"));
            }
            other => panic!("expected fertilizer details, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_null_yields_empty_schema() {
        for id in AgentId::ALL {
            let details = AgentDetails::decode(id, Value::Null).unwrap();
            assert_eq!(details.agent(), id);
        }
    }

    #[test]
    fn test_unknown_keys_are_preserved_in_extra() {
        let details = AgentDetails::decode(
            AgentId::Market,
            serde_json::json!({ "crop": "rice", "mandi": "Karnal" }),
        )
        .unwrap();
        let AgentDetails::Market(market) = &details else {
            panic!("expected market details");
        };
        assert_eq!(market.extra.get("mandi"), Some(&serde_json::json!("Karnal")));

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["mandi"], "Karnal");
        assert_eq!(json["crop"], "rice");
    }

    #[test]
    fn test_mistyped_details_fail_to_decode() {
        let result = AgentDetails::decode(
            AgentId::Irrigation,
            serde_json::json!({ "low_threshold": "twenty" }),
        );
        assert!(result.is_err());
    }
}
