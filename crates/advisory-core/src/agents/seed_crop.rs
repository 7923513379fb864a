//! Variety selection from a per-crop catalogue.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentError, AgentResult};
use crate::domain::{
    AdvisoryRequest, AgentId, CostEstimate, RawRecommendation, RiskLevel, SeedCropDetails,
    VarietyScore,
};

/// How many ranked varieties are reported.
const TOP_VARIETIES: usize = 2;

struct Variety {
    name: &'static str,
    yield_potential: &'static str,
    disease_resistance: &'static [&'static str],
    drought_tolerance: &'static str,
}

const WHEAT: &[Variety] = &[
    Variety {
        name: "HD-2967",
        yield_potential: "high",
        disease_resistance: &["rust"],
        drought_tolerance: "medium",
    },
    Variety {
        name: "PBW-343",
        yield_potential: "medium",
        disease_resistance: &["rust"],
        drought_tolerance: "high",
    },
    Variety {
        name: "DBW-17",
        yield_potential: "high",
        disease_resistance: &["rust", "smut"],
        drought_tolerance: "medium",
    },
];

const RICE: &[Variety] = &[
    Variety {
        name: "Pusa-44",
        yield_potential: "high",
        disease_resistance: &["blast"],
        drought_tolerance: "low",
    },
    Variety {
        name: "PR-114",
        yield_potential: "medium",
        disease_resistance: &["blast"],
        drought_tolerance: "medium",
    },
    Variety {
        name: "HKR-47",
        yield_potential: "high",
        disease_resistance: &["blast", "bacterial_blight"],
        drought_tolerance: "medium",
    },
];

fn catalogue(crop: &str) -> Option<&'static [Variety]> {
    match crop {
        "wheat" => Some(WHEAT),
        "rice" => Some(RICE),
        _ => None,
    }
}

/// Ranked best first; ties keep catalogue order.
fn rank(varieties: &[Variety]) -> Vec<VarietyScore> {
    let mut scored: Vec<(u32, &Variety)> = varieties
        .iter()
        .map(|v| {
            let mut points = 7;
            if v.yield_potential == "high" {
                points += 2;
            }
            if v.drought_tolerance == "high" {
                points += 1;
            }
            (points, v)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(TOP_VARIETIES)
        .map(|(points, v)| VarietyScore {
            variety_name: v.name.to_string(),
            score: f64::from(points) / 10.0,
            yield_potential: v.yield_potential.to_string(),
            disease_resistance: v.disease_resistance.iter().map(|d| d.to_string()).collect(),
            drought_tolerance: v.drought_tolerance.to_string(),
        })
        .collect()
}

fn soil_suitability(request: &AdvisoryRequest) -> f64 {
    match request.profile.soil_type.as_deref() {
        Some("loam") | Some("clay_loam") => 0.9,
        _ => 0.7,
    }
}

fn climate_suitability(request: &AdvisoryRequest) -> Option<f64> {
    request.weather.as_ref().map(|w| {
        if (20.0..=30.0).contains(&w.temperature_c) {
            0.9
        } else {
            0.7
        }
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCropAgent;

#[async_trait]
impl AdvisoryAgent for SeedCropAgent {
    fn id(&self) -> AgentId {
        AgentId::SeedCrop
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let crop = request.profile.crop_key();
        let varieties = catalogue(&crop).ok_or_else(|| {
            AgentError::internal(
                AgentId::SeedCrop,
                format!("no variety catalogue for crop '{}'", crop),
            )
        })?;
        let ranked = rank(varieties);
        let best = ranked.first().ok_or_else(|| {
            AgentError::internal(AgentId::SeedCrop, format!("empty catalogue for '{}'", crop))
        })?;

        let tasks = [
            format!("Select {} variety for {}", best.variety_name, request.profile.crop),
            "Purchase certified seeds from authorized dealers".to_string(),
            "Check seed germination rate before sowing".to_string(),
        ];
        let explanation = format!(
            "Recommended: {} with {:.1}% suitability score.",
            best.variety_name,
            best.score * 100.0
        );

        Ok(RawRecommendation::new(
            AgentId::SeedCrop,
            7,
            0.8,
            format!("Optimal seed variety selection for {}", request.profile.crop),
        )
        .with_explanation(explanation)
        .with_sources(["Crop Variety Database", "Soil Health Card", "Weather Forecast"])
        .with_tasks(tasks)
        .with_risk(RiskLevel::Low)
        .with_impact("positive")
        .with_cost(&CostEstimate {
            estimated_cost_inr: Some(2000.0),
            cost_unit: Some("INR per hectare".to_string()),
            ..Default::default()
        })
        .with_details(&SeedCropDetails {
            variety_recommendations: ranked,
            soil_suitability: Some(soil_suitability(request)),
            climate_suitability: climate_suitability(request),
            ..Default::default()
        }))
    }
}
