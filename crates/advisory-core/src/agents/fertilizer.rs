//! Crop NPK targets with a stage-dependent nitrogen split.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{AdvisoryRequest, AgentId, FertilizerDetails, NpkTarget, RawRecommendation};

#[derive(Debug, Clone, Copy, Default)]
pub struct FertilizerAgent;

/// Season target in kg/ha.
pub fn npk_target(crop: &str) -> NpkTarget {
    match crop {
        "wheat" => NpkTarget {
            n: 120.0,
            p: 60.0,
            k: 40.0,
        },
        "rice" => NpkTarget {
            n: 150.0,
            p: 60.0,
            k: 40.0,
        },
        _ => NpkTarget {
            n: 100.0,
            p: 50.0,
            k: 40.0,
        },
    }
}

fn split_task(stage: &str) -> &'static str {
    let has = |keys: &[&str]| keys.iter().any(|k| stage.contains(k));
    if has(&["sow", "plant"]) {
        "Apply 40% of N and full P and K as basal dose"
    } else if has(&["till", "vegetative"]) {
        "Top-dress 30% of N"
    } else if has(&["boot", "flower", "panicle"]) {
        "Top-dress remaining 30% of N"
    } else {
        "Follow split N application based on growth stage (40/30/30)"
    }
}

#[async_trait]
impl AdvisoryAgent for FertilizerAgent {
    fn id(&self) -> AgentId {
        AgentId::Fertilizer
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let stage = request.profile.stage_key();
        let target = npk_target(&request.profile.crop_key());

        let tasks = [
            format!(
                "Target total season NPK (kg/ha): N {}, P {}, K {}",
                target.n, target.p, target.k
            ),
            split_task(&stage).to_string(),
        ];

        Ok(RawRecommendation::new(
            AgentId::Fertilizer,
            7,
            0.8,
            "Provide stage-wise NPK recommendation based on crop.",
        )
        .with_explanation(
            "NPK targets follow crop type and current growth stage, split across the season for better nutrient uptake.",
        )
        .with_sources(["Crop nutrient guidelines"])
        .with_tasks(tasks)
        .with_details(&FertilizerDetails {
            npk_target_kg_per_ha: Some(target),
            stage: Some(stage),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_stage(crop: &str, stage: &str) -> AdvisoryRequest {
        let mut request = AdvisoryRequest::new("F001", crop);
        request.profile.growth_stage = Some(stage.to_string());
        request
    }

    #[tokio::test]
    async fn test_wheat_targets_and_tillering_split() {
        let raw = FertilizerAgent
            .invoke(&at_stage("Wheat", "Tillering"))
            .await
            .unwrap();
        assert_eq!(raw.tasks[0], "Target total season NPK (kg/ha): N 120, P 60, K 40");
        assert_eq!(raw.tasks[1], "Top-dress 30% of N");
        assert_eq!(raw.details["npk_target_kg_per_ha"]["N"], 120.0);
        assert_eq!(raw.details["stage"], "tillering");
    }

    #[tokio::test]
    async fn test_sowing_gets_basal_dose() {
        let raw = FertilizerAgent
            .invoke(&at_stage("rice", "sowing"))
            .await
            .unwrap();
        assert!(raw.tasks[0].contains("N 150"));
        assert!(raw.tasks[1].contains("basal dose"));
    }

    #[tokio::test]
    async fn test_unknown_crop_uses_default_target() {
        let raw = FertilizerAgent
            .invoke(&AdvisoryRequest::new("F001", "millet"))
            .await
            .unwrap();
        assert!(raw.tasks[0].contains("N 100, P 50, K 40"));
        assert!(raw.tasks[1].contains("40/30/30"));
    }
}
