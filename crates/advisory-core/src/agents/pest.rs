//! Routine scouting plus a crop-specific watchlist.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{AdvisoryRequest, AgentId, PestDetails, RawRecommendation};

#[derive(Debug, Clone, Copy, Default)]
pub struct PestAgent;

fn watchlist(crop: &str) -> (&'static [&'static str], Option<&'static str>) {
    match crop {
        "rice" => (
            &["stem borer", "brown planthopper"],
            Some("Monitor for stem borer and brown planthopper; check tillers and leaf sheaths"),
        ),
        "wheat" => (
            &["rusts", "aphids"],
            Some("Monitor for rusts and aphids; inspect lower leaves for lesions"),
        ),
        _ => (&[], None),
    }
}

#[async_trait]
impl AdvisoryAgent for PestAgent {
    fn id(&self) -> AgentId {
        AgentId::Pest
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let crop = request.profile.crop_key();
        let (pests, crop_task) = watchlist(&crop);

        let mut tasks = vec![
            "Scout fields twice this week for pest/disease symptoms".to_string(),
            "Use pheromone traps if available; replace lures every 3-4 weeks".to_string(),
        ];
        tasks.extend(crop_task.map(str::to_string));

        Ok(RawRecommendation::new(
            AgentId::Pest,
            6,
            0.7,
            "Routine scouting and crop-specific pest watchlist.",
        )
        .with_explanation(
            "Regular field scouting and crop-specific pest identification allow early intervention.",
        )
        .with_sources(["Regional pest calendar"])
        .with_tasks(tasks)
        .with_details(&PestDetails {
            crop: Some(crop),
            watchlist: pests.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }))
    }
}
