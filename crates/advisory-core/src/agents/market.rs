//! Price tracking and sale-timing guidance.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{AdvisoryRequest, AgentId, MarketDetails, RawRecommendation};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketAgent;

#[async_trait]
impl AdvisoryAgent for MarketAgent {
    fn id(&self) -> AgentId {
        AgentId::Market
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let crop = request.profile.crop_key();
        let tasks = [
            format!(
                "Track weekly prices for {} at nearest mandis and online platforms",
                crop
            ),
            "If storage available, compare expected price trend vs. storage cost".to_string(),
        ];

        Ok(RawRecommendation::new(
            AgentId::Market,
            4,
            0.7,
            "Monitor market prices and plan sales timing.",
        )
        .with_explanation("Price monitoring and sales timing help maximise returns.")
        .with_sources(["Mandi price feeds"])
        .with_tasks(tasks)
        .with_details(&MarketDetails {
            crop: Some(crop),
            ..Default::default()
        }))
    }
}
