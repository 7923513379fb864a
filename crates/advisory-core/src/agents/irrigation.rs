//! Soil-moisture threshold irrigation agent.

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{AdvisoryRequest, AgentId, IrrigationDetails, RawRecommendation};

const PRIORITY: i64 = 8;
const CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default)]
pub struct IrrigationAgent;

/// `(low, high)` moisture band, percent.
pub fn moisture_band(crop: &str) -> (f64, f64) {
    match crop {
        "wheat" | "rice" => (22.0, 35.0),
        _ => (20.0, 32.0),
    }
}

#[async_trait]
impl AdvisoryAgent for IrrigationAgent {
    fn id(&self) -> AgentId {
        AgentId::Irrigation
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let moisture = request.soil_moisture();
        let (low, high) = moisture_band(&request.profile.crop_key());

        let task = match moisture {
            None => "Check soil moisture sensor and irrigate if topsoil is dry to touch".to_string(),
            Some(m) if m < low => format!("Irrigate today to raise soil moisture above {}%", low),
            Some(m) if m > high => "Skip irrigation; soil moisture is sufficient".to_string(),
            Some(_) => "Monitor; schedule light irrigation within 2-3 days".to_string(),
        };

        let explanation = match moisture {
            Some(m) => format!(
                "Soil moisture is {:.1}% against a target band of {}-{}% for {}.",
                m, low, high, request.profile.crop
            ),
            None => "No soil moisture reading was supplied.".to_string(),
        };

        Ok(
            RawRecommendation::new(
                AgentId::Irrigation,
                PRIORITY,
                CONFIDENCE,
                "Maintain optimal soil moisture for crop growth.",
            )
            .with_explanation(explanation)
            .with_sources(["Soil moisture sensor"])
            .with_tasks([task])
            .with_details(&IrrigationDetails {
                soil_moisture_pct: moisture,
                low_threshold: Some(low),
                high_threshold: Some(high),
                ..Default::default()
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorData;

    fn with_moisture(crop: &str, moisture: Option<f64>) -> AdvisoryRequest {
        let mut request = AdvisoryRequest::new("F001", crop);
        request.sensors = Some(SensorData {
            soil_moisture_pct: moisture,
            ..Default::default()
        });
        request
    }

    #[tokio::test]
    async fn test_dry_soil_triggers_irrigation() {
        let raw = IrrigationAgent
            .invoke(&with_moisture("wheat", Some(15.0)))
            .await
            .unwrap();
        assert_eq!(raw.priority_value(), Some(8.0));
        assert_eq!(raw.tasks, vec!["Irrigate today to raise soil moisture above 22%"]);
        assert_eq!(raw.details["low_threshold"], 22.0);
    }

    #[tokio::test]
    async fn test_wet_soil_skips_irrigation() {
        let raw = IrrigationAgent
            .invoke(&with_moisture("maize", Some(40.0)))
            .await
            .unwrap();
        assert!(raw.tasks[0].starts_with("Skip irrigation"));
        assert_eq!(raw.details["high_threshold"], 32.0);
    }

    #[tokio::test]
    async fn test_in_band_schedules_light_irrigation() {
        let raw = IrrigationAgent
            .invoke(&with_moisture("rice", Some(30.0)))
            .await
            .unwrap();
        assert!(raw.tasks[0].starts_with("Monitor"));
    }

    #[tokio::test]
    async fn test_missing_sensor_asks_for_manual_check() {
        let raw = IrrigationAgent
            .invoke(&AdvisoryRequest::new("F001", "wheat"))
            .await
            .unwrap();
        assert!(raw.tasks[0].contains("Check soil moisture sensor"));
        assert!(raw.details["soil_moisture_pct"].is_null());
    }
}
