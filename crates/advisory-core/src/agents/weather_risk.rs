//! Extreme-weather scoring and mitigation planning.
//!
//! Five hazards are scored from the forecast snapshot. Each hazard collects
//! points (tenths of a risk score) from independent factors and maps them to
//! a level through its own thresholds. Without a forecast the agent falls back
//! to a sensor-only assessment and reports lower confidence.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{AdvisoryAgent, AgentResult};
use crate::domain::{
    AdvisoryRequest, AgentId, CostEstimate, HazardAssessment, RawRecommendation, RiskLevel,
    WeatherRiskDetails, WeatherSnapshot,
};

const MAX_TASKS: usize = 8;
const BASE_COST_INR: f64 = 1000.0;

/// Task emitted ahead of the mitigation list whenever flood risk is elevated.
pub const WITHHOLD_IRRIGATION_TASK: &str =
    "Withhold irrigation; heavy rain expected in the next few days";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Hazard {
    Drought,
    Flood,
    HeatWave,
    ColdWave,
    Cyclone,
}

impl Hazard {
    const ALL: [Hazard; 5] = [
        Hazard::Drought,
        Hazard::Flood,
        Hazard::HeatWave,
        Hazard::ColdWave,
        Hazard::Cyclone,
    ];

    fn key(self) -> &'static str {
        match self {
            Hazard::Drought => "drought",
            Hazard::Flood => "flood",
            Hazard::HeatWave => "heat_wave",
            Hazard::ColdWave => "cold_wave",
            Hazard::Cyclone => "cyclone",
        }
    }

    /// `(high, medium)`: strictly more points than the bound reaches that level.
    fn bounds(self) -> (u32, u32) {
        match self {
            Hazard::Drought => (7, 4),
            Hazard::Flood | Hazard::HeatWave | Hazard::ColdWave => (6, 3),
            Hazard::Cyclone => (5, 2),
        }
    }

    fn mitigations(self) -> [&'static str; 2] {
        match self {
            Hazard::Drought => [
                "Implement mulching to conserve soil moisture",
                "Use drought-resistant crop varieties",
            ],
            Hazard::Flood => [
                "Ensure proper drainage system in fields",
                "Elevate seed storage areas",
            ],
            Hazard::HeatWave => [
                "Increase irrigation frequency during heat waves",
                "Use shade nets for sensitive crops",
            ],
            Hazard::ColdWave => [
                "Use row covers or plastic tunnels",
                "Apply organic mulch to retain soil heat",
            ],
            Hazard::Cyclone => [
                "Harvest mature crops immediately",
                "Secure farm equipment and structures",
            ],
        }
    }
}

#[derive(Debug, Default)]
struct Score {
    points: u32,
    factors: Vec<String>,
}

impl Score {
    fn add(&mut self, hit: bool, points: u32, factor: &str) {
        if hit {
            self.points += points;
            self.factors.push(factor.to_string());
        }
    }

    fn into_assessment(self, hazard: Hazard) -> HazardAssessment {
        let (high, medium) = hazard.bounds();
        let risk_level = if self.points > high {
            RiskLevel::High
        } else if self.points > medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        let risk_score = f64::from(self.points) / 10.0;
        HazardAssessment {
            risk_level,
            risk_score,
            risk_factors: self.factors,
            probability: (risk_score * 100.0).min(95.0),
        }
    }
}

fn assess_forecast(hazard: Hazard, w: &WeatherSnapshot) -> HazardAssessment {
    let mut s = Score::default();
    match hazard {
        Hazard::Drought => {
            s.add(w.temperature_c > 35.0, 3, "High temperature");
            s.add(w.precipitation_mm < 5.0, 4, "Low precipitation");
            s.add(w.humidity_pct < 40.0, 2, "Low humidity");
            s.add(w.wind_speed_kmh > 20.0, 1, "High wind speed");
        }
        Hazard::Flood => {
            s.add(w.precipitation_mm > 50.0, 6, "Heavy precipitation");
            s.add(w.humidity_pct > 80.0, 2, "High humidity");
            s.add(w.wind_speed_kmh > 30.0, 2, "Strong winds");
        }
        Hazard::HeatWave => {
            s.add(w.temperature_c > 40.0, 7, "Extreme temperature");
            s.add(w.humidity_pct > 70.0, 2, "High humidity");
            s.add(
                w.solar_radiation_mj.unwrap_or_default() > 25.0,
                1,
                "High solar radiation",
            );
        }
        Hazard::ColdWave => {
            s.add(w.temperature_c < 5.0, 7, "Low temperature");
            s.add(w.wind_speed_kmh > 15.0, 2, "Cold winds");
            s.add(w.humidity_pct > 80.0, 1, "High humidity");
        }
        Hazard::Cyclone => {
            s.add(w.wind_speed_kmh > 50.0, 6, "High wind speed");
            s.add(w.precipitation_mm > 100.0, 4, "Heavy precipitation");
        }
    }
    s.into_assessment(hazard)
}

fn assess_sensors(hazard: Hazard, request: &AdvisoryRequest) -> HazardAssessment {
    let moisture = request.soil_moisture();
    let soil_temp = request.soil_temperature();
    let rain = request.sensors.as_ref().and_then(|s| s.last_rain_mm_24h);

    let mut s = Score::default();
    match hazard {
        Hazard::Drought => {
            s.add(moisture.is_some_and(|m| m < 15.0), 5, "Very dry soil");
            s.add(soil_temp.is_some_and(|t| t > 35.0), 3, "Hot soil");
        }
        Hazard::Flood => {
            s.add(rain.is_some_and(|r| r > 50.0), 6, "Heavy rain in last 24h");
            s.add(moisture.is_some_and(|m| m > 45.0), 2, "Saturated soil");
        }
        Hazard::HeatWave => {
            s.add(soil_temp.is_some_and(|t| t > 40.0), 7, "Extreme soil temperature");
        }
        Hazard::ColdWave => {
            s.add(soil_temp.is_some_and(|t| t < 5.0), 7, "Low soil temperature");
        }
        // Not observable from field sensors.
        Hazard::Cyclone => {}
    }
    s.into_assessment(hazard)
}

fn overall_risk(hazards: &BTreeMap<Hazard, HazardAssessment>) -> RiskLevel {
    let count = |level| hazards.values().filter(|h| h.risk_level == level).count();
    if count(RiskLevel::High) > 0 {
        RiskLevel::High
    } else if count(RiskLevel::Medium) > 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn priority_for(risk: RiskLevel) -> i64 {
    match risk {
        RiskLevel::High | RiskLevel::Critical => 10,
        RiskLevel::Medium => 8,
        RiskLevel::Low => 6,
    }
}

fn mitigation_tasks(
    hazards: &BTreeMap<Hazard, HazardAssessment>,
    request: &AdvisoryRequest,
) -> Vec<String> {
    let mut tasks = Vec::new();
    let elevated = |hazard: Hazard| {
        hazards
            .get(&hazard)
            .is_some_and(|h| h.risk_level >= RiskLevel::Medium)
    };

    if elevated(Hazard::Flood) {
        tasks.push(WITHHOLD_IRRIGATION_TASK.to_string());
    }
    for hazard in Hazard::ALL {
        if elevated(hazard) {
            tasks.extend(hazard.mitigations().iter().map(|t| t.to_string()));
        }
    }
    tasks.push("Monitor weather alerts and forecasts daily".to_string());
    tasks.push("Keep emergency contact numbers handy".to_string());
    if matches!(
        request.profile.stage_key().as_str(),
        "flowering" | "grain_filling"
    ) {
        tasks.push("Protect flowering crops from extreme weather".to_string());
    }
    tasks.truncate(MAX_TASKS);
    tasks
}

fn explanation(
    hazards: &BTreeMap<Hazard, HazardAssessment>,
    weather: Option<&WeatherSnapshot>,
) -> String {
    let high: Vec<String> = hazards
        .iter()
        .filter(|(_, h)| h.risk_level >= RiskLevel::High)
        .map(|(hazard, _)| hazard.key().replace('_', " "))
        .collect();

    let conditions = match weather {
        Some(w) => format!(
            "Temperature: {:.1}°C, Precipitation: {:.1}mm, Wind: {:.1} km/h.",
            w.temperature_c, w.precipitation_mm, w.wind_speed_kmh
        ),
        None => "No forecast available; assessed from field sensors only.".to_string(),
    };

    if high.is_empty() {
        format!(
            "Weather conditions are generally favorable. {} Continue monitoring for any changes.",
            conditions
        )
    } else {
        format!(
            "High risk of {} detected. {} Immediate mitigation measures recommended.",
            high.join(", "),
            conditions
        )
    }
}

fn mitigation_cost(risk: RiskLevel) -> CostEstimate {
    let multiplier = match risk {
        RiskLevel::High | RiskLevel::Critical => 3.0,
        RiskLevel::Medium => 1.5,
        RiskLevel::Low => 1.0,
    };
    let total = BASE_COST_INR * multiplier;
    let mut extra = BTreeMap::new();
    extra.insert(
        "cost_breakdown".to_string(),
        serde_json::json!({
            "protective_measures": total * 0.6,
            "monitoring_systems": total * 0.2,
            "insurance_premium": total * 0.2,
        }),
    );
    CostEstimate {
        estimated_cost_inr: Some(total),
        cost_unit: Some("INR per hectare".to_string()),
        extra,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherRiskAgent;

#[async_trait]
impl AdvisoryAgent for WeatherRiskAgent {
    fn id(&self) -> AgentId {
        AgentId::WeatherRisk
    }

    async fn invoke(&self, request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        let weather = request.weather.as_ref();
        let hazards: BTreeMap<Hazard, HazardAssessment> = Hazard::ALL
            .into_iter()
            .map(|hazard| {
                let assessment = match weather {
                    Some(w) => assess_forecast(hazard, w),
                    None => assess_sensors(hazard, request),
                };
                (hazard, assessment)
            })
            .collect();

        let risk = overall_risk(&hazards);
        let base_confidence = if weather.is_some() { 0.9 } else { 0.6 };
        let confidence = if risk == RiskLevel::Low {
            base_confidence
        } else {
            base_confidence + 0.1
        };
        let risk_score = hazards.values().map(|h| h.risk_score).sum::<f64>().min(1.0);

        let mut sources = vec!["Historical Weather Database"];
        if weather.is_some() {
            sources.insert(0, "Weather forecast");
        } else {
            sources.insert(0, "Field sensors");
        }

        let details = WeatherRiskDetails {
            hazards: hazards
                .iter()
                .map(|(hazard, h)| (hazard.key().to_string(), h.clone()))
                .collect(),
            risk_score: Some(risk_score),
            forecast_available: weather.is_some(),
            ..Default::default()
        };

        Ok(RawRecommendation::new(
            AgentId::WeatherRisk,
            priority_for(risk),
            confidence,
            format!(
                "Weather risk assessment and mitigation strategies for {}",
                request.profile.crop
            ),
        )
        .with_explanation(explanation(&hazards, weather))
        .with_sources(sources)
        .with_tasks(mitigation_tasks(&hazards, request))
        .with_risk(risk)
        .with_impact("positive")
        .with_cost(&mitigation_cost(risk))
        .with_details(&details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SensorData;

    fn forecast(temperature: f64, precipitation: f64, humidity: f64, wind: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: temperature,
            precipitation_mm: precipitation,
            humidity_pct: humidity,
            wind_speed_kmh: wind,
            solar_radiation_mj: None,
        }
    }

    fn request_with(weather: Option<WeatherSnapshot>) -> AdvisoryRequest {
        let mut request = AdvisoryRequest::new("F001", "wheat");
        request.weather = weather;
        request
    }

    #[tokio::test]
    async fn test_heavy_rain_is_high_risk_and_withholds_irrigation() {
        let raw = WeatherRiskAgent
            .invoke(&request_with(Some(forecast(26.0, 80.0, 85.0, 10.0))))
            .await
            .unwrap();
        assert_eq!(raw.risk_label(), Some("high"));
        assert_eq!(raw.priority_value(), Some(10.0));
        assert_eq!(raw.tasks[0], WITHHOLD_IRRIGATION_TASK);
        assert!(raw.tasks.iter().any(|t| t.contains("drainage")));
        assert_eq!(raw.details["hazards"]["flood"]["risk_level"], "high");
        assert_eq!(raw.details["forecast_available"], true);
        assert!((raw.confidence_value().unwrap() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_benign_forecast_is_low_risk() {
        let raw = WeatherRiskAgent
            .invoke(&request_with(Some(forecast(25.0, 10.0, 60.0, 10.0))))
            .await
            .unwrap();
        assert_eq!(raw.risk_label(), Some("low"));
        assert_eq!(raw.priority_value(), Some(6.0));
        assert_eq!(
            raw.tasks,
            vec![
                "Monitor weather alerts and forecasts daily",
                "Keep emergency contact numbers handy"
            ]
        );
        assert!(raw.explanation.starts_with("Weather conditions are generally favorable"));
    }

    #[tokio::test]
    async fn test_single_medium_hazard_keeps_overall_low() {
        // Drought: low precipitation (4) + low humidity (2) = 6 points, medium.
        let raw = WeatherRiskAgent
            .invoke(&request_with(Some(forecast(30.0, 1.0, 30.0, 5.0))))
            .await
            .unwrap();
        assert_eq!(raw.details["hazards"]["drought"]["risk_level"], "medium");
        assert_eq!(raw.risk_label(), Some("low"));
        assert!(raw.tasks.iter().any(|t| t.contains("mulching")));
    }

    #[tokio::test]
    async fn test_tasks_are_capped() {
        // Hot, dry, windy and wet enough to light up several hazards at once.
        let mut request = request_with(Some(forecast(45.0, 120.0, 90.0, 60.0)));
        request.profile.growth_stage = Some("flowering".to_string());
        let raw = WeatherRiskAgent.invoke(&request).await.unwrap();
        assert_eq!(raw.tasks.len(), MAX_TASKS);
    }

    #[tokio::test]
    async fn test_without_forecast_uses_sensors_with_lower_confidence() {
        let mut request = request_with(None);
        request.sensors = Some(SensorData {
            soil_moisture_pct: Some(50.0),
            soil_temperature_c: Some(20.0),
            last_rain_mm_24h: Some(70.0),
        });
        let raw = WeatherRiskAgent.invoke(&request).await.unwrap();
        assert_eq!(raw.details["forecast_available"], false);
        assert_eq!(raw.details["hazards"]["flood"]["risk_level"], "high");
        assert_eq!(raw.tasks[0], WITHHOLD_IRRIGATION_TASK);
        assert!(raw.confidence_value().unwrap() < 0.9);
    }

    #[test]
    fn test_cost_scales_with_risk() {
        assert_eq!(mitigation_cost(RiskLevel::High).estimated_cost_inr, Some(3000.0));
        assert_eq!(mitigation_cost(RiskLevel::Low).estimated_cost_inr, Some(1000.0));
    }
}
