//! Advisory request: farmer profile, sensor snapshot and horizon.
//!
//! A request is an immutable snapshot for the duration of one aggregation;
//! every agent observes the same value.

use serde::{Deserialize, Serialize};

use super::error::RequestError;

/// Inclusive bounds for `horizon_days`.
pub const HORIZON_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

/// Farmer and field description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmerProfile {
    pub farmer_id: String,
    pub location_lat: f64,
    pub location_lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_size_hectares: Option<f64>,
    /// Primary crop, e.g. `wheat`, `rice`.
    pub crop: String,
    /// Crop growth stage, e.g. `sowing`, `tillering`, `flowering`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farming_practice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

impl FarmerProfile {
    /// Lower-cased crop name, the key used by every crop lookup table.
    pub fn crop_key(&self) -> String {
        self.crop.trim().to_lowercase()
    }

    /// Lower-cased growth stage, empty when unknown.
    pub fn stage_key(&self) -> String {
        self.growth_stage
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }
}

/// Field sensor readings. Every reading is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SensorData {
    /// Volumetric water content, percent.
    #[serde(default)]
    pub soil_moisture_pct: Option<f64>,
    #[serde(default)]
    pub soil_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rain_mm_24h: Option<f64>,
}

/// Short-range weather forecast snapshot for the farm location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_radiation_mj: Option<f64>,
}

fn default_horizon() -> i64 {
    7
}

fn default_language() -> String {
    "en".to_string()
}

/// `POST /api/advisory` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryRequest {
    pub profile: FarmerProfile,
    #[serde(default)]
    pub sensors: Option<SensorData>,
    #[serde(default = "default_horizon")]
    pub horizon_days: i64,
    /// Locale tag. Only affects text rendering upstream of aggregation.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

impl AdvisoryRequest {
    /// Minimal request for `farmer_id` growing `crop`, 7-day horizon.
    pub fn new(farmer_id: impl Into<String>, crop: impl Into<String>) -> Self {
        Self {
            profile: FarmerProfile {
                farmer_id: farmer_id.into(),
                location_lat: 0.0,
                location_lon: 0.0,
                farm_size_hectares: None,
                crop: crop.into(),
                growth_stage: None,
                soil_type: None,
                irrigation_type: None,
                farming_practice: None,
                state: None,
                district: None,
            },
            sensors: None,
            horizon_days: default_horizon(),
            language: default_language(),
            weather: None,
        }
    }

    pub fn soil_moisture(&self) -> Option<f64> {
        self.sensors.as_ref().and_then(|s| s.soil_moisture_pct)
    }

    pub fn soil_temperature(&self) -> Option<f64> {
        self.sensors.as_ref().and_then(|s| s.soil_temperature_c)
    }

    /// Reject malformed requests before any agent is invoked.
    pub fn validate(&self) -> Result<(), RequestError> {
        let profile = &self.profile;

        if profile.farmer_id.trim().is_empty() {
            return Err(RequestError::EmptyField {
                field: "profile.farmer_id",
            });
        }
        if profile.crop.trim().is_empty() {
            return Err(RequestError::EmptyField {
                field: "profile.crop",
            });
        }

        check_range("profile.location_lat", profile.location_lat, -90.0, 90.0)?;
        check_range("profile.location_lon", profile.location_lon, -180.0, 180.0)?;

        if let Some(size) = profile.farm_size_hectares {
            if size.is_nan() || size <= 0.0 {
                return Err(RequestError::NonPositiveFarmSize(size));
            }
        }

        if !HORIZON_RANGE.contains(&self.horizon_days) {
            return Err(RequestError::HorizonOutOfRange(self.horizon_days));
        }

        if let Some(moisture) = self.soil_moisture() {
            check_range("sensors.soil_moisture_pct", moisture, 0.0, 100.0)?;
        }
        if let Some(temperature) = self.soil_temperature() {
            check_range("sensors.soil_temperature_c", temperature, -50.0, 80.0)?;
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), RequestError> {
    // NaN fails both comparisons and is rejected here too.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(RequestError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
