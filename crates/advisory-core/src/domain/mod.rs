//! Domain model for advisory aggregation.
//!
//! All entities are created fresh per request and dropped once the response
//! is returned; nothing here is shared across requests.

pub mod agent_id;
pub mod details;
pub mod error;
pub mod recommendation;
pub mod request;
pub mod response;

pub use agent_id::AgentId;
pub use details::{
    AgentDetails, FertilizerDetails, FinancePolicyDetails, HazardAssessment, IrrigationDetails,
    LoanMatch, MarketDetails, NpkTarget, PestDetails, SchemeMatch, SeedCropDetails, VarietyScore,
    WeatherRiskDetails,
};
pub use error::{AdvisoryError, RequestError, Result};
pub use recommendation::{
    CostEstimate, RawRecommendation, Recommendation, RiskLevel, PRIORITY_MAX, PRIORITY_MIN,
};
pub use request::{AdvisoryRequest, FarmerProfile, SensorData, WeatherSnapshot, HORIZON_RANGE};
pub use response::{AdvisoryResponse, RiskAssessment};
