//! Farm advisory aggregation engine.
//!
//! Merges per-domain agent recommendations (irrigation, fertilizer, pest,
//! market, weather risk, seed/crop, finance policy) into one prioritized
//! action plan with rolled-up confidence and risk.
//!
//! Pipeline: [`Aggregator`] fans out to agents → [`validator`] →
//! [`conflict`] resolution → [`rollup`] → [`plan`].

pub mod agents;
pub mod aggregator;
pub mod conflict;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod plan;
pub mod rollup;
pub mod telemetry;
pub mod validator;

pub use agents::{AdvisoryAgent, AgentError, AgentRegistry, RemoteAgent, RemoteEndpoint};
pub use aggregator::{
    AdvisoryOutcome, AgentOutcome, AggregationReport, Aggregator, AggregatorConfig,
    DEFAULT_DEADLINE,
};
pub use conflict::{
    resolve_conflicts, ConflictResolution, ConflictRule, ConflictRuleTable, ResolutionAction,
    RuleError, SideMatcher,
};
pub use domain::{
    AdvisoryError, AdvisoryRequest, AdvisoryResponse, AgentDetails, AgentId, FarmerProfile,
    RawRecommendation, Recommendation, RequestError, Result, RiskAssessment, RiskLevel,
    SensorData, WeatherSnapshot,
};
pub use plan::build_unified_plan;
pub use rollup::{rollup_confidence, rollup_risk};
pub use validator::{validate_batch, validate_recommendation, ClampEvent, RejectionReason};

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
