use std::sync::Arc;

use advisory_core::agents::AgentResult;
use advisory_core::{
    AdvisoryAgent, AdvisoryRequest, AgentError, AgentId, AgentRegistry, Aggregator,
    AggregatorConfig, ConflictRuleTable, RawRecommendation,
};
use advisoryd::{router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct BrokenAgent(AgentId);

#[async_trait]
impl AdvisoryAgent for BrokenAgent {
    fn id(&self) -> AgentId {
        self.0
    }

    async fn invoke(&self, _request: &AdvisoryRequest) -> AgentResult<RawRecommendation> {
        Err(AgentError::internal(self.0, "model offline"))
    }
}

fn app(aggregator: Aggregator) -> Router {
    router(AppState::new(aggregator, CancellationToken::new()))
}

fn sample_request() -> Value {
    json!({
        "profile": {
            "farmer_id": "F-101",
            "location_lat": 30.9,
            "location_lon": 75.8,
            "farm_size_hectares": 1.5,
            "crop": "wheat",
            "growth_stage": "tillering",
            "soil_type": "loam"
        },
        "sensors": { "soil_moisture_pct": 18.0, "soil_temperature_c": 21.0 },
        "horizon_days": 7
    })
}

async fn post_advisory(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/advisory")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_lists_registered_agents() {
    let response = app(Aggregator::builtin())
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["agents"].as_array().unwrap().len(), 7);
    assert_eq!(body["agents"][0], "fertilizer");
}

#[tokio::test]
async fn test_advisory_returns_unified_plan() {
    let (status, body) = post_advisory(app(Aggregator::builtin()), sample_request().to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer_id"], "F-101");
    assert_eq!(body["crop"], "wheat");
    assert!(!body["unified_plan"].as_array().unwrap().is_empty());
    assert!(body["recommendations"].as_array().unwrap().len() <= 7);

    let confidence = body["confidence_overall"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(body["risk_assessment"]["overall_risk_level"].is_string());
}

#[tokio::test]
async fn test_invalid_horizon_is_bad_request() {
    let mut request = sample_request();
    request["horizon_days"] = json!(45);

    let (status, body) = post_advisory(app(Aggregator::builtin()), request.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["field"], "horizon_days");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (status, body) = post_advisory(app(Aggregator::builtin()), "{\"profile\":".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_all_agents_failing_is_server_error() {
    let registry = AgentRegistry::empty()
        .with_agent(Arc::new(BrokenAgent(AgentId::Irrigation)))
        .with_agent(Arc::new(BrokenAgent(AgentId::Market)));
    let aggregator = Aggregator::new(
        registry,
        ConflictRuleTable::standard(),
        AggregatorConfig::default(),
    );

    let (status, body) = post_advisory(app(aggregator), sample_request().to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "aggregation_failed");
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_requests() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let app = router(AppState::new(Aggregator::builtin(), shutdown));

    let (status, body) = post_advisory(app, sample_request().to_string()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "unavailable");
}
