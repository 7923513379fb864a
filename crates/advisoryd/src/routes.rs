use advisory_core::obs::AdvisorySpan;
use advisory_core::{AdvisoryRequest, AdvisoryResponse, AgentId, VERSION};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/advisory", post(advise))
        .route("/api/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agents: Vec<AgentId>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        agents: state.aggregator.agents().ids(),
    })
}

pub async fn advise(
    State(state): State<AppState>,
    payload: Result<Json<AdvisoryRequest>, JsonRejection>,
) -> Result<Json<AdvisoryResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let Json(request) = payload.map_err(|e| AppError::from_rejection(e, request_id))?;

    let span = AdvisorySpan::with_id(request_id, &request.profile.farmer_id);
    let outcome = state
        .aggregator
        .advise_in_span(request, state.shutdown.child_token(), span)
        .await
        .map_err(|e| AppError::from_advisory(e, request_id))?;

    Ok(Json(outcome.response))
}
