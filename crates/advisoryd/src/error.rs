use advisory_core::AdvisoryError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const AGGREGATION_FAILED: &str = "aggregation_failed";
    pub const UNAVAILABLE: &str = "unavailable";
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub request_id: String,
}

#[derive(Debug)]
pub enum AppError {
    /// Malformed request (400)
    Validation {
        message: String,
        field: Option<String>,
        request_id: Uuid,
    },
    /// No recommendation survived (500)
    Aggregation { message: String, request_id: Uuid },
    /// Request abandoned because the service is shutting down (503)
    Unavailable { request_id: Uuid },
}

impl AppError {
    pub fn from_advisory(err: AdvisoryError, request_id: Uuid) -> Self {
        match err {
            AdvisoryError::InvalidRequest(e) => AppError::Validation {
                message: e.to_string(),
                field: Some(e.field().to_string()),
                request_id,
            },
            e @ AdvisoryError::AggregationFailed { .. } => AppError::Aggregation {
                message: e.to_string(),
                request_id,
            },
            AdvisoryError::Cancelled => AppError::Unavailable { request_id },
        }
    }

    pub fn from_rejection(rejection: JsonRejection, request_id: Uuid) -> Self {
        AppError::Validation {
            message: rejection.body_text(),
            field: None,
            request_id,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation {
                message,
                field,
                request_id,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    request_id: request_id.to_string(),
                },
            ),
            AppError::Aggregation {
                message,
                request_id,
            } => {
                tracing::error!(request_id = %request_id, "aggregation failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: codes::AGGREGATION_FAILED.to_string(),
                        message,
                        field: None,
                        request_id: request_id.to_string(),
                    },
                )
            }
            AppError::Unavailable { request_id } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError {
                    error: codes::UNAVAILABLE.to_string(),
                    message: "advisory request was cancelled".to_string(),
                    field: None,
                    request_id: request_id.to_string(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
