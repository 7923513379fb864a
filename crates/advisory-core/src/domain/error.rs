//! Error taxonomy for advisory aggregation.

/// A malformed advisory request. Raised before any agent is invoked.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("profile field {field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("horizon_days must be within 1..=30, got {0}")]
    HorizonOutOfRange(i64),

    #[error("{field} {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("farm_size_hectares must be positive, got {0}")]
    NonPositiveFarmSize(f64),
}

impl RequestError {
    /// The request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            RequestError::EmptyField { field } => field,
            RequestError::HorizonOutOfRange(_) => "horizon_days",
            RequestError::OutOfRange { field, .. } => field,
            RequestError::NonPositiveFarmSize(_) => "profile.farm_size_hectares",
        }
    }
}

/// Top-level failures of an advisory request.
///
/// Individual agent failures and clamp events never surface here; they are
/// recovered locally and recorded in the aggregation report.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("invalid advisory request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error(
        "no recommendation survived aggregation ({attempted} agents invoked, {failed} failed, {rejected} rejected)"
    )]
    AggregationFailed {
        attempted: usize,
        failed: usize,
        rejected: usize,
    },

    #[error("advisory request was cancelled")]
    Cancelled,
}

/// Result type for advisory operations.
pub type Result<T> = std::result::Result<T, AdvisoryError>;
