//! Response types for the Attendance Engine API.
//!
//! This module defines the error response structures and the mapping from
//! [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Whether the client may retry the same request.
    #[serde(default)]
    pub retryable: bool,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable: false,
            details: None,
        }
    }

    /// Attaches structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::MissingField { .. }
            | EngineError::InvalidField { .. }
            | EngineError::InvalidTimeRange { .. } => StatusCode::BAD_REQUEST,
            EngineError::EmployeeNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::NoWorkLocationAssigned { .. }
            | EngineError::GeofenceViolation { .. }
            | EngineError::GpsIntegrityViolation { .. }
            | EngineError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            EngineError::AlreadyCheckedIn { .. }
            | EngineError::AlreadyCheckedOut { .. }
            | EngineError::NoCheckInFound { .. }
            | EngineError::StorageConflict { .. } => StatusCode::CONFLICT,
            EngineError::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        let details = match &error {
            EngineError::MissingField { field } | EngineError::InvalidField { field, .. } => {
                Some(json!({ "field": field }))
            }
            EngineError::GeofenceViolation {
                distance_meters,
                site_name,
                ..
            } => Some(json!({
                "distance_meters": distance_meters,
                "site_name": site_name,
            })),
            EngineError::GpsIntegrityViolation {
                risk_score,
                issues,
                recommendations,
            } => Some(json!({
                "risk_score": risk_score,
                "issues": issues,
                "recommendations": recommendations,
            })),
            _ => None,
        };

        // configuration problems are server-side; keep paths out of the body
        let message = match &error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => "Configuration error".to_string(),
            other => other.to_string(),
        };

        ApiErrorResponse {
            status,
            error: ApiError {
                code: error.code().to_string(),
                message,
                retryable: error.is_retryable(),
                details,
            },
        }
    }
}
