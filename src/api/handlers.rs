//! HTTP request handlers for the Attendance Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::{AttendanceRequest, CorrectionRequest, RecordQuery};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/attendance", post(attendance_handler))
        .route("/attendance/corrections", put(correction_handler))
        .route("/attendance/:employee_id", get(record_handler))
        .with_state(state)
}

/// Handler for GET /health.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for POST /attendance.
///
/// Validates the reading and applies a check-in or check-out.
async fn attendance_handler(
    State(state): State<AppState>,
    payload: Result<Json<AttendanceRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing attendance request");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return json_rejection_response(rejection, correlation_id),
    };

    let now = Utc::now();
    let request = match body.into_check_request(now) {
        Ok(request) => request,
        Err(err) => return error_response(err, correlation_id),
    };
    let employee_id = request.employee_id.clone();
    let action = request.action;

    let start_time = Instant::now();
    match state.service().submit(request, now).await {
        Ok(decision) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %employee_id,
                action = %action,
                status = %decision.record.status,
                risk_score = decision.gps_integrity.risk_score,
                duration_us = start_time.elapsed().as_micros() as u64,
                "Attendance request accepted"
            );
            json_response(StatusCode::OK, &decision)
        }
        Err(err) => error_response(err, correlation_id),
    }
}

/// Handler for GET /attendance/{employee_id}?date=YYYY-MM-DD.
async fn record_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    query: Result<Query<RecordQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return error_response(
                EngineError::InvalidField {
                    field: "date".to_string(),
                    message: rejection.body_text(),
                },
                correlation_id,
            );
        }
    };

    match state
        .service()
        .daily_record(&employee_id, query.date, Utc::now())
        .await
    {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(err) => error_response(err, correlation_id),
    }
}

/// Handler for PUT /attendance/corrections.
async fn correction_handler(
    State(state): State<AppState>,
    payload: Result<Json<CorrectionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing correction request");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return json_rejection_response(rejection, correlation_id),
    };

    let correction = match body.into_correction(Utc::now()) {
        Ok(correction) => correction,
        Err(err) => return error_response(err, correlation_id),
    };

    match state.service().correct(correction).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(err) => error_response(err, correlation_id),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

fn error_response(err: EngineError, correlation_id: Uuid) -> Response {
    warn!(
        correlation_id = %correlation_id,
        code = err.code(),
        error = %err,
        "Request rejected"
    );
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, &api_error.error)
}

fn json_rejection_response(rejection: JsonRejection, correlation_id: Uuid) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            ApiError::new("INVALID_FIELD", body_text)
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, &error)
}
