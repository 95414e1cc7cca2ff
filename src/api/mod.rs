//! HTTP API module for the Attendance Engine.
//!
//! This module provides the REST endpoints for check-in/check-out, daily
//! record lookup, and supervisor corrections.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AttendanceRequest, CorrectionRequest, RecordQuery};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
