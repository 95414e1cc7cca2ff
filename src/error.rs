//! Error types for the Attendance Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while validating and recording
//! check-in/check-out events.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Attendance Engine.
///
/// Every variant except [`EngineError::Transient`] is a client-visible,
/// non-retryable condition: it requires corrected input or human
/// intervention.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::MissingField {
///     field: "employee_id".to_string(),
/// };
/// assert_eq!(error.to_string(), "Missing required field: employee_id");
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is semantically invalid.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the problem.
        message: String,
    },

    /// A required request field was absent.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A request field was present but not acceptable.
    #[error("Invalid field '{field}': {message}")]
    InvalidField {
        /// The name of the invalid field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The employee does not exist in the directory.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee id.
        employee_id: String,
    },

    /// The employee has no eligible work site.
    #[error("No work location assigned to employee {employee_id}")]
    NoWorkLocationAssigned {
        /// The employee without a site.
        employee_id: String,
    },

    /// The reading is outside the radius of the nearest assigned site.
    #[error("Geofence violation: {message}")]
    GeofenceViolation {
        /// Human-readable description including the distance and radius.
        message: String,
        /// Distance to the nearest site in meters, when one was measured.
        distance_meters: Option<f64>,
        /// Name of the nearest site, when one was measured.
        site_name: Option<String>,
    },

    /// The GPS reading failed the anti-spoofing pass.
    #[error(
        "GPS integrity violation (risk score {risk_score}): {}",
        integrity_summary(.issues, .recommendations)
    )]
    GpsIntegrityViolation {
        /// The aggregated risk score.
        risk_score: u8,
        /// The issues that contributed to the score, in check order.
        issues: Vec<String>,
        /// Suggested next actions for the employee.
        recommendations: Vec<String>,
    },

    /// A check-in was already accepted for this employee and day.
    #[error("Employee {employee_id} already checked in on {date}")]
    AlreadyCheckedIn {
        /// The employee id.
        employee_id: String,
        /// The business day.
        date: NaiveDate,
    },

    /// A check-out was already accepted for this employee and day.
    #[error("Employee {employee_id} already checked out on {date}")]
    AlreadyCheckedOut {
        /// The employee id.
        employee_id: String,
        /// The business day.
        date: NaiveDate,
    },

    /// Check-out requested without a prior check-in.
    #[error("No check-in found for employee {employee_id} on {date}")]
    NoCheckInFound {
        /// The employee id.
        employee_id: String,
        /// The business day.
        date: NaiveDate,
    },

    /// A conditional write lost a race against a concurrent request.
    #[error("Concurrent update to attendance record {employee_id} on {date}")]
    StorageConflict {
        /// The employee id.
        employee_id: String,
        /// The business day.
        date: NaiveDate,
    },

    /// Check-out or corrected time precedes the check-in time.
    #[error("Invalid time range: {message}")]
    InvalidTimeRange {
        /// A description of the inconsistency.
        message: String,
    },

    /// The actor is not allowed to perform the operation.
    #[error("Actor {actor_id} is not authorized: {message}")]
    Unauthorized {
        /// The rejected actor.
        actor_id: String,
        /// Why the actor was rejected.
        message: String,
    },

    /// Timeout or storage outage. The only retryable category.
    #[error("Transient failure: {message}")]
    Transient {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Returns true if the operation may be retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Transient { .. })
    }

    /// Stable machine-readable code, shared by API responses and audit metadata.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidConfig { .. } => "CONFIG_ERROR",
            EngineError::MissingField { .. } => "MISSING_FIELD",
            EngineError::InvalidField { .. } => "INVALID_FIELD",
            EngineError::EmployeeNotFound { .. } => "EMPLOYEE_NOT_FOUND",
            EngineError::NoWorkLocationAssigned { .. } => "NO_WORK_LOCATION",
            EngineError::GeofenceViolation { .. } => "GEOFENCE_VIOLATION",
            EngineError::GpsIntegrityViolation { .. } => "GPS_INTEGRITY_VIOLATION",
            EngineError::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
            EngineError::AlreadyCheckedOut { .. } => "ALREADY_CHECKED_OUT",
            EngineError::NoCheckInFound { .. } => "NO_CHECK_IN_FOUND",
            EngineError::StorageConflict { .. } => "STORAGE_CONFLICT",
            EngineError::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            EngineError::Unauthorized { .. } => "UNAUTHORIZED",
            EngineError::Transient { .. } => "TRANSIENT",
        }
    }

    /// Returns true for the state-machine precondition failures.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyCheckedIn { .. }
                | EngineError::AlreadyCheckedOut { .. }
                | EngineError::NoCheckInFound { .. }
                | EngineError::StorageConflict { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

fn integrity_summary(issues: &[String], recommendations: &[String]) -> String {
    let issues = issues.join("; ");
    if recommendations.is_empty() {
        issues
    } else {
        format!("{}; try: {}", issues, recommendations.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/policy.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/policy.yaml"
        );
    }

    #[test]
    fn test_missing_field_displays_field() {
        let error = EngineError::MissingField {
            field: "latitude".to_string(),
        };
        assert_eq!(error.to_string(), "Missing required field: latitude");
    }

    #[test]
    fn test_already_checked_in_displays_employee_and_date() {
        let error = EngineError::AlreadyCheckedIn {
            employee_id: "emp_001".to_string(),
            date: day(),
        };
        assert_eq!(
            error.to_string(),
            "Employee emp_001 already checked in on 2026-01-15"
        );
    }

    #[test]
    fn test_gps_integrity_violation_joins_issues() {
        let error = EngineError::GpsIntegrityViolation {
            risk_score: 90,
            issues: vec![
                "coordinates at (0, 0)".to_string(),
                "accuracy not reported".to_string(),
            ],
            recommendations: vec![],
        };
        assert_eq!(
            error.to_string(),
            "GPS integrity violation (risk score 90): coordinates at (0, 0); accuracy not reported"
        );
    }

    #[test]
    fn test_gps_integrity_violation_lists_recommendations() {
        let error = EngineError::GpsIntegrityViolation {
            risk_score: 75,
            issues: vec!["reading is 600s old".to_string()],
            recommendations: vec![
                "Move to an open area and retry".to_string(),
                "Sync the device clock".to_string(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "GPS integrity violation (risk score 75): reading is 600s old; \
             try: Move to an open area and retry; Sync the device clock"
        );
    }

    #[test]
    fn test_only_transient_is_retryable() {
        let transient = EngineError::Transient {
            message: "deadline exceeded".to_string(),
        };
        let conflict = EngineError::StorageConflict {
            employee_id: "emp_001".to_string(),
            date: day(),
        };
        assert!(transient.is_retryable());
        assert!(!conflict.is_retryable());
        assert!(conflict.is_state_conflict());
        assert!(!transient.is_state_conflict());
    }

    #[test]
    fn test_codes() {
        let no_sites = EngineError::NoWorkLocationAssigned {
            employee_id: "emp_004".to_string(),
        };
        let parse = EngineError::ConfigParseError {
            path: "policy.yaml".to_string(),
            message: "bad indent".to_string(),
        };
        assert_eq!(no_sites.code(), "NO_WORK_LOCATION");
        assert_eq!(parse.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_missing_field() -> EngineResult<()> {
            Err(EngineError::MissingField {
                field: "action".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_missing_field()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
