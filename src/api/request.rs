//! Request types for the Attendance Engine API.
//!
//! Every field is optional at the serde level so that an absent field is
//! reported as `MISSING_FIELD` naming that field, instead of a generic
//! deserialization error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::{AttendanceAction, CheckRequest, SupervisorCorrection};
use crate::error::{EngineError, EngineResult};
use crate::models::GpsReading;

/// Request body for `POST /attendance`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceRequest {
    /// The employee checking in or out.
    pub employee_id: Option<String>,
    /// `check-in` or `check-out`.
    pub action: Option<String>,
    /// Device latitude in degrees.
    pub latitude: Option<f64>,
    /// Device longitude in degrees.
    pub longitude: Option<f64>,
    /// Reported accuracy in meters.
    pub accuracy: Option<f64>,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// When the device captured the fix. Defaults to the server time.
    pub captured_at: Option<DateTime<Utc>>,
}

impl AttendanceRequest {
    /// Converts the body into a domain request, checking required fields.
    pub fn into_check_request(self, now: DateTime<Utc>) -> EngineResult<CheckRequest> {
        let employee_id = required(self.employee_id, "employee_id")?;
        let action: AttendanceAction = required(self.action, "action")?.parse()?;
        let latitude = required(self.latitude, "latitude")?;
        let longitude = required(self.longitude, "longitude")?;

        Ok(CheckRequest {
            employee_id,
            action,
            reading: GpsReading::new(
                latitude,
                longitude,
                self.accuracy,
                self.captured_at.unwrap_or(now),
            ),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Request body for `PUT /attendance/corrections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionRequest {
    /// The supervisor applying the correction.
    pub actor_id: Option<String>,
    /// The employee whose record is corrected.
    pub employee_id: Option<String>,
    /// The business day of the record.
    pub date: Option<NaiveDate>,
    /// New check-in time.
    pub check_in_time: Option<DateTime<Utc>>,
    /// New check-out time.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Mandatory justification.
    pub reason: Option<String>,
}

impl CorrectionRequest {
    /// Converts the body into a domain correction, checking required fields.
    pub fn into_correction(self, now: DateTime<Utc>) -> EngineResult<SupervisorCorrection> {
        Ok(SupervisorCorrection {
            actor_id: required(self.actor_id, "actor_id")?,
            employee_id: required(self.employee_id, "employee_id")?,
            date: required(self.date, "date")?,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            reason: required(self.reason, "reason")?,
            now,
        })
    }
}

/// Query parameters for `GET /attendance/{employee_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordQuery {
    /// The business day. Defaults to today.
    pub date: Option<NaiveDate>,
}

fn required<T>(value: Option<T>, field: &str) -> EngineResult<T> {
    value.ok_or_else(|| EngineError::MissingField {
        field: field.to_string(),
    })
}
