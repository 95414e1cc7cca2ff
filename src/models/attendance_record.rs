//! Daily attendance record and related types.
//!
//! A [`DailyAttendanceRecord`] is the single per-employee-per-day row that
//! tracks one check-in and one check-out.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{GeofenceValidationResult, GpsIntegrityResult, GpsReading};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// The lifecycle state of a daily record.
///
/// Transitions only go forward: `no-record → checked-in → checked-out`.
/// The derived ordering follows the lifecycle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    /// No check-in has been accepted for the day.
    #[default]
    NoRecord,
    /// Checked in, waiting for check-out.
    CheckedIn,
    /// Checked out. Terminal for the day.
    CheckedOut,
}

impl AttendanceStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::NoRecord => "no-record",
            AttendanceStatus::CheckedIn => "checked-in",
            AttendanceStatus::CheckedOut => "checked-out",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The natural key of a daily record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceKey {
    /// The employee id.
    pub employee_id: String,
    /// The business day.
    pub date: NaiveDate,
}

impl AttendanceKey {
    /// Creates a key.
    pub fn new(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee_id: employee_id.into(),
            date,
        }
    }
}

impl fmt::Display for AttendanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.employee_id, self.date)
    }
}

/// Where a check-in or check-out was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reported accuracy in meters.
    pub accuracy_meters: Option<f64>,
}

impl CheckpointLocation {
    /// Captures the position of a reading, if it has one.
    pub fn from_reading(reading: &GpsReading) -> Option<Self> {
        reading.coordinates().map(|(latitude, longitude)| Self {
            latitude,
            longitude,
            accuracy_meters: reading.accuracy_meters,
        })
    }
}

/// A supervisor override applied to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    /// The supervisor who made the correction.
    pub actor_id: String,
    /// Mandatory justification.
    pub reason: String,
    /// When the correction was applied.
    pub corrected_at: DateTime<Utc>,
    /// Check-in time before the correction.
    pub previous_check_in: Option<DateTime<Utc>>,
    /// Check-out time before the correction.
    pub previous_check_out: Option<DateTime<Utc>>,
}

/// The per-employee-per-day attendance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAttendanceRecord {
    /// The employee id (natural key, part 1).
    pub employee_id: String,
    /// The business day (natural key, part 2).
    pub date: NaiveDate,
    /// When the check-in was accepted.
    pub check_in_time: Option<DateTime<Utc>>,
    /// Where the check-in was made.
    pub check_in_location: Option<CheckpointLocation>,
    /// Geofence result at check-in.
    pub check_in_geofence: Option<GeofenceValidationResult>,
    /// GPS integrity result at check-in.
    pub check_in_gps_integrity: Option<GpsIntegrityResult>,
    /// Free-text notes supplied at check-in.
    #[serde(default)]
    pub check_in_notes: Option<String>,
    /// When the check-out was accepted.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Where the check-out was made.
    pub check_out_location: Option<CheckpointLocation>,
    /// Geofence result at check-out.
    pub check_out_geofence: Option<GeofenceValidationResult>,
    /// GPS integrity result at check-out.
    pub check_out_gps_integrity: Option<GpsIntegrityResult>,
    /// Free-text notes supplied at check-out.
    #[serde(default)]
    pub check_out_notes: Option<String>,
    /// Lifecycle state.
    pub status: AttendanceStatus,
    /// Hours between check-in and check-out, 2 decimal places.
    pub working_hours: Decimal,
    /// Incremented on every write; guards concurrent updates.
    pub revision: u64,
    /// Supervisor corrections, oldest first.
    #[serde(default)]
    pub corrections: Vec<CorrectionEntry>,
}

impl DailyAttendanceRecord {
    /// Creates an empty `no-record` row for the key.
    pub fn empty(key: &AttendanceKey) -> Self {
        Self {
            employee_id: key.employee_id.clone(),
            date: key.date,
            check_in_time: None,
            check_in_location: None,
            check_in_geofence: None,
            check_in_gps_integrity: None,
            check_in_notes: None,
            check_out_time: None,
            check_out_location: None,
            check_out_geofence: None,
            check_out_gps_integrity: None,
            check_out_notes: None,
            status: AttendanceStatus::NoRecord,
            working_hours: Decimal::ZERO,
            revision: 0,
            corrections: Vec::new(),
        }
    }

    /// Returns the natural key of this record.
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.employee_id.clone(), self.date)
    }

    /// Derives the status from which time fields are set.
    pub fn derived_status(&self) -> AttendanceStatus {
        match (self.check_in_time, self.check_out_time) {
            (Some(_), Some(_)) => AttendanceStatus::CheckedOut,
            (Some(_), None) => AttendanceStatus::CheckedIn,
            _ => AttendanceStatus::NoRecord,
        }
    }

    /// Recomputes `working_hours` from the current time fields.
    pub fn recompute_working_hours(&mut self) {
        self.working_hours = match (self.check_in_time, self.check_out_time) {
            (Some(check_in), Some(check_out)) => working_hours_between(check_in, check_out),
            _ => Decimal::ZERO,
        };
    }
}

/// Hours between two instants, rounded to 2 decimal places, half away from zero.
///
/// A check-out earlier than the check-in yields zero; callers reject that
/// case before it reaches here.
///
/// # Examples
///
/// ```
/// use attendance_engine::models::working_hours_between;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let check_in = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
/// let check_out = Utc.with_ymd_and_hms(2026, 1, 15, 17, 30, 0).unwrap();
/// assert_eq!(working_hours_between(check_in, check_out), Decimal::new(850, 2));
/// ```
pub fn working_hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Decimal {
    let millis = (check_out - check_in).num_milliseconds().max(0);
    let mut hours = (Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    hours.rescale(2);
    hours
}
