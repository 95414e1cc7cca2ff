//! Core data models for the Attendance Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance_record;
mod audit_event;
mod employee;
mod gps_reading;
mod validation_result;
mod work_location;

pub use attendance_record::{
    AttendanceKey, AttendanceStatus, CheckpointLocation, CorrectionEntry, DailyAttendanceRecord,
    working_hours_between,
};
pub use audit_event::{AuditAction, AuditEvent, ATTENDANCE_ENTITY_TYPE};
pub use employee::{Employee, EmployeeRole};
pub use gps_reading::GpsReading;
pub use validation_result::{GeofenceStatus, GeofenceValidationResult, GpsIntegrityResult};
pub use work_location::{DEFAULT_RADIUS_METERS, WorkLocation};
