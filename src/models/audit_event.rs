//! Audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AttendanceKey;

/// Entity type recorded on every attendance audit event.
pub const ATTENDANCE_ENTITY_TYPE: &str = "daily_attendance";

/// What happened to the daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A check-in was accepted.
    CheckIn,
    /// A check-in reached the state machine and was rejected.
    CheckInRejected,
    /// A check-out was accepted.
    CheckOut,
    /// A check-out reached the state machine and was rejected.
    CheckOutRejected,
    /// A supervisor correction was applied.
    Correction,
    /// A supervisor correction was rejected.
    CorrectionRejected,
}

/// An immutable record of a state machine decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event id.
    pub id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Always [`ATTENDANCE_ENTITY_TYPE`] for this engine.
    pub entity_type: String,
    /// `employee_id:date` of the affected record.
    pub entity_id: String,
    /// Who caused the event.
    pub actor_id: String,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Decision details (validation results, error codes, working hours).
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    /// Creates an event for the given record key.
    pub fn new(
        action: AuditAction,
        key: &AttendanceKey,
        actor_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            entity_type: ATTENDANCE_ENTITY_TYPE.to_string(),
            entity_id: key.to_string(),
            actor_id: actor_id.into(),
            timestamp,
            metadata,
        }
    }
}
