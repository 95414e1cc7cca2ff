//! The daily attendance state machine.
//!
//! ```text
//! no-record ──check_in──▶ checked-in ──check_out──▶ checked-out
//! ```
//!
//! Every transition is a single compare-and-swap against the store, guarded
//! by the record's `(status, revision)`. For one `(employee, day)` at most one
//! check-in and one check-out are ever accepted, however many requests race.
//!
//! Each decision that reaches the machine, accepted or rejected, is handed to
//! the audit sink. Only the store work runs under the machine's deadline; the
//! audit call happens after the decision is final.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceKey, AttendanceStatus, AuditAction, AuditEvent, CheckpointLocation,
    CorrectionEntry, DailyAttendanceRecord, Employee, GeofenceStatus, GeofenceValidationResult,
    GpsIntegrityResult, GpsReading, working_hours_between,
};

use super::audit::AuditSink;
use super::store::{AttendanceStore, RecordVersion};

/// A validated check-in or check-out attempt.
#[derive(Debug, Clone)]
pub struct TransitionInput {
    /// Who is checking in or out.
    pub employee_id: String,
    /// The business day.
    pub date: NaiveDate,
    /// Server time of the request.
    pub now: DateTime<Utc>,
    /// The reading the validations ran on.
    pub reading: GpsReading,
    /// Geofence result for the reading.
    pub geofence: GeofenceValidationResult,
    /// Integrity result for the reading.
    pub integrity: GpsIntegrityResult,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

impl TransitionInput {
    fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.employee_id.clone(), self.date)
    }
}

/// A supervisor override of a day's check-in and/or check-out time.
#[derive(Debug, Clone)]
pub struct SupervisorCorrection {
    /// The supervisor applying the correction.
    pub actor_id: String,
    /// The employee whose record is corrected.
    pub employee_id: String,
    /// The business day of the record.
    pub date: NaiveDate,
    /// New check-in time, if it changes.
    pub check_in_time: Option<DateTime<Utc>>,
    /// New check-out time, if it changes.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Mandatory justification.
    pub reason: String,
    /// Server time of the correction.
    pub now: DateTime<Utc>,
}

/// Drives daily records through their lifecycle.
#[derive(Clone)]
pub struct AttendanceStateMachine {
    store: Arc<dyn AttendanceStore>,
    audit: Arc<dyn AuditSink>,
    store_timeout: Option<Duration>,
}

impl AttendanceStateMachine {
    /// Creates a state machine over a store and an audit sink.
    pub fn new(store: Arc<dyn AttendanceStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            store_timeout: None,
        }
    }

    /// Bounds the read-check-write of each transition by `limit`.
    ///
    /// An expired transition fails with `Transient` and nothing is written.
    /// Audit emission is not covered.
    pub fn with_store_timeout(mut self, limit: Duration) -> Self {
        self.store_timeout = Some(limit);
        self
    }

    /// Returns the stored record, or an empty `no-record` row for the key.
    pub async fn record(&self, key: &AttendanceKey) -> EngineResult<DailyAttendanceRecord> {
        Ok(self
            .store
            .get(key)
            .await?
            .unwrap_or_else(|| DailyAttendanceRecord::empty(key)))
    }

    /// Accepts a check-in.
    ///
    /// Checks, in order: the day has no check-in yet, the reading passed the
    /// integrity pass, the reading is inside the geofence. The record is then
    /// written with a single conditional write.
    pub async fn check_in(&self, input: TransitionInput) -> EngineResult<DailyAttendanceRecord> {
        let key = input.key();
        let outcome = self.bounded("check-in", self.try_check_in(&key, &input)).await;

        let (action, metadata) = match &outcome {
            Ok(record) => {
                info!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    risk_score = input.integrity.risk_score,
                    distance_meters = ?input.geofence.distance_meters,
                    "Check-in accepted"
                );
                (AuditAction::CheckIn, accepted_metadata(&input, record))
            }
            Err(err) => {
                warn!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    code = err.code(),
                    error = %err,
                    "Check-in rejected"
                );
                (AuditAction::CheckInRejected, rejected_metadata(&input, err))
            }
        };
        self.emit(AuditEvent::new(action, &key, &input.employee_id, input.now, metadata))
            .await;

        outcome
    }

    /// Accepts a check-out and computes the day's working hours.
    pub async fn check_out(&self, input: TransitionInput) -> EngineResult<DailyAttendanceRecord> {
        let key = input.key();
        let outcome = self.bounded("check-out", self.try_check_out(&key, &input)).await;

        let (action, metadata) = match &outcome {
            Ok(record) => {
                info!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    working_hours = %record.working_hours,
                    "Check-out accepted"
                );
                (AuditAction::CheckOut, accepted_metadata(&input, record))
            }
            Err(err) => {
                warn!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    code = err.code(),
                    error = %err,
                    "Check-out rejected"
                );
                (AuditAction::CheckOutRejected, rejected_metadata(&input, err))
            }
        };
        self.emit(AuditEvent::new(action, &key, &input.employee_id, input.now, metadata))
            .await;

        outcome
    }

    /// Applies a supervisor correction.
    ///
    /// Location checks are bypassed. The status is derived from the resulting
    /// time fields and never moves backward; working hours are recomputed and
    /// the correction is appended to the record's history.
    pub async fn correct(
        &self,
        actor: &Employee,
        correction: SupervisorCorrection,
    ) -> EngineResult<DailyAttendanceRecord> {
        let key = AttendanceKey::new(correction.employee_id.clone(), correction.date);
        let outcome = self
            .bounded("correction", self.try_correct(&key, actor, &correction))
            .await;

        let (action, metadata) = match &outcome {
            Ok(record) => {
                info!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    actor_id = %correction.actor_id,
                    status = %record.status,
                    working_hours = %record.working_hours,
                    "Correction applied"
                );
                let previous = record.corrections.last();
                (
                    AuditAction::Correction,
                    json!({
                        "reason": correction.reason,
                        "previous_check_in": previous.and_then(|c| c.previous_check_in),
                        "previous_check_out": previous.and_then(|c| c.previous_check_out),
                        "check_in_time": record.check_in_time,
                        "check_out_time": record.check_out_time,
                        "status": record.status,
                        "working_hours": record.working_hours,
                        "revision": record.revision,
                    }),
                )
            }
            Err(err) => {
                warn!(
                    employee_id = %key.employee_id,
                    date = %key.date,
                    actor_id = %correction.actor_id,
                    code = err.code(),
                    error = %err,
                    "Correction rejected"
                );
                (
                    AuditAction::CorrectionRejected,
                    json!({
                        "reason": correction.reason,
                        "error_code": err.code(),
                        "error": err.to_string(),
                    }),
                )
            }
        };
        self.emit(AuditEvent::new(
            action,
            &key,
            &correction.actor_id,
            correction.now,
            metadata,
        ))
        .await;

        outcome
    }

    async fn try_check_in(
        &self,
        key: &AttendanceKey,
        input: &TransitionInput,
    ) -> EngineResult<DailyAttendanceRecord> {
        let current = self.store.get(key).await?;
        ensure_can_check_in(key, current.as_ref())?;
        ensure_location_valid(input)?;

        let expected = RecordVersion::of(current.as_ref());
        let mut record = current.unwrap_or_else(|| DailyAttendanceRecord::empty(key));
        record.check_in_time = Some(input.now);
        record.check_in_location = CheckpointLocation::from_reading(&input.reading);
        record.check_in_geofence = Some(input.geofence.clone());
        record.check_in_gps_integrity = Some(input.integrity.clone());
        record.check_in_notes = input.notes.clone();
        record.status = AttendanceStatus::CheckedIn;
        record.revision = expected.revision + 1;

        self.write(key, expected, record, ensure_can_check_in).await
    }

    async fn try_check_out(
        &self,
        key: &AttendanceKey,
        input: &TransitionInput,
    ) -> EngineResult<DailyAttendanceRecord> {
        let current = self.store.get(key).await?;
        ensure_can_check_out(key, current.as_ref())?;
        ensure_location_valid(input)?;

        let expected = RecordVersion::of(current.as_ref());
        let mut record = current.unwrap_or_else(|| DailyAttendanceRecord::empty(key));
        let Some(check_in) = record.check_in_time else {
            return Err(no_check_in(key));
        };
        if input.now < check_in {
            return Err(EngineError::InvalidTimeRange {
                message: format!(
                    "check-out at {} is before check-in at {}",
                    input.now, check_in
                ),
            });
        }

        record.check_out_time = Some(input.now);
        record.check_out_location = CheckpointLocation::from_reading(&input.reading);
        record.check_out_geofence = Some(input.geofence.clone());
        record.check_out_gps_integrity = Some(input.integrity.clone());
        record.check_out_notes = input.notes.clone();
        record.working_hours = working_hours_between(check_in, input.now);
        record.status = AttendanceStatus::CheckedOut;
        record.revision = expected.revision + 1;

        self.write(key, expected, record, ensure_can_check_out).await
    }

    async fn try_correct(
        &self,
        key: &AttendanceKey,
        actor: &Employee,
        correction: &SupervisorCorrection,
    ) -> EngineResult<DailyAttendanceRecord> {
        if correction.actor_id.trim().is_empty() {
            return Err(EngineError::MissingField {
                field: "actor_id".to_string(),
            });
        }
        if correction.reason.trim().is_empty() {
            return Err(EngineError::MissingField {
                field: "reason".to_string(),
            });
        }
        if !actor.is_supervisor() {
            return Err(EngineError::Unauthorized {
                actor_id: correction.actor_id.clone(),
                message: "only supervisors may correct attendance".to_string(),
            });
        }
        if correction.check_in_time.is_none() && correction.check_out_time.is_none() {
            return Err(EngineError::InvalidField {
                field: "check_in_time".to_string(),
                message: "a correction must set check_in_time or check_out_time".to_string(),
            });
        }

        let current = self.store.get(key).await?;
        let expected = RecordVersion::of(current.as_ref());
        let mut record = current.unwrap_or_else(|| DailyAttendanceRecord::empty(key));

        let entry = CorrectionEntry {
            actor_id: correction.actor_id.clone(),
            reason: correction.reason.clone(),
            corrected_at: correction.now,
            previous_check_in: record.check_in_time,
            previous_check_out: record.check_out_time,
        };

        if let Some(check_in) = correction.check_in_time {
            record.check_in_time = Some(check_in);
        }
        if let Some(check_out) = correction.check_out_time {
            record.check_out_time = Some(check_out);
        }

        match (record.check_in_time, record.check_out_time) {
            (None, Some(_)) => {
                return Err(EngineError::InvalidTimeRange {
                    message: "check-out cannot be set without a check-in".to_string(),
                });
            }
            (Some(check_in), Some(check_out)) if check_out < check_in => {
                return Err(EngineError::InvalidTimeRange {
                    message: format!(
                        "check-out at {} is before check-in at {}",
                        check_out, check_in
                    ),
                });
            }
            _ => {}
        }

        record.status = record.derived_status().max(record.status);
        record.recompute_working_hours();
        record.corrections.push(entry);
        record.revision = expected.revision + 1;

        self.store.compare_and_swap(expected, record.clone()).await?;
        Ok(record)
    }

    /// Conditionally writes `record`; a lost race is reported as the state
    /// error the winner's write now implies.
    async fn write(
        &self,
        key: &AttendanceKey,
        expected: RecordVersion,
        record: DailyAttendanceRecord,
        precondition: fn(&AttendanceKey, Option<&DailyAttendanceRecord>) -> EngineResult<()>,
    ) -> EngineResult<DailyAttendanceRecord> {
        match self.store.compare_and_swap(expected, record.clone()).await {
            Ok(()) => Ok(record),
            Err(conflict @ EngineError::StorageConflict { .. }) => {
                let latest = self.store.get(key).await?;
                precondition(key, latest.as_ref())?;
                Err(conflict)
            }
            Err(err) => Err(err),
        }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        work: impl Future<Output = EngineResult<T>>,
    ) -> EngineResult<T> {
        match self.store_timeout {
            Some(limit) => within_deadline(operation, limit, work).await,
            None => work.await,
        }
    }

    async fn emit(&self, event: AuditEvent) {
        let event_id = event.id;
        if let Err(err) = self.audit.record(event).await {
            warn!(event_id = %event_id, error = %err, "Failed to record audit event");
        }
    }
}

/// Runs `work` under `limit`, mapping expiry to a retryable `Transient`.
pub(crate) async fn within_deadline<T>(
    operation: &str,
    limit: Duration,
    work: impl Future<Output = EngineResult<T>>,
) -> EngineResult<T> {
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Deadline exceeded"
            );
            Err(EngineError::Transient {
                message: format!(
                    "{} did not complete within {}ms",
                    operation,
                    limit.as_millis()
                ),
            })
        }
    }
}

fn ensure_can_check_in(
    key: &AttendanceKey,
    current: Option<&DailyAttendanceRecord>,
) -> EngineResult<()> {
    match current.map(|r| r.status).unwrap_or_default() {
        AttendanceStatus::NoRecord => Ok(()),
        AttendanceStatus::CheckedIn => Err(EngineError::AlreadyCheckedIn {
            employee_id: key.employee_id.clone(),
            date: key.date,
        }),
        AttendanceStatus::CheckedOut => Err(EngineError::AlreadyCheckedOut {
            employee_id: key.employee_id.clone(),
            date: key.date,
        }),
    }
}

fn ensure_can_check_out(
    key: &AttendanceKey,
    current: Option<&DailyAttendanceRecord>,
) -> EngineResult<()> {
    match current.map(|r| r.status).unwrap_or_default() {
        AttendanceStatus::CheckedIn => Ok(()),
        AttendanceStatus::NoRecord => Err(no_check_in(key)),
        AttendanceStatus::CheckedOut => Err(EngineError::AlreadyCheckedOut {
            employee_id: key.employee_id.clone(),
            date: key.date,
        }),
    }
}

fn no_check_in(key: &AttendanceKey) -> EngineError {
    EngineError::NoCheckInFound {
        employee_id: key.employee_id.clone(),
        date: key.date,
    }
}

fn ensure_location_valid(input: &TransitionInput) -> EngineResult<()> {
    let integrity = &input.integrity;
    if !integrity.is_valid {
        return Err(EngineError::GpsIntegrityViolation {
            risk_score: integrity.risk_score,
            issues: integrity.issues.clone(),
            recommendations: integrity.recommendations.clone(),
        });
    }

    let geofence = &input.geofence;
    if geofence.is_valid {
        return Ok(());
    }
    match geofence.status {
        GeofenceStatus::NoSitesAssigned => Err(EngineError::NoWorkLocationAssigned {
            employee_id: input.employee_id.clone(),
        }),
        _ => Err(EngineError::GeofenceViolation {
            message: geofence.message.clone(),
            distance_meters: geofence.distance_meters,
            site_name: geofence.nearest_location.as_ref().map(|l| l.name.clone()),
        }),
    }
}

fn accepted_metadata(input: &TransitionInput, record: &DailyAttendanceRecord) -> serde_json::Value {
    json!({
        "status": record.status,
        "revision": record.revision,
        "working_hours": record.working_hours,
        "geofence": input.geofence,
        "gps_integrity": input.integrity,
        "notes": input.notes,
    })
}

fn rejected_metadata(input: &TransitionInput, err: &EngineError) -> serde_json::Value {
    json!({
        "error_code": err.code(),
        "error": err.to_string(),
        "geofence": input.geofence,
        "gps_integrity": input.integrity,
    })
}
