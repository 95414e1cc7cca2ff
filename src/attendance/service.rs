//! Request orchestration.
//!
//! [`AttendanceService`] ties the collaborators together for one request:
//! employee lookup, site resolution, the integrity and geofence passes, and
//! the state machine transition. Lookups and the transition's store work run
//! under the configured deadline; audit emission does not, so a slow audit
//! sink never turns a committed decision into a retryable failure.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AttendanceConfig, AttendancePolicy};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceKey, DailyAttendanceRecord, Employee, GeofenceValidationResult, GpsIntegrityResult,
    GpsReading,
};
use crate::validation::{
    coordinates_plausible, geofence_not_evaluated, validate_geofence, validate_integrity,
};

use super::audit::{AuditSink, TracingAuditSink};
use super::resolver::{EmployeeDirectory, MemoryDirectory, WorkLocationResolver};
use super::state_machine::{
    AttendanceStateMachine, SupervisorCorrection, TransitionInput, within_deadline,
};
use super::store::{AttendanceStore, MemoryAttendanceStore};

/// The transition an employee requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceAction {
    /// Start of the working day.
    CheckIn,
    /// End of the working day.
    CheckOut,
}

impl AttendanceAction {
    /// Returns the wire representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceAction::CheckIn => "check-in",
            AttendanceAction::CheckOut => "check-out",
        }
    }
}

impl fmt::Display for AttendanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceAction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check-in" => Ok(AttendanceAction::CheckIn),
            "check-out" => Ok(AttendanceAction::CheckOut),
            other => Err(EngineError::InvalidField {
                field: "action".to_string(),
                message: format!("expected 'check-in' or 'check-out', got '{}'", other),
            }),
        }
    }
}

/// A check-in or check-out request.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// Who is checking in or out.
    pub employee_id: String,
    /// Which transition.
    pub action: AttendanceAction,
    /// The device reading.
    pub reading: GpsReading,
    /// Optional free-text notes.
    pub notes: Option<String>,
}

/// The result of an accepted check-in or check-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDecision {
    /// The record after the transition.
    pub record: DailyAttendanceRecord,
    /// Geofence result for the reading.
    pub geofence: GeofenceValidationResult,
    /// Integrity result for the reading.
    pub gps_integrity: GpsIntegrityResult,
}

/// Validates and records attendance requests.
#[derive(Clone)]
pub struct AttendanceService {
    policy: AttendancePolicy,
    directory: Arc<dyn EmployeeDirectory>,
    resolver: WorkLocationResolver,
    machine: AttendanceStateMachine,
}

impl AttendanceService {
    /// Creates a service over explicit collaborators.
    pub fn new(
        policy: AttendancePolicy,
        directory: Arc<dyn EmployeeDirectory>,
        store: Arc<dyn AttendanceStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let machine = AttendanceStateMachine::new(store, audit)
            .with_store_timeout(policy.service.request_timeout());
        Self {
            policy,
            resolver: WorkLocationResolver::new(directory.clone()),
            directory,
            machine,
        }
    }

    /// Creates a self-contained service: configuration-backed directory,
    /// in-memory store and audit events on the `audit` tracing target.
    pub fn in_memory(config: &AttendanceConfig) -> Self {
        Self::new(
            config.policy().clone(),
            Arc::new(MemoryDirectory::from_config(config)),
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(TracingAuditSink),
        )
    }

    /// Returns the active policy.
    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    /// Validates a reading and applies the requested transition.
    ///
    /// `now` is the server time; the business day is derived from it.
    pub async fn submit(
        &self,
        request: CheckRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<AttendanceDecision> {
        let action = request.action;
        let input = self
            .with_deadline(action.as_str(), self.prepare(request, now))
            .await?;
        let geofence = input.geofence.clone();
        let gps_integrity = input.integrity.clone();

        let record = match action {
            AttendanceAction::CheckIn => self.machine.check_in(input).await?,
            AttendanceAction::CheckOut => self.machine.check_out(input).await?,
        };

        Ok(AttendanceDecision {
            record,
            geofence,
            gps_integrity,
        })
    }

    /// Returns the employee's record for `date`, or for the current business
    /// day when `date` is `None`. A day without activity yields an empty
    /// `no-record` row.
    pub async fn daily_record(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> EngineResult<DailyAttendanceRecord> {
        self.with_deadline("daily-record", async {
            self.find_employee(employee_id).await?;
            let date = date.unwrap_or_else(|| self.policy.service.business_date(now));
            self.machine
                .record(&AttendanceKey::new(employee_id, date))
                .await
        })
        .await
    }

    /// Applies a supervisor correction after resolving the actor.
    pub async fn correct(
        &self,
        correction: SupervisorCorrection,
    ) -> EngineResult<DailyAttendanceRecord> {
        let actor = self
            .with_deadline("correction", async {
                self.find_employee(&correction.employee_id).await?;
                self.directory
                    .employee(&correction.actor_id)
                    .await?
                    .ok_or_else(|| EngineError::Unauthorized {
                        actor_id: correction.actor_id.clone(),
                        message: "unknown actor".to_string(),
                    })
            })
            .await?;
        self.machine.correct(&actor, correction).await
    }

    /// Looks up the employee, runs both validation passes and builds the
    /// transition input.
    async fn prepare(
        &self,
        request: CheckRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<TransitionInput> {
        let employee = self.find_employee(&request.employee_id).await?;
        let date = self.policy.service.business_date(now);

        let integrity = validate_integrity(&request.reading, now, &self.policy.integrity);
        let geofence = if !integrity.is_valid && !coordinates_plausible(&request.reading) {
            geofence_not_evaluated("Location rejected by GPS integrity check")
        } else {
            let sites = self.resolver.resolve(&employee).await?;
            validate_geofence(&request.reading, &sites)
        };
        debug!(
            employee_id = %employee.id,
            action = %request.action,
            risk_score = integrity.risk_score,
            geofence_status = ?geofence.status,
            "Validated reading"
        );

        Ok(TransitionInput {
            employee_id: employee.id,
            date,
            now,
            reading: request.reading,
            geofence,
            integrity,
            notes: request.notes,
        })
    }

    async fn find_employee(&self, employee_id: &str) -> EngineResult<Employee> {
        if employee_id.trim().is_empty() {
            return Err(EngineError::MissingField {
                field: "employee_id".to_string(),
            });
        }
        self.directory
            .employee(employee_id)
            .await?
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    async fn with_deadline<T>(
        &self,
        operation: &str,
        work: impl Future<Output = EngineResult<T>>,
    ) -> EngineResult<T> {
        within_deadline(operation, self.policy.service.request_timeout(), work).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::audit::MemoryAuditSink;
    use crate::models::{
        AttendanceStatus, AuditAction, EmployeeRole, GeofenceStatus, WorkLocation,
    };
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap()
    }

    fn employee(id: &str, role: EmployeeRole, sites: &[&str], legacy: Option<&str>) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_string(),
            role,
            work_location_ids: sites.iter().map(|s| s.to_string()).collect(),
            legacy_work_location_id: legacy.map(str::to_string),
        }
    }

    fn config() -> AttendanceConfig {
        AttendanceConfig::new(
            AttendancePolicy::default(),
            vec![
                WorkLocation::new("hq", "Head Office", 9.0, 38.7),
                WorkLocation::new("warehouse", "Warehouse", 8.9806, 38.7578).with_radius(250.0),
            ],
            vec![
                employee("emp_001", EmployeeRole::Employee, &["hq"], None),
                employee("emp_002", EmployeeRole::Employee, &["hq", "warehouse"], None),
                employee("emp_003", EmployeeRole::Employee, &[], Some("hq")),
                employee("emp_004", EmployeeRole::Employee, &[], None),
                employee("sup_001", EmployeeRole::Supervisor, &["hq"], None),
            ],
        )
        .unwrap()
    }

    fn service() -> (AttendanceService, MemoryAuditSink) {
        let config = config();
        let audit = MemoryAuditSink::new();
        let service = AttendanceService::new(
            config.policy().clone(),
            Arc::new(MemoryDirectory::from_config(&config)),
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(audit.clone()),
        );
        (service, audit)
    }

    fn request(
        employee_id: &str,
        action: AttendanceAction,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> CheckRequest {
        CheckRequest {
            employee_id: employee_id.to_string(),
            action,
            reading: GpsReading::new(latitude, longitude, Some(12.0), now),
            notes: None,
        }
    }

    // ==========================================================================
    // Action parsing
    // ==========================================================================

    #[test]
    fn test_action_parses_wire_names() {
        assert_eq!(
            "check-in".parse::<AttendanceAction>().unwrap(),
            AttendanceAction::CheckIn
        );
        assert_eq!(
            "check-out".parse::<AttendanceAction>().unwrap(),
            AttendanceAction::CheckOut
        );
        assert!(matches!(
            "clock-in".parse::<AttendanceAction>(),
            Err(EngineError::InvalidField { .. })
        ));
    }

    // ==========================================================================
    // Check-in / check-out
    // ==========================================================================

    #[tokio::test]
    async fn test_check_in_55m_from_site_is_accepted() {
        let (service, _) = service();
        let now = at(9, 0);

        let decision = service
            .submit(request("emp_001", AttendanceAction::CheckIn, 9.0005, 38.7, now), now)
            .await
            .unwrap();

        assert_eq!(decision.record.status, AttendanceStatus::CheckedIn);
        assert_eq!(decision.geofence.status, GeofenceStatus::Inside);
        assert!((decision.geofence.distance_meters.unwrap() - 55.6).abs() < 0.1);
        assert_eq!(decision.gps_integrity.risk_score, 0);
    }

    #[tokio::test]
    async fn test_null_island_is_integrity_violation() {
        let (service, audit) = service();
        let now = at(9, 0);

        let result = service
            .submit(request("emp_001", AttendanceAction::CheckIn, 0.0, 0.0, now), now)
            .await;

        assert!(matches!(
            result,
            Err(EngineError::GpsIntegrityViolation { .. })
        ));
        let event = &audit.events()[0];
        assert_eq!(event.action, AuditAction::CheckInRejected);
        assert_eq!(event.metadata["geofence"]["status"], "not_evaluated");
    }

    #[tokio::test]
    async fn test_unknown_employee_is_not_audited() {
        let (service, audit) = service();
        let now = at(9, 0);

        let result = service
            .submit(request("ghost", AttendanceAction::CheckIn, 9.0, 38.7, now), now)
            .await;

        assert!(matches!(result, Err(EngineError::EmployeeNotFound { .. })));
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn test_employee_without_sites_gets_no_work_location() {
        let (service, audit) = service();
        let now = at(9, 0);

        let result = service
            .submit(request("emp_004", AttendanceAction::CheckIn, 9.0, 38.7, now), now)
            .await;

        assert!(matches!(
            result,
            Err(EngineError::NoWorkLocationAssigned { .. })
        ));
        assert_eq!(audit.events()[0].metadata["error_code"], "NO_WORK_LOCATION");
    }

    #[tokio::test]
    async fn test_legacy_assignment_is_honoured() {
        let (service, _) = service();
        let now = at(9, 0);

        let decision = service
            .submit(request("emp_003", AttendanceAction::CheckIn, 9.0002, 38.7, now), now)
            .await
            .unwrap();
        assert_eq!(decision.geofence.nearest_location.unwrap().id, "hq");
    }

    #[tokio::test]
    async fn test_multi_site_uses_nearest_site() {
        let (service, _) = service();
        let now = at(9, 0);

        let decision = service
            .submit(
                request("emp_002", AttendanceAction::CheckIn, 8.9807, 38.7578, now),
                now,
            )
            .await
            .unwrap();
        assert_eq!(decision.geofence.nearest_location.unwrap().id, "warehouse");
    }

    #[tokio::test]
    async fn test_full_day_records_working_hours() {
        let (service, _) = service();

        service
            .submit(
                request("emp_001", AttendanceAction::CheckIn, 9.0, 38.7, at(9, 0)),
                at(9, 0),
            )
            .await
            .unwrap();
        let decision = service
            .submit(
                request("emp_001", AttendanceAction::CheckOut, 9.0, 38.7, at(17, 30)),
                at(17, 30),
            )
            .await
            .unwrap();

        assert_eq!(decision.record.status, AttendanceStatus::CheckedOut);
        assert_eq!(decision.record.working_hours, Decimal::new(850, 2));
    }

    #[tokio::test]
    async fn test_stale_reading_alone_is_accepted_but_scored() {
        let (service, _) = service();
        let now = at(9, 0);
        let mut stale = request("emp_001", AttendanceAction::CheckIn, 9.0, 38.7, now);
        stale.reading.captured_at = now - Duration::minutes(10);

        let decision = service.submit(stale, now).await.unwrap();
        assert_eq!(decision.gps_integrity.risk_score, 40);
        assert!(decision.gps_integrity.is_valid);
    }

    // ==========================================================================
    // Daily record
    // ==========================================================================

    #[tokio::test]
    async fn test_daily_record_defaults_to_no_record() {
        let (service, _) = service();
        let record = service.daily_record("emp_001", None, at(9, 0)).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::NoRecord);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[tokio::test]
    async fn test_daily_record_unknown_employee() {
        let (service, _) = service();
        let result = service.daily_record("ghost", None, at(9, 0)).await;
        assert!(matches!(result, Err(EngineError::EmployeeNotFound { .. })));
    }

    // ==========================================================================
    // Corrections
    // ==========================================================================

    fn correction(actor_id: &str) -> SupervisorCorrection {
        SupervisorCorrection {
            actor_id: actor_id.to_string(),
            employee_id: "emp_001".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            check_in_time: Some(at(9, 0)),
            check_out_time: Some(at(17, 0)),
            reason: "Device was offline".to_string(),
            now: at(18, 0),
        }
    }

    #[tokio::test]
    async fn test_supervisor_correction_through_service() {
        let (service, _) = service();
        let record = service.correct(correction("sup_001")).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::CheckedOut);
        assert_eq!(record.working_hours, Decimal::new(800, 2));
    }

    #[tokio::test]
    async fn test_unknown_actor_is_unauthorized() {
        let (service, _) = service();
        let result = service.correct(correction("nobody")).await;
        assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_employee_cannot_correct() {
        let (service, _) = service();
        let result = service.correct(correction("emp_002")).await;
        assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
    }

    // ==========================================================================
    // Deadline
    // ==========================================================================

    struct SlowDirectory;

    #[async_trait]
    impl EmployeeDirectory for SlowDirectory {
        async fn employee(&self, _employee_id: &str) -> EngineResult<Option<Employee>> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn work_location(&self, _location_id: &str) -> EngineResult<Option<WorkLocation>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_slow_directory_surfaces_transient() {
        let mut policy = AttendancePolicy::default();
        policy.service.request_timeout_ms = 50;
        let service = AttendanceService::new(
            policy,
            Arc::new(SlowDirectory),
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(MemoryAuditSink::new()),
        );
        let now = at(9, 0);

        let result = service
            .submit(request("emp_001", AttendanceAction::CheckIn, 9.0, 38.7, now), now)
            .await;

        match result {
            Err(err) => assert!(err.is_retryable(), "unexpected {:?}", err),
            Ok(_) => panic!("expected a timeout"),
        }
    }

    struct SlowAuditSink(MemoryAuditSink);

    #[async_trait]
    impl AuditSink for SlowAuditSink {
        async fn record(&self, event: crate::models::AuditEvent) -> EngineResult<()> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            self.0.record(event).await
        }
    }

    #[tokio::test]
    async fn test_slow_audit_sink_keeps_accepted_check_in() {
        let config = config();
        let mut policy = config.policy().clone();
        policy.service.request_timeout_ms = 50;
        let audit = MemoryAuditSink::new();
        let store = Arc::new(MemoryAttendanceStore::new());
        let service = AttendanceService::new(
            policy,
            Arc::new(MemoryDirectory::from_config(&config)),
            store.clone(),
            Arc::new(SlowAuditSink(audit.clone())),
        );
        let now = at(9, 0);

        let decision = service
            .submit(request("emp_001", AttendanceAction::CheckIn, 9.0005, 38.7, now), now)
            .await
            .unwrap();

        assert_eq!(decision.record.status, AttendanceStatus::CheckedIn);
        let stored = store
            .get(&AttendanceKey::new("emp_001", decision.record.date))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AttendanceStatus::CheckedIn);
        assert_eq!(audit.events().len(), 1);

        let retry = service
            .submit(request("emp_001", AttendanceAction::CheckIn, 9.0005, 38.7, now), now)
            .await;
        assert!(matches!(retry, Err(EngineError::AlreadyCheckedIn { .. })));
    }
}
