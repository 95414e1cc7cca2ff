//! Configuration types for attendance validation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every policy field has a
//! default, so a partial `policy.yaml` is valid.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Employee, WorkLocation};

/// Weight contributed to the risk score by each integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntegrityWeights {
    /// Latitude or longitude absent.
    pub missing_coordinates: u8,
    /// Non-finite or out-of-range coordinates.
    pub coordinate_range: u8,
    /// Exactly `(0, 0)`.
    pub null_island: u8,
    /// Accuracy absent while required.
    pub missing_accuracy: u8,
    /// Accuracy zero, negative or non-finite.
    pub implausible_accuracy: u8,
    /// Accuracy above `max_accuracy_meters`.
    pub coarse_accuracy: u8,
    /// Capture time too far in the past.
    pub stale_timestamp: u8,
    /// Capture time too far in the future.
    pub future_timestamp: u8,
}

impl Default for IntegrityWeights {
    fn default() -> Self {
        Self {
            missing_coordinates: 100,
            coordinate_range: 100,
            null_island: 90,
            missing_accuracy: 25,
            implausible_accuracy: 40,
            coarse_accuracy: 35,
            stale_timestamp: 40,
            future_timestamp: 50,
        }
    }
}

/// Anti-spoofing thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntegrityPolicy {
    /// Readings coarser than this cannot support a geofence decision.
    pub max_accuracy_meters: f64,
    /// Allowed distance between the capture time and now, either direction.
    pub max_clock_skew_seconds: i64,
    /// Readings scoring at or above this are rejected.
    pub rejection_threshold: u8,
    /// Whether a reading without accuracy is suspicious.
    pub require_accuracy: bool,
    /// Per-check weights.
    pub weights: IntegrityWeights,
}

impl Default for IntegrityPolicy {
    fn default() -> Self {
        Self {
            max_accuracy_meters: 500.0,
            max_clock_skew_seconds: 120,
            rejection_threshold: 70,
            require_accuracy: true,
            weights: IntegrityWeights::default(),
        }
    }
}

impl IntegrityPolicy {
    /// The clock skew window as a duration, saturating at chrono's range.
    pub fn max_clock_skew(&self) -> Duration {
        Duration::try_seconds(self.max_clock_skew_seconds).unwrap_or(Duration::MAX)
    }
}

/// Request-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServicePolicy {
    /// Overall deadline for a check-in/out request.
    pub request_timeout_ms: u64,
    /// Offset from UTC used to derive the business day.
    pub utc_offset_minutes: i32,
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            request_timeout_ms: 3000,
            utc_offset_minutes: 0,
        }
    }
}

impl ServicePolicy {
    /// The request deadline.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// The configured offset, or `None` when it is not a valid UTC offset.
    pub fn offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    /// The calendar day `now` falls on in the configured offset.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::config::ServicePolicy;
    /// use chrono::{NaiveDate, TimeZone, Utc};
    ///
    /// let policy = ServicePolicy { request_timeout_ms: 3000, utc_offset_minutes: 180 };
    /// let late_evening_utc = Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap();
    /// assert_eq!(
    ///     policy.business_date(late_evening_utc),
    ///     NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
    /// );
    /// ```
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        match self.offset() {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }
}

/// The complete policy loaded from `policy.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AttendancePolicy {
    /// GPS integrity thresholds and weights.
    pub integrity: IntegrityPolicy,
    /// Request settings.
    pub service: ServicePolicy,
}

impl AttendancePolicy {
    /// Checks the policy for values that would make every decision meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        let integrity = &self.integrity;
        if integrity.rejection_threshold == 0 || integrity.rejection_threshold > 100 {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "integrity.rejection_threshold must be in 1..=100, got {}",
                    integrity.rejection_threshold
                ),
            });
        }
        if !(integrity.max_accuracy_meters.is_finite() && integrity.max_accuracy_meters > 0.0) {
            return Err(EngineError::InvalidConfig {
                message: "integrity.max_accuracy_meters must be positive".to_string(),
            });
        }
        if integrity.max_clock_skew_seconds <= 0 {
            return Err(EngineError::InvalidConfig {
                message: "integrity.max_clock_skew_seconds must be positive".to_string(),
            });
        }
        if Duration::try_seconds(integrity.max_clock_skew_seconds).is_none() {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "integrity.max_clock_skew_seconds out of range: {}",
                    integrity.max_clock_skew_seconds
                ),
            });
        }
        if self.service.request_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig {
                message: "service.request_timeout_ms must be positive".to_string(),
            });
        }
        if self.service.offset().is_none() {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "service.utc_offset_minutes out of range: {}",
                    self.service.utc_offset_minutes
                ),
            });
        }
        Ok(())
    }
}

/// Work locations configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkLocationsConfig {
    /// The configured work sites.
    pub work_locations: Vec<WorkLocation>,
}

/// Employees configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeesConfig {
    /// The configured employees.
    pub employees: Vec<Employee>,
}

/// The complete attendance configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    policy: AttendancePolicy,
    work_locations: HashMap<String, WorkLocation>,
    employees: HashMap<String, Employee>,
}

impl AttendanceConfig {
    /// Creates a validated configuration from its component parts.
    ///
    /// Fails with `InvalidConfig` on an invalid policy, an invalid or
    /// duplicated work location, a duplicated employee, or an employee
    /// referencing an unknown work location.
    pub fn new(
        policy: AttendancePolicy,
        work_locations: Vec<WorkLocation>,
        employees: Vec<Employee>,
    ) -> EngineResult<Self> {
        policy.validate()?;

        let mut sites = HashMap::with_capacity(work_locations.len());
        for site in work_locations {
            site.validate()?;
            let id = site.id.clone();
            if sites.insert(id.clone(), site).is_some() {
                return Err(EngineError::InvalidConfig {
                    message: format!("duplicate work location id '{}'", id),
                });
            }
        }

        let mut people = HashMap::with_capacity(employees.len());
        for employee in employees {
            let references = employee
                .work_location_ids
                .iter()
                .chain(employee.legacy_work_location_id.iter());
            for site_id in references {
                if !sites.contains_key(site_id) {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "employee '{}' references unknown work location '{}'",
                            employee.id, site_id
                        ),
                    });
                }
            }
            let id = employee.id.clone();
            if people.insert(id.clone(), employee).is_some() {
                return Err(EngineError::InvalidConfig {
                    message: format!("duplicate employee id '{}'", id),
                });
            }
        }

        Ok(Self {
            policy,
            work_locations: sites,
            employees: people,
        })
    }

    /// Returns the policy.
    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    /// Returns all work locations by id.
    pub fn work_locations(&self) -> &HashMap<String, WorkLocation> {
        &self.work_locations
    }

    /// Returns all employees by id.
    pub fn employees(&self) -> &HashMap<String, Employee> {
        &self.employees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmployeeRole;
    use chrono::TimeZone;

    fn employee(id: &str, sites: &[&str]) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_string(),
            role: EmployeeRole::Employee,
            work_location_ids: sites.iter().map(|s| s.to_string()).collect(),
            legacy_work_location_id: None,
        }
    }

    #[test]
    fn test_policy_defaults() {
        let policy: AttendancePolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(policy.integrity.rejection_threshold, 70);
        assert_eq!(policy.integrity.max_accuracy_meters, 500.0);
        assert_eq!(policy.integrity.max_clock_skew_seconds, 120);
        assert_eq!(policy.service.request_timeout_ms, 3000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_partial_policy_keeps_other_defaults() {
        let yaml = r#"
integrity:
  rejection_threshold: 50
  weights:
    null_island: 60
"#;
        let policy: AttendancePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.integrity.rejection_threshold, 50);
        assert_eq!(policy.integrity.weights.null_island, 60);
        assert_eq!(policy.integrity.weights.coordinate_range, 100);
        assert!(policy.integrity.require_accuracy);
    }

    #[test]
    fn test_zero_threshold_is_invalid() {
        let mut policy = AttendancePolicy::default();
        policy.integrity.rejection_threshold = 0;
        assert!(matches!(
            policy.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_out_of_range_utc_offset_is_invalid() {
        let mut policy = AttendancePolicy::default();
        policy.service.utc_offset_minutes = 24 * 60;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_overflowing_utc_offset_is_invalid() {
        let mut policy = AttendancePolicy::default();
        policy.service.utc_offset_minutes = i32::MAX;
        assert!(policy.service.offset().is_none());
        assert!(matches!(
            policy.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_overflowing_utc_offset_falls_back_to_utc_day() {
        let policy = ServicePolicy {
            request_timeout_ms: 3000,
            utc_offset_minutes: i32::MIN,
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap();
        assert_eq!(
            policy.business_date(now),
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_clock_skew_beyond_chrono_range_is_invalid() {
        let mut policy = AttendancePolicy::default();
        policy.integrity.max_clock_skew_seconds = i64::MAX;
        assert!(matches!(
            policy.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
        assert_eq!(policy.integrity.max_clock_skew(), Duration::MAX);
    }

    #[test]
    fn test_config_rejects_unknown_site_reference() {
        let result = AttendanceConfig::new(
            AttendancePolicy::default(),
            vec![WorkLocation::new("hq", "Head Office", 9.0, 38.7)],
            vec![employee("emp_001", &["warehouse"])],
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_rejects_duplicate_site() {
        let result = AttendanceConfig::new(
            AttendancePolicy::default(),
            vec![
                WorkLocation::new("hq", "Head Office", 9.0, 38.7),
                WorkLocation::new("hq", "Other", 9.1, 38.8),
            ],
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_indexes_by_id() {
        let config = AttendanceConfig::new(
            AttendancePolicy::default(),
            vec![WorkLocation::new("hq", "Head Office", 9.0, 38.7)],
            vec![employee("emp_001", &["hq"])],
        )
        .unwrap();
        assert!(config.work_locations().contains_key("hq"));
        assert!(config.employees().contains_key("emp_001"));
    }
}
