//! Employee model and related types.
//!
//! The engine only reads employees; they are owned by HR administration.

use serde::{Deserialize, Serialize};

/// The role of an employee, as far as attendance is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    /// A regular employee who checks in and out.
    #[default]
    Employee,
    /// An employee allowed to correct attendance records.
    Supervisor,
}

/// Represents an employee and their work site assignments.
///
/// Sites may be assigned through the modern `work_location_ids` list or
/// through the legacy single `legacy_work_location_id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Attendance role.
    #[serde(default)]
    pub role: EmployeeRole,
    /// Ordered list of assigned work location ids.
    #[serde(default)]
    pub work_location_ids: Vec<String>,
    /// Single work location id from the legacy assignment model.
    #[serde(default)]
    pub legacy_work_location_id: Option<String>,
}

impl Employee {
    /// Returns true if the employee may correct attendance records.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::{Employee, EmployeeRole};
    ///
    /// let supervisor = Employee {
    ///     id: "sup_001".to_string(),
    ///     name: "Abebe".to_string(),
    ///     role: EmployeeRole::Supervisor,
    ///     work_location_ids: vec![],
    ///     legacy_work_location_id: None,
    /// };
    /// assert!(supervisor.is_supervisor());
    /// ```
    pub fn is_supervisor(&self) -> bool {
        self.role == EmployeeRole::Supervisor
    }
}
