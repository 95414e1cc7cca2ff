//! Work location resolution.
//!
//! Employees are assigned to sites either through the modern multi-site list
//! or through the legacy single-site field. [`LocationAssignment`] folds both
//! shapes into one tagged value so nothing downstream branches on them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::AttendanceConfig;
use crate::error::EngineResult;
use crate::models::{Employee, WorkLocation};

/// How an employee is assigned to work sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAssignment<'a> {
    /// The modern multi-site list (non-empty).
    MultiSite(&'a [String]),
    /// The legacy single site.
    LegacySite(&'a str),
    /// No site at all.
    Unassigned,
}

impl<'a> LocationAssignment<'a> {
    /// Derives the assignment from an employee.
    ///
    /// A non-empty multi-site list takes precedence over the legacy field.
    pub fn of(employee: &'a Employee) -> Self {
        if !employee.work_location_ids.is_empty() {
            return LocationAssignment::MultiSite(&employee.work_location_ids);
        }
        match employee.legacy_work_location_id.as_deref() {
            Some(id) => LocationAssignment::LegacySite(id),
            None => LocationAssignment::Unassigned,
        }
    }

    /// The assigned site ids, in assignment order.
    pub fn site_ids(&self) -> Vec<&'a str> {
        match self {
            LocationAssignment::MultiSite(ids) => ids.iter().map(String::as_str).collect(),
            LocationAssignment::LegacySite(id) => vec![id],
            LocationAssignment::Unassigned => Vec::new(),
        }
    }
}

/// Port for employee and work site lookup.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Looks up an employee by id.
    async fn employee(&self, employee_id: &str) -> EngineResult<Option<Employee>>;

    /// Looks up a work site by id.
    async fn work_location(&self, location_id: &str) -> EngineResult<Option<WorkLocation>>;
}

/// Directory backed by the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    employees: HashMap<String, Employee>,
    work_locations: HashMap<String, WorkLocation>,
}

impl MemoryDirectory {
    /// Creates a directory from explicit employees and sites.
    pub fn new(employees: Vec<Employee>, work_locations: Vec<WorkLocation>) -> Self {
        Self {
            employees: employees.into_iter().map(|e| (e.id.clone(), e)).collect(),
            work_locations: work_locations
                .into_iter()
                .map(|l| (l.id.clone(), l))
                .collect(),
        }
    }

    /// Creates a directory holding everything in the configuration.
    pub fn from_config(config: &AttendanceConfig) -> Self {
        Self {
            employees: config.employees().clone(),
            work_locations: config.work_locations().clone(),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn employee(&self, employee_id: &str) -> EngineResult<Option<Employee>> {
        Ok(self.employees.get(employee_id).cloned())
    }

    async fn work_location(&self, location_id: &str) -> EngineResult<Option<WorkLocation>> {
        Ok(self.work_locations.get(location_id).cloned())
    }
}

/// Resolves an employee to the work sites they may check in at.
#[derive(Clone)]
pub struct WorkLocationResolver {
    directory: Arc<dyn EmployeeDirectory>,
}

impl WorkLocationResolver {
    /// Creates a resolver over a directory.
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Returns the employee's eligible sites.
    ///
    /// An unassigned employee yields an empty list, not an error. Only a
    /// directory failure is propagated. Unknown site ids are skipped.
    pub async fn resolve(&self, employee: &Employee) -> EngineResult<Vec<WorkLocation>> {
        let assignment = LocationAssignment::of(employee);
        let mut sites = Vec::new();
        for site_id in assignment.site_ids() {
            match self.directory.work_location(site_id).await? {
                Some(site) => sites.push(site),
                None => warn!(
                    employee_id = %employee.id,
                    work_location_id = %site_id,
                    "Skipping unknown work location"
                ),
            }
        }
        Ok(sites)
    }
}
