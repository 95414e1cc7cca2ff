//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading attendance
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{AttendanceConfig, AttendancePolicy, EmployeesConfig, WorkLocationsConfig};

/// Loads and provides access to attendance configuration.
///
/// # Directory Structure
///
/// ```text
/// config/attendance/
/// ├── policy.yaml          # Integrity thresholds, request deadline, business day offset
/// ├── work_locations.yaml  # Work sites and their geofence radii
/// └── employees.yaml       # Employees and their site assignments
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/attendance")?;
/// let sites = loader.config().work_locations().len();
/// println!("Loaded {} work sites", sites);
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AttendanceConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if a file is missing, contains invalid YAML, or
    /// describes an inconsistent configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<AttendancePolicy>(&path.join("policy.yaml"))?;
        let work_locations =
            Self::load_yaml::<WorkLocationsConfig>(&path.join("work_locations.yaml"))?;
        let employees = Self::load_yaml::<EmployeesConfig>(&path.join("employees.yaml"))?;

        let config = AttendanceConfig::new(
            policy,
            work_locations.work_locations,
            employees.employees,
        )?;

        tracing::info!(
            path = %path.display(),
            work_locations = config.work_locations().len(),
            employees = config.employees().len(),
            "Loaded attendance configuration"
        );

        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: AttendanceConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Returns the policy.
    pub fn policy(&self) -> &AttendancePolicy {
        self.config.policy()
    }
}
