//! Configuration loading and management for the Attendance Engine.
//!
//! This module loads the attendance policy, work sites and employee
//! assignments from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/attendance").unwrap();
//! println!("Rejection threshold: {}", config.policy().integrity.rejection_threshold);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AttendanceConfig, AttendancePolicy, EmployeesConfig, IntegrityPolicy, IntegrityWeights,
    ServicePolicy, WorkLocationsConfig,
};
