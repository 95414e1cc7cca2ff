//! Application state for the Attendance Engine API.

use std::sync::Arc;

use crate::attendance::AttendanceService;
use crate::config::ConfigLoader;

/// Shared application state.
///
/// Holds the attendance service every handler delegates to.
#[derive(Clone)]
pub struct AppState {
    service: Arc<AttendanceService>,
}

impl AppState {
    /// Creates a state around an existing service.
    pub fn new(service: AttendanceService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a self-contained state from loaded configuration.
    pub fn from_config(config: &ConfigLoader) -> Self {
        Self::new(AttendanceService::in_memory(config.config()))
    }

    /// Returns the attendance service.
    pub fn service(&self) -> &AttendanceService {
        &self.service
    }
}
