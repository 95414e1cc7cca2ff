//! Work location model.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Radius applied when a work location does not declare one.
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

fn default_radius() -> f64 {
    DEFAULT_RADIUS_METERS
}

/// A physical work site with a circular geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLocation {
    /// Unique identifier for the site.
    pub id: String,
    /// Human-readable site name, used in geofence messages.
    pub name: String,
    /// Latitude of the site center in degrees.
    pub latitude: f64,
    /// Longitude of the site center in degrees.
    pub longitude: f64,
    /// Geofence radius in meters.
    #[serde(default = "default_radius")]
    pub radius_meters: f64,
}

impl WorkLocation {
    /// Creates a work location with the default radius.
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }

    /// Returns a copy with the given radius.
    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Checks that the coordinates are in range and the radius is positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::WorkLocation;
    ///
    /// let site = WorkLocation::new("hq", "Head Office", 9.0, 38.7);
    /// assert!(site.validate().is_ok());
    /// assert!(site.with_radius(0.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "work location '{}' has non-positive radius {}",
                    self.id, self.radius_meters
                ),
            });
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "work location '{}' has out-of-range coordinates ({}, {})",
                    self.id, self.latitude, self.longitude
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_defaults_to_100_meters() {
        let yaml = r#"
id: hq
name: Head Office
latitude: 9.0
longitude: 38.7
"#;
        let site: WorkLocation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(site.radius_meters, 100.0);
    }

    #[test]
    fn test_negative_radius_is_invalid() {
        let site = WorkLocation::new("hq", "Head Office", 9.0, 38.7).with_radius(-5.0);
        assert!(matches!(
            site.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_nan_radius_is_invalid() {
        let site = WorkLocation::new("hq", "Head Office", 9.0, 38.7).with_radius(f64::NAN);
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_out_of_range_latitude_is_invalid() {
        let site = WorkLocation::new("hq", "Head Office", 91.0, 38.7);
        assert!(site.validate().is_err());
    }
}
