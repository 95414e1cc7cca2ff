//! GPS reading model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A location reading reported by the employee's device.
///
/// Coordinates are optional so that a request without a position can still
/// be represented and rejected with a precise reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsReading {
    /// Reported latitude in degrees.
    pub latitude: Option<f64>,
    /// Reported longitude in degrees.
    pub longitude: Option<f64>,
    /// Reported horizontal accuracy radius in meters.
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
    /// When the device captured the fix.
    pub captured_at: DateTime<Utc>,
}

impl GpsReading {
    /// Creates a reading with both coordinates present.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            accuracy_meters,
            captured_at,
        }
    }

    /// Returns `(latitude, longitude)` when both are present.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::GpsReading;
    /// use chrono::Utc;
    ///
    /// let reading = GpsReading::new(9.0005, 38.7, Some(15.0), Utc::now());
    /// assert_eq!(reading.coordinates(), Some((9.0005, 38.7)));
    /// ```
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_missing_longitude() {
        let reading = GpsReading {
            latitude: Some(9.0),
            longitude: None,
            accuracy_meters: None,
            captured_at: Utc::now(),
        };
        assert_eq!(reading.coordinates(), None);
    }
}
