//! Geofence validation.
//!
//! Checks a GPS reading against the employee's eligible work sites: the
//! nearest site is selected and the reading is accepted when it lies within
//! that site's radius.

use crate::models::{GeofenceStatus, GeofenceValidationResult, GpsReading, WorkLocation};

use super::distance_meters;

/// Validates a reading against a set of candidate work sites.
///
/// The nearest site is selected (the first one seen wins exact ties) and the
/// reading is valid when its distance is less than or equal to that site's
/// radius.
///
/// Two failure shapes are kept apart from "out of range":
/// - an empty `locations` slice yields [`GeofenceStatus::NoSitesAssigned`]
///   with no nearest location;
/// - a reading without coordinates yields
///   [`GeofenceStatus::NoLocationProvided`] without any distance math.
///
/// # Examples
///
/// ```
/// use attendance_engine::models::{GeofenceStatus, GpsReading, WorkLocation};
/// use attendance_engine::validation::validate_geofence;
/// use chrono::Utc;
///
/// let hq = WorkLocation::new("hq", "Head Office", 9.0, 38.7);
/// let reading = GpsReading::new(9.0005, 38.7, Some(15.0), Utc::now());
///
/// let result = validate_geofence(&reading, &[hq]);
/// assert!(result.is_valid);
/// assert_eq!(result.status, GeofenceStatus::Inside);
///
/// let result = validate_geofence(&reading, &[]);
/// assert!(!result.is_valid);
/// assert_eq!(result.status, GeofenceStatus::NoSitesAssigned);
/// ```
pub fn validate_geofence(
    reading: &GpsReading,
    locations: &[WorkLocation],
) -> GeofenceValidationResult {
    let Some((latitude, longitude)) = reading.coordinates() else {
        return GeofenceValidationResult {
            is_valid: false,
            distance_meters: None,
            nearest_location: None,
            message: "No location provided".to_string(),
            status: GeofenceStatus::NoLocationProvided,
        };
    };

    let mut nearest: Option<(&WorkLocation, f64)> = None;
    for location in locations {
        let distance = distance_meters(latitude, longitude, location.latitude, location.longitude);
        match nearest {
            Some((_, best)) if distance >= best => {}
            _ => nearest = Some((location, distance)),
        }
    }

    let Some((site, distance)) = nearest else {
        return GeofenceValidationResult {
            is_valid: false,
            distance_meters: None,
            nearest_location: None,
            message: "No work location assigned".to_string(),
            status: GeofenceStatus::NoSitesAssigned,
        };
    };

    let is_valid = distance <= site.radius_meters;
    let (message, status) = if is_valid {
        (
            format!(
                "Within {:.0}m of {} (allowed radius {:.0}m)",
                distance, site.name, site.radius_meters
            ),
            GeofenceStatus::Inside,
        )
    } else {
        (
            format!(
                "You are {:.0}m from {}. You must be within {:.0}m of the site",
                distance, site.name, site.radius_meters
            ),
            GeofenceStatus::OutOfRange,
        )
    };

    GeofenceValidationResult {
        is_valid,
        distance_meters: Some(distance),
        nearest_location: Some(site.clone()),
        message,
        status,
    }
}

/// Builds a result for a reading whose geofence check was not run.
///
/// Used when the integrity pass already rejected the coordinates themselves,
/// so no distance math is attempted against them.
pub fn geofence_not_evaluated(reason: impl Into<String>) -> GeofenceValidationResult {
    GeofenceValidationResult {
        is_valid: false,
        distance_meters: None,
        nearest_location: None,
        message: reason.into(),
        status: GeofenceStatus::NotEvaluated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(latitude: f64, longitude: f64) -> GpsReading {
        GpsReading::new(latitude, longitude, Some(10.0), Utc::now())
    }

    fn head_office() -> WorkLocation {
        WorkLocation::new("hq", "Head Office", 9.0, 38.7)
    }

    // ==========================================================================
    // Inside / out of range
    // ==========================================================================

    #[test]
    fn test_reading_55m_away_is_inside_100m_radius() {
        let result = validate_geofence(&reading(9.0005, 38.7), &[head_office()]);

        assert!(result.is_valid);
        assert_eq!(result.status, GeofenceStatus::Inside);
        let distance = result.distance_meters.unwrap();
        assert!((distance - 55.6).abs() < 0.1);
        assert_eq!(result.nearest_location.unwrap().id, "hq");
        assert!(result.message.contains("Head Office"));
    }

    #[test]
    fn test_reading_far_away_is_out_of_range() {
        let result = validate_geofence(&reading(9.01, 38.7), &[head_office()]);

        assert!(!result.is_valid);
        assert_eq!(result.status, GeofenceStatus::OutOfRange);
        assert!(result.distance_meters.unwrap() > 1000.0);
        assert!(result.message.contains("1112m"), "{}", result.message);
        assert!(result.message.contains("within 100m"), "{}", result.message);
    }

    #[test]
    fn test_boundary_exactly_at_radius_is_accepted() {
        let probe = reading(9.0005, 38.7);
        let distance = distance_meters(9.0005, 38.7, 9.0, 38.7);

        let at_radius = head_office().with_radius(distance);
        assert!(validate_geofence(&probe, &[at_radius]).is_valid);

        let just_inside = head_office().with_radius(distance - 1e-6);
        assert!(!validate_geofence(&probe, &[just_inside]).is_valid);
    }

    // ==========================================================================
    // Nearest site selection
    // ==========================================================================

    #[test]
    fn test_nearest_site_is_selected() {
        let far = WorkLocation::new("far", "Far Site", 9.05, 38.7);
        let near = WorkLocation::new("near", "Near Site", 9.0002, 38.7);

        let result = validate_geofence(&reading(9.0, 38.7), &[far, near]);

        assert!(result.is_valid);
        assert_eq!(result.nearest_location.unwrap().id, "near");
    }

    #[test]
    fn test_nearest_site_uses_its_own_radius() {
        // nearest site has a small radius, a farther one a large radius
        let small = WorkLocation::new("small", "Kiosk", 9.001, 38.7).with_radius(50.0);
        let large = WorkLocation::new("large", "Campus", 9.002, 38.7).with_radius(1000.0);

        let result = validate_geofence(&reading(9.0, 38.7), &[small, large]);

        assert!(!result.is_valid);
        assert_eq!(result.nearest_location.unwrap().id, "small");
    }

    #[test]
    fn test_exact_tie_keeps_first_seen() {
        // two site records sharing one position
        let gate_a = WorkLocation::new("gate_a", "Gate A", 9.001, 38.7);
        let gate_b = WorkLocation::new("gate_b", "Gate B", 9.001, 38.7);

        let result = validate_geofence(&reading(9.0, 38.7), &[gate_a.clone(), gate_b.clone()]);
        assert_eq!(result.nearest_location.unwrap().id, "gate_a");

        let result = validate_geofence(&reading(9.0, 38.7), &[gate_b, gate_a]);
        assert_eq!(result.nearest_location.unwrap().id, "gate_b");
    }

    // ==========================================================================
    // Distinct failure shapes
    // ==========================================================================

    #[test]
    fn test_no_sites_differs_from_out_of_range() {
        let no_sites = validate_geofence(&reading(9.0, 38.7), &[]);
        let out_of_range = validate_geofence(&reading(10.0, 38.7), &[head_office()]);

        assert!(!no_sites.is_valid);
        assert!(!out_of_range.is_valid);
        assert_eq!(no_sites.status, GeofenceStatus::NoSitesAssigned);
        assert_eq!(out_of_range.status, GeofenceStatus::OutOfRange);
        assert!(no_sites.nearest_location.is_none());
        assert!(no_sites.distance_meters.is_none());
        assert!(out_of_range.nearest_location.is_some());
        assert_ne!(no_sites.message, out_of_range.message);
    }

    #[test]
    fn test_missing_coordinates_short_circuits() {
        let reading = GpsReading {
            latitude: None,
            longitude: Some(38.7),
            accuracy_meters: None,
            captured_at: Utc::now(),
        };

        let result = validate_geofence(&reading, &[head_office()]);

        assert!(!result.is_valid);
        assert_eq!(result.status, GeofenceStatus::NoLocationProvided);
        assert_eq!(result.message, "No location provided");
        assert!(result.distance_meters.is_none());
        assert!(result.nearest_location.is_none());
    }

    #[test]
    fn test_not_evaluated_result() {
        let result = geofence_not_evaluated("Coordinates rejected by integrity check");
        assert!(!result.is_valid);
        assert_eq!(result.status, GeofenceStatus::NotEvaluated);
    }
}
