//! Pure validation passes for check-in/check-out readings.
//!
//! Geodesic distance, geofence validation against the employee's work
//! sites, and GPS integrity (anti-spoofing) scoring. Nothing here touches
//! shared state, so every function can run in parallel without locking.

mod distance;
mod geofence;
mod integrity;

pub use distance::{EARTH_RADIUS_METERS, distance_meters};
pub use geofence::{geofence_not_evaluated, validate_geofence};
pub use integrity::{
    CheckOutcome, INTEGRITY_CHECKS, IntegrityCheck, coordinates_plausible, run_integrity_checks,
    validate_integrity,
};
