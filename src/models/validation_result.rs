//! Validation result models.
//!
//! These are produced by the geofence and GPS integrity validators and
//! embedded, unchanged, into the daily attendance record.

use serde::{Deserialize, Serialize};

use super::WorkLocation;

/// Why a geofence validation ended the way it did.
///
/// Distinguishes "no sites assigned" from "too far from an assigned site"
/// by type rather than by message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceStatus {
    /// The reading is within the radius of the nearest site.
    Inside,
    /// The nearest site is farther than its radius.
    OutOfRange,
    /// The employee has no eligible site.
    NoSitesAssigned,
    /// The reading carried no coordinates.
    NoLocationProvided,
    /// Distance math was skipped because the coordinates were already rejected.
    NotEvaluated,
}

/// The outcome of checking a reading against the employee's work sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceValidationResult {
    /// Whether the reading is inside the nearest site's geofence.
    pub is_valid: bool,
    /// Distance to the nearest site in meters, when computed.
    pub distance_meters: Option<f64>,
    /// The nearest site, when any site was considered.
    pub nearest_location: Option<WorkLocation>,
    /// Human-readable explanation.
    pub message: String,
    /// Machine-readable outcome.
    pub status: GeofenceStatus,
}

/// The outcome of the anti-spoofing pass over a reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsIntegrityResult {
    /// Whether the risk score is below the rejection threshold.
    pub is_valid: bool,
    /// Aggregated risk score in `0..=100`.
    pub risk_score: u8,
    /// Issues raised by the checks that fired, in check order.
    pub issues: Vec<String>,
    /// Suggested next actions, deduplicated, in check order.
    pub recommendations: Vec<String>,
}
