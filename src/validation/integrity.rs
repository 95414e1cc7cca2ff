//! GPS integrity (anti-spoofing) validation.
//!
//! A reading is scored by an ordered list of named checks. Each check that
//! fires contributes its configured weight to the risk score and adds an
//! issue and a recommendation. The reading is rejected when the capped score
//! reaches the policy's rejection threshold.
//!
//! The current time is always a parameter, so the same `(reading, now)` pair
//! always produces the same result.

use chrono::{DateTime, Utc};

use crate::config::{IntegrityPolicy, IntegrityWeights};
use crate::models::{GpsIntegrityResult, GpsReading};

const MAX_RISK_SCORE: u32 = 100;

const RETRY_WITH_FRESH_FIX: &str = "Retry check-in with a fresh location fix";
const ENABLE_LOCATION: &str = "Enable location services and retry check-in";
const DISABLE_MOCK_LOCATION: &str = "Disable mock location apps and retry check-in";
const ENABLE_HIGH_ACCURACY: &str = "Ask employee to enable high-accuracy location";
const CHECK_DEVICE_CLOCK: &str = "Check the device clock and retry check-in";

/// The outcome of one integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Stable name of the check.
    pub name: &'static str,
    /// Whether the check fired.
    pub triggered: bool,
    /// Weight added to the risk score when triggered.
    pub weight: u8,
    /// Issue text when triggered, empty otherwise.
    pub issue: String,
    /// Recommendation when triggered, empty otherwise.
    pub recommendation: &'static str,
}

impl CheckOutcome {
    fn pass(name: &'static str) -> Self {
        Self {
            name,
            triggered: false,
            weight: 0,
            issue: String::new(),
            recommendation: "",
        }
    }

    fn fire(name: &'static str, weight: u8, issue: String, recommendation: &'static str) -> Self {
        Self {
            name,
            triggered: true,
            weight,
            issue,
            recommendation,
        }
    }
}

/// Signature shared by every integrity check.
pub type IntegrityCheck = fn(&GpsReading, DateTime<Utc>, &IntegrityPolicy) -> CheckOutcome;

/// The checks, in evaluation order.
pub const INTEGRITY_CHECKS: [IntegrityCheck; 8] = [
    check_missing_coordinates,
    check_coordinate_range,
    check_null_island,
    check_future_timestamp,
    check_stale_timestamp,
    check_implausible_accuracy,
    check_coarse_accuracy,
    check_missing_accuracy,
];

/// Runs every check and returns all outcomes, triggered or not.
pub fn run_integrity_checks(
    reading: &GpsReading,
    now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> Vec<CheckOutcome> {
    INTEGRITY_CHECKS
        .iter()
        .map(|check| check(reading, now, policy))
        .collect()
}

/// Scores a reading for signs of spoofing, replay or unusable precision.
///
/// # Examples
///
/// ```
/// use attendance_engine::config::IntegrityPolicy;
/// use attendance_engine::models::GpsReading;
/// use attendance_engine::validation::validate_integrity;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let policy = IntegrityPolicy::default();
///
/// let genuine = GpsReading::new(9.0005, 38.7, Some(15.0), now);
/// let result = validate_integrity(&genuine, now, &policy);
/// assert!(result.is_valid);
/// assert_eq!(result.risk_score, 0);
///
/// let spoofed = GpsReading::new(0.0, 0.0, Some(15.0), now);
/// let result = validate_integrity(&spoofed, now, &policy);
/// assert!(!result.is_valid);
/// ```
pub fn validate_integrity(
    reading: &GpsReading,
    now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> GpsIntegrityResult {
    let outcomes = run_integrity_checks(reading, now, policy);

    let total: u32 = outcomes
        .iter()
        .filter(|o| o.triggered)
        .map(|o| u32::from(o.weight))
        .sum();
    let risk_score = total.min(MAX_RISK_SCORE) as u8;

    let mut issues = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    for outcome in outcomes.into_iter().filter(|o| o.triggered) {
        issues.push(outcome.issue);
        if !recommendations.iter().any(|r| r == outcome.recommendation) {
            recommendations.push(outcome.recommendation.to_string());
        }
    }

    GpsIntegrityResult {
        is_valid: risk_score < policy.rejection_threshold,
        risk_score,
        issues,
        recommendations,
    }
}

/// Returns true when the reading's coordinates are usable for distance math.
///
/// False for missing, non-finite, out-of-range or `(0, 0)` coordinates.
pub fn coordinates_plausible(reading: &GpsReading) -> bool {
    match reading.coordinates() {
        Some((lat, lon)) => in_range(lat, lon) && !(lat == 0.0 && lon == 0.0),
        None => false,
    }
}

fn in_range(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

fn weights(policy: &IntegrityPolicy) -> &IntegrityWeights {
    &policy.weights
}

// =============================================================================
// Checks
// =============================================================================

fn check_missing_coordinates(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "missing_coordinates";
    if reading.coordinates().is_some() {
        return CheckOutcome::pass(NAME);
    }
    CheckOutcome::fire(
        NAME,
        weights(policy).missing_coordinates,
        "Location coordinates were not provided".to_string(),
        ENABLE_LOCATION,
    )
}

fn check_coordinate_range(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "coordinate_range";
    match reading.coordinates() {
        Some((lat, lon)) if !in_range(lat, lon) => CheckOutcome::fire(
            NAME,
            weights(policy).coordinate_range,
            format!("Coordinates ({}, {}) are outside valid ranges", lat, lon),
            RETRY_WITH_FRESH_FIX,
        ),
        _ => CheckOutcome::pass(NAME),
    }
}

fn check_null_island(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "null_island";
    match reading.coordinates() {
        Some((lat, lon)) if lat == 0.0 && lon == 0.0 => CheckOutcome::fire(
            NAME,
            weights(policy).null_island,
            "Coordinates at (0, 0) are a common spoofing default".to_string(),
            DISABLE_MOCK_LOCATION,
        ),
        _ => CheckOutcome::pass(NAME),
    }
}

fn check_future_timestamp(
    reading: &GpsReading,
    now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "future_timestamp";
    let ahead = reading.captured_at - now;
    if ahead <= policy.max_clock_skew() {
        return CheckOutcome::pass(NAME);
    }
    CheckOutcome::fire(
        NAME,
        weights(policy).future_timestamp,
        format!(
            "Location timestamp is {}s in the future",
            ahead.num_seconds()
        ),
        CHECK_DEVICE_CLOCK,
    )
}

fn check_stale_timestamp(
    reading: &GpsReading,
    now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "stale_timestamp";
    let age = now - reading.captured_at;
    if age <= policy.max_clock_skew() {
        return CheckOutcome::pass(NAME);
    }
    CheckOutcome::fire(
        NAME,
        weights(policy).stale_timestamp,
        format!(
            "Location was captured {}s before the request",
            age.num_seconds()
        ),
        RETRY_WITH_FRESH_FIX,
    )
}

fn check_implausible_accuracy(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "implausible_accuracy";
    match reading.accuracy_meters {
        Some(accuracy) if !accuracy.is_finite() || accuracy <= 0.0 => CheckOutcome::fire(
            NAME,
            weights(policy).implausible_accuracy,
            format!("Reported accuracy of {}m is implausible", accuracy),
            DISABLE_MOCK_LOCATION,
        ),
        _ => CheckOutcome::pass(NAME),
    }
}

fn check_coarse_accuracy(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "coarse_accuracy";
    match reading.accuracy_meters {
        Some(accuracy) if accuracy.is_finite() && accuracy > policy.max_accuracy_meters => {
            CheckOutcome::fire(
                NAME,
                weights(policy).coarse_accuracy,
                format!(
                    "Location accuracy of {:.0}m exceeds the {:.0}m limit",
                    accuracy, policy.max_accuracy_meters
                ),
                ENABLE_HIGH_ACCURACY,
            )
        }
        _ => CheckOutcome::pass(NAME),
    }
}

fn check_missing_accuracy(
    reading: &GpsReading,
    _now: DateTime<Utc>,
    policy: &IntegrityPolicy,
) -> CheckOutcome {
    const NAME: &str = "missing_accuracy";
    if !policy.require_accuracy || reading.accuracy_meters.is_some() {
        return CheckOutcome::pass(NAME);
    }
    CheckOutcome::fire(
        NAME,
        weights(policy).missing_accuracy,
        "Location accuracy was not reported".to_string(),
        ENABLE_HIGH_ACCURACY,
    )
}
