use serde::Serialize;
use uuid::Uuid;

use super::Location;

/// Categorical code for a violation class. Ids are small and non-negative
/// but may be sparse and non-contiguous, so they are always used as map
/// keys, never as dense array indices.
pub type ViolationType = u32;

/// Categorical code for how serious a violation is. Only consumed as a
/// lookup label; the engine never derives severities.
pub type SeverityType = u32;

/// A persisted violation report as written by the report-creation flow and
/// read back in aggregate by the recommendation engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub user: Option<Uuid>,
    pub violation_type: ViolationType,
    /// Unix timestamp of the violation in seconds.
    pub time: i64,
    pub location: Location,
    pub severity: SeverityType,
    pub image_token: Option<String>,
}

impl Report {
    /// Creates a new report with a fresh identifier.
    pub fn create(
        user: Option<Uuid>,
        violation_type: ViolationType,
        time: i64,
        location: Location,
        severity: SeverityType,
        image_token: Option<String>,
    ) -> Self {
        Self { id: Uuid::new_v4(), user, violation_type, time, location, severity, image_token }
    }
}

/// A report returned by a k-nearest-neighbor query, annotated with its
/// distance in meters from the query point.
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyReport {
    pub violation_type: ViolationType,
    pub distance_m: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A report from a user's history, reduced to what temporal-pattern scoring
/// needs.
#[derive(Clone, Debug, PartialEq)]
pub struct UserReport {
    pub violation_type: ViolationType,
    /// Unix timestamp of the violation in seconds.
    pub time: i64,
}

/// One row of the ranked recommendation output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub violation_type: ViolationType,
    pub score: f64,
    pub severity: SeverityType,
}
