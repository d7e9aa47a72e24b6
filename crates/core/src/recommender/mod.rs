//! Violation-type recommendation engine.
//!
//! Combines three independent signals over past reports — global violation
//! frequency, spatial proximity, and the reporting user's time-of-day
//! pattern — into one ranked list of violation types, each annotated with
//! its most commonly observed severity.

mod engine;
mod list;
pub mod rbf;

pub use engine::{most_common_scores, sum_up_weights, Recommender, Tuning};
pub use list::RecommendationList;

use crate::errors::RecommendationError;

/// Result type for recommendation operations.
pub type RecommendationResult<T> = Result<T, RecommendationError>;

/// Multiplier for the global-frequency prior. Deliberately small; it mostly
/// breaks ties between otherwise unscored types.
pub const COMMON_MULTIPLIER: f64 = 0.01;

/// Multiplier for the location-proximity signal, the dominant one.
pub const LOCATION_MULTIPLIER: f64 = 1.56;

/// Multiplier for the user time-of-day history signal.
pub const USER_MULTIPLIER: f64 = 0.44;

/// Shape parameter for spatial inverse-quadratic weighting (distance in
/// meters).
pub const LOCATION_SHAPE: f64 = 0.1;

/// Shape parameter for temporal inverse-multi-quadratic weighting (distance
/// in seconds of time-of-day).
pub const USER_SHAPE: f64 = 0.008;

/// Radius in meters used to estimate local report density.
pub const NEAR_RADIUS_M: f64 = 50.0;

/// Maximum radius in meters for the k-nearest-neighbor search.
pub const WIDE_RADIUS_M: f64 = 2000.0;

/// Fixed floor added to the local density count to size the neighborhood.
pub const REPORTS_AROUND: u64 = 200;
