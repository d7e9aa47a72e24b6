//! Radial basis weighting and time-of-day normalization.

use chrono::Timelike;

use crate::errors::DomainError;

/// Inverse quadratic RBF: `1 / (1 + e²r²)`.
///
/// Monotonically decreasing in `|r|`; only the magnitudes of `e` and `r`
/// matter. The denominator is always >= 1, so no division guard is needed.
pub fn inverse_quadratic(e: f64, r: f64) -> f64 {
    1.0 / (1.0 + e * e * r * r)
}

/// Inverse multi-quadratic RBF: `1 / sqrt(1 + e²r²)`.
///
/// Same family as [`inverse_quadratic`] with a slower decay; used for
/// temporal rather than spatial weighting.
pub fn inverse_multi_quadratic(e: f64, r: f64) -> f64 {
    1.0 / (1.0 + e * e * r * r).sqrt()
}

/// Seconds since midnight UTC for a Unix timestamp, in `[0, 86399]`.
///
/// Lets temporal matching ignore the date and compare only time-of-day
/// proximity. The value does not wrap around midnight: 23:59 and 00:01 are
/// ~86398 seconds apart, not 2. That is a known modeling limitation and is
/// kept as-is because downstream scores depend on it.
pub fn seconds_since_midnight(unix_secs: i64) -> Result<u32, DomainError> {
    let datetime = chrono::DateTime::from_timestamp(unix_secs, 0)
        .ok_or(DomainError::InvalidTimestamp(unix_secs))?;
    Ok(datetime.time().num_seconds_from_midnight())
}
