use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("timestamp {0} is outside the representable range")]
    InvalidTimestamp(i64),
}

/// Failures surfaced by a report store backend. The engine never retries or
/// degrades on these; they propagate unchanged to the caller.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("report store query failed: {0}")]
    Query(String),
    #[error("report store decode failed: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RecommendationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
