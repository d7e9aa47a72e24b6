use serde::Serialize;

use crate::errors::DomainError;

/// A validated geolocation. Construction is the only way to obtain one, so
/// every `Location` handed to a query carries in-range, finite coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !Self::is_latitude(latitude) || !Self::is_longitude(longitude) {
            return Err(DomainError::InvalidCoordinates { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    pub fn is_latitude(value: f64) -> bool {
        value.is_finite() && (-90.0..=90.0).contains(&value)
    }

    pub fn is_longitude(value: f64) -> bool {
        value.is_finite() && (-180.0..=180.0).contains(&value)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
