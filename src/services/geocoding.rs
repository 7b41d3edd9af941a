use crate::models::GeocodedLocation;
use std::future::Future;
use thiserror::Error;

/// Failure classes a geocoding service can report
///
/// "No results" is not an error: it is `Ok(None)` from
/// [`GeocodingService::geocode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodingError {
    #[error("Rate limited by geocoding service")]
    RateLimited,

    #[error("Geocoding request timed out")]
    TimedOut,

    #[error("Geocoding service unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected geocoding error: {0}")]
    Unexpected(String),
}

/// A free-text forward geocoder returning at most one location
pub trait GeocodingService {
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<GeocodedLocation>, GeocodingError>> + Send;
}
