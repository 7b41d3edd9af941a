// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    FailureReason, GeoPoint, GeocodeResult, GeocodedLocation, GeocodingStatus, PendingReferral,
    ProviderRecord, RankedMatch, RawCoordinate, ReferralLocation,
};
pub use requests::NearestProvidersQuery;
pub use responses::{ErrorResponse, HealthResponse, NearestProvidersResponse};
