// Service exports
pub mod cache;
pub mod geocoding;
pub mod nominatim;
pub mod postgres;

pub use cache::{CacheStats, ProviderCache};
pub use geocoding::{GeocodingError, GeocodingService};
pub use nominatim::NominatimClient;
pub use postgres::{GeocodingSummary, PostgresClient, ReferralStore, StoreError};
