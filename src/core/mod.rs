// Core algorithm exports
pub mod distance;
pub mod fallback;
pub mod matcher;
pub mod resolver;
pub mod retry;

pub use distance::{distance_miles, haversine_distance, EARTH_RADIUS_MILES};
pub use fallback::{fallback_candidates, strip_unit, AddressQuery};
pub use matcher::{MatchResult, Matcher, DEFAULT_MAX_RESULTS};
pub use resolver::{GeocodingResolver, ResolverStats};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
