use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters for the nearest-provider lookup
///
/// `limit` may only narrow the configured shortlist size, never widen it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NearestProvidersQuery {
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}
