use serde::{Deserialize, Serialize};
use crate::models::domain::{GeoPoint, RankedMatch};

/// Response for the nearest-provider endpoint
#[derive(Debug, Clone, Serialize)]
pub struct NearestProvidersResponse<'a> {
    #[serde(rename = "referralId")]
    pub referral_id: i64,
    /// `None` when the referral has no usable coordinates
    pub reference: Option<GeoPoint>,
    pub providers: Vec<RankedMatch<'a>>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "validCandidates")]
    pub valid_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
