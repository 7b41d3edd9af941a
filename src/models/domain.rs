use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated latitude/longitude pair in degrees
///
/// A `GeoPoint` only exists when both coordinates are finite and within
/// range. Nullable storage fields go through [`GeoPoint::from_nullable`] or
/// [`GeoPoint::from_raw`], which yield `None` unless both halves are usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);

        if lat_ok && lon_ok {
            Some(Self { latitude, longitude })
        } else {
            None
        }
    }

    /// Build a point from nullable numeric columns
    pub fn from_nullable(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Self::new(latitude?, longitude?)
    }

    /// Build a point from coordinates that may be stored as text
    pub fn from_raw(latitude: Option<&RawCoordinate>, longitude: Option<&RawCoordinate>) -> Option<Self> {
        Self::new(latitude?.to_degrees()?, longitude?.to_degrees()?)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A coordinate as it arrives from a collaborator table
///
/// Provider coordinates are not guaranteed to be numeric in the source data,
/// so they are carried raw and converted at matching time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    /// Degrees as a finite float, or `None` if the value does not convert
    pub fn to_degrees(&self) -> Option<f64> {
        let value = match self {
            RawCoordinate::Number(n) => *n,
            RawCoordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        };

        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawCoordinate {
    fn from(value: f64) -> Self {
        RawCoordinate::Number(value)
    }
}

impl From<&str> for RawCoordinate {
    fn from(value: &str) -> Self {
        RawCoordinate::Text(value.to_string())
    }
}

/// Provider directory entry
///
/// Reference data: the matcher reads it and never writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "providerType", default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub npi: Option<String>,
    #[serde(default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(default)]
    pub longitude: Option<RawCoordinate>,
}

impl ProviderRecord {
    /// The provider's location, if both coordinates are usable
    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::from_raw(self.latitude.as_ref(), self.longitude.as_ref())
    }
}

/// A provider paired with its distance from one query point
///
/// Built per request and discarded with the response.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch<'a> {
    pub provider: &'a ProviderRecord,
    pub location: GeoPoint,
    #[serde(rename = "distanceMiles")]
    pub distance_miles: f64,
}

/// Referral fields needed by the geocode batch job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReferral {
    pub id: i64,
    pub patient_address: String,
    pub patient_name: Option<String>,
    pub order_number: Option<String>,
}

/// Stored location of a referral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralLocation {
    pub id: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocoding_status: Option<GeocodingStatus>,
    pub geocoded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ReferralLocation {
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::from_nullable(self.latitude, self.longitude)
    }
}

/// Persisted outcome tag; a NULL column means "not yet attempted"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodingStatus {
    Success,
    Failed,
}

impl GeocodingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocodingStatus::Success => "success",
            GeocodingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(GeocodingStatus::Success),
            "failed" => Some(GeocodingStatus::Failed),
            _ => None,
        }
    }
}

/// Why a resolution produced no coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    EmptyAddress,
    Exhausted { candidates: usize },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::EmptyAddress => write!(f, "empty address"),
            FailureReason::Exhausted { candidates } => {
                write!(f, "all {} fallback candidates exhausted", candidates)
            }
        }
    }
}

/// Outcome of one address resolution
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Resolved {
        point: GeoPoint,
        /// Address text reported by the geocoding service
        matched_address: String,
        /// Candidate string that produced the match
        query: String,
        /// Zero-based position of `query` in the fallback cascade
        tier: usize,
    },
    Failed(FailureReason),
}

impl GeocodeResult {
    pub fn status(&self) -> GeocodingStatus {
        match self {
            GeocodeResult::Resolved { .. } => GeocodingStatus::Success,
            GeocodeResult::Failed(_) => GeocodingStatus::Failed,
        }
    }

    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            GeocodeResult::Resolved { point, .. } => Some(*point),
            GeocodeResult::Failed(_) => None,
        }
    }
}

/// A location returned by the geocoding service
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub point: GeoPoint,
    pub display_address: String,
}
