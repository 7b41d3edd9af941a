//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows one request per second per client; pacing is
//! the resolver's job, this client only issues single requests.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::models::{GeoPoint, GeocodedLocation};
use crate::services::geocoding::{GeocodingError, GeocodingService};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "intake-crm-geocoder/1.0";

/// Nominatim HTTP client
pub struct NominatimClient {
    base_url: String,
    user_agent: String,
    client: Client,
}

impl NominatimClient {
    /// Create a new Nominatim client
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodingError> {
        let user_agent = user_agent.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.clone())
            .build()
            .map_err(|e| GeocodingError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            user_agent,
            client,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=jsonv2&addressdetails=1&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }
}

impl GeocodingService for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedLocation>, GeocodingError> {
        let url = self.search_url(query);

        tracing::debug!("Geocoding via: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GeocodingError::Unexpected(format!("Invalid response body: {}", e)))?;

        parse_response(&body)
    }
}

fn classify_transport_error(err: reqwest::Error) -> GeocodingError {
    if err.is_timeout() {
        GeocodingError::TimedOut
    } else if err.is_connect() {
        GeocodingError::Unavailable(err.to_string())
    } else {
        GeocodingError::Unexpected(err.to_string())
    }
}

fn classify_status(status: StatusCode) -> GeocodingError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GeocodingError::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GeocodingError::TimedOut,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            GeocodingError::Unavailable(format!("HTTP {}", status))
        }
        other => GeocodingError::Unexpected(format!("HTTP {}", other)),
    }
}

/// Parses a Nominatim `jsonv2` search response
fn parse_response(body: &Value) -> Result<Option<GeocodedLocation>, GeocodingError> {
    let results = body
        .as_array()
        .ok_or_else(|| GeocodingError::Unexpected("Nominatim response is not an array".into()))?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = coordinate_field(first, "lat")?;
    let lon = coordinate_field(first, "lon")?;

    let point = GeoPoint::new(lat, lon).ok_or_else(|| {
        GeocodingError::Unexpected(format!("Coordinates out of range: {}, {}", lat, lon))
    })?;

    let display_address = first
        .get("display_name")
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Some(GeocodedLocation {
        point,
        display_address,
    }))
}

fn coordinate_field(result: &Value, field: &str) -> Result<f64, GeocodingError> {
    result
        .get(field)
        .and_then(|v| match v {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .ok_or_else(|| GeocodingError::Unexpected(format!("Missing {} in Nominatim response", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> NominatimClient {
        NominatimClient::new(server.url(), "intake-geo-tests/1.0", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parses_result() {
        let body = serde_json::json!([{
            "lat": "39.7817",
            "lon": "-89.6501",
            "display_name": "Springfield, Sangamon County, Illinois, United States"
        }]);

        let location = parse_response(&body).unwrap().unwrap();
        assert!((location.point.latitude - 39.7817).abs() < 1e-9);
        assert!((location.point.longitude - -89.6501).abs() < 1e-9);
        assert!(location.display_address.starts_with("Springfield"));
    }

    #[test]
    fn test_parses_empty() {
        assert!(parse_response(&serde_json::json!([])).unwrap().is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_response(&serde_json::json!({"error": "x"})).is_err());
        assert!(parse_response(&serde_json::json!([{"lat": "abc", "lon": "1"}])).is_err());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), GeocodingError::RateLimited);
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), GeocodingError::TimedOut);
        assert!(matches!(classify_status(StatusCode::SERVICE_UNAVAILABLE), GeocodingError::Unavailable(_)));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN), GeocodingError::Unexpected(_)));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let client = NominatimClient::new("https://geo.test/", DEFAULT_USER_AGENT, Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.search_url("Springfield, IL 62704"),
            "https://geo.test/search?q=Springfield%2C%20IL%2062704&format=jsonv2&addressdetails=1&limit=1"
        );
    }

    #[tokio::test]
    async fn test_geocode_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "Springfield, IL".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .match_header("user-agent", "intake-geo-tests/1.0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat":"39.8","lon":"-89.65","display_name":"Springfield, IL"}]"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let location = tokio_test::assert_ok!(client.geocode("Springfield, IL").await);

        assert_eq!(location.unwrap().display_address, "Springfield, IL");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_geocode_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = tokio_test::assert_err!(client.geocode("anything").await);
        assert_eq!(err, GeocodingError::RateLimited);
    }
}
