use crate::models::{GeocodeResult, GeocodingStatus, PendingReferral, ProviderRecord, RawCoordinate, ReferralLocation};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Referral table access needed by the geocode batch job
pub trait ReferralStore {
    /// Referrals with a non-empty address that still need geocoding
    ///
    /// Without `force_refresh`, referrals already marked `failed` are left
    /// alone; they are only retried when an operator forces a refresh.
    fn pending_referrals(
        &self,
        force_refresh: bool,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<PendingReferral>, StoreError>> + Send;

    /// Persist the outcome of one resolution
    fn record_geocode_result(
        &self,
        referral_id: i64,
        result: &GeocodeResult,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Geocoding progress across all referrals with an address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodingSummary {
    pub total: i64,
    pub geocoded: i64,
    pub failed: i64,
}

impl GeocodingSummary {
    pub fn pending(&self) -> i64 {
        self.total - self.geocoded - self.failed
    }
}

/// PostgreSQL client for the referral and provider tables
///
/// Tables are owned by the intake CRM; this client only reads providers
/// and writes the geocoding columns of `referrals`. Column types are cast
/// in each query so `REAL`/`INTEGER` columns decode into `f64`/`i64`.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &crate::config::DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max: {} connections)",
            settings.max_connections.unwrap_or(10)
        );

        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Stored location of a referral, or `None` if the referral does not exist
    pub async fn get_referral_location(&self, referral_id: i64) -> Result<Option<ReferralLocation>, StoreError> {
        let query = r#"
            SELECT
                id::bigint AS id,
                latitude::float8 AS latitude,
                longitude::float8 AS longitude,
                geocoding_status,
                geocoded_at::timestamp AS geocoded_at
            FROM referrals
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(referral_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| referral_location_from_row(&row)).transpose()
    }

    /// Snapshot of all providers that have both coordinate columns filled
    ///
    /// Coordinates are read as text; the matcher decides which are usable.
    pub async fn list_providers(&self) -> Result<Vec<ProviderRecord>, StoreError> {
        let query = r#"
            SELECT
                id::bigint AS id,
                "DBA Name Billing Name" AS name,
                "Address 1 Full" AS address,
                "Provider Type" AS provider_type,
                "NPI" AS npi,
                "Latitude"::text AS latitude,
                "Longitude"::text AS longitude
            FROM providers
            WHERE "Latitude" IS NOT NULL AND "Longitude" IS NOT NULL
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let providers: Vec<ProviderRecord> = rows
            .iter()
            .map(|row| {
                Ok(ProviderRecord {
                    id: row.try_get("id")?,
                    name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
                    address: row.try_get("address")?,
                    provider_type: row.try_get("provider_type")?,
                    npi: row.try_get("npi")?,
                    latitude: row.try_get::<Option<String>, _>("latitude")?.map(RawCoordinate::Text),
                    longitude: row.try_get::<Option<String>, _>("longitude")?.map(RawCoordinate::Text),
                })
            })
            .collect::<Result<_, sqlx::Error>>()?;

        tracing::debug!("Loaded {} providers with coordinates", providers.len());

        Ok(providers)
    }

    /// Counts of geocoded, failed and total referrals with an address
    pub async fn geocoding_summary(&self) -> Result<GeocodingSummary, StoreError> {
        let query = r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE latitude IS NOT NULL AND longitude IS NOT NULL) AS geocoded,
                COUNT(*) FILTER (WHERE geocoding_status = 'failed') AS failed
            FROM referrals
            WHERE patient_address IS NOT NULL AND patient_address <> ''
        "#;

        let row = sqlx::query(query).fetch_one(&self.pool).await?;

        Ok(GeocodingSummary {
            total: row.try_get("total")?,
            geocoded: row.try_get("geocoded")?,
            failed: row.try_get("failed")?,
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

impl ReferralStore for PostgresClient {
    async fn pending_referrals(
        &self,
        force_refresh: bool,
        limit: Option<usize>,
    ) -> Result<Vec<PendingReferral>, StoreError> {
        let query = pending_referrals_query(force_refresh);

        let limit = match limit {
            Some(n) => Some(i64::try_from(n).map_err(|_| StoreError::InvalidInput(format!("limit {} too large", n)))?),
            None => None,
        };

        let rows = sqlx::query(query).bind(limit).fetch_all(&self.pool).await?;

        let pending = rows
            .iter()
            .map(|row| {
                Ok(PendingReferral {
                    id: row.try_get("id")?,
                    patient_address: row.try_get("patient_address")?,
                    patient_name: row.try_get("patient_name")?,
                    order_number: row.try_get("order_number")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!("Found {} referrals to geocode (force_refresh: {})", pending.len(), force_refresh);

        Ok(pending)
    }

    /// Success writes coordinates; failure only stamps status and time so
    /// previously stored coordinates survive a forced refresh that fails
    async fn record_geocode_result(&self, referral_id: i64, result: &GeocodeResult) -> Result<(), StoreError> {
        let status = result.status().as_str();

        let outcome = match result.point() {
            Some(point) => {
                let query = r#"
                    UPDATE referrals
                    SET latitude = $1, longitude = $2,
                        geocoded_at = NOW(),
                        geocoding_status = $3
                    WHERE id = $4
                "#;
                sqlx::query(query)
                    .bind(point.latitude)
                    .bind(point.longitude)
                    .bind(status)
                    .bind(referral_id)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                let query = r#"
                    UPDATE referrals
                    SET geocoded_at = NOW(),
                        geocoding_status = $1
                    WHERE id = $2
                "#;
                sqlx::query(query)
                    .bind(status)
                    .bind(referral_id)
                    .execute(&self.pool)
                    .await?
            }
        };

        if outcome.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Referral {} not found", referral_id)));
        }

        tracing::debug!("Recorded geocoding result for referral {}: {}", referral_id, status);

        Ok(())
    }
}

fn pending_referrals_query(force_refresh: bool) -> &'static str {
    if force_refresh {
        r#"
            SELECT id::bigint AS id, patient_address, patient_name, order_number
            FROM referrals
            WHERE patient_address IS NOT NULL
              AND patient_address <> ''
            ORDER BY id
            LIMIT $1
        "#
    } else {
        r#"
            SELECT id::bigint AS id, patient_address, patient_name, order_number
            FROM referrals
            WHERE patient_address IS NOT NULL
              AND patient_address <> ''
              AND (latitude IS NULL OR longitude IS NULL)
              AND geocoding_status IS DISTINCT FROM 'failed'
            ORDER BY id
            LIMIT $1
        "#
    }
}

fn referral_location_from_row(row: &PgRow) -> Result<ReferralLocation, StoreError> {
    let status: Option<String> = row.try_get("geocoding_status")?;
    let geocoded_at: Option<chrono::NaiveDateTime> = row.try_get("geocoded_at")?;

    Ok(ReferralLocation {
        id: row.try_get("id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        geocoding_status: status.as_deref().and_then(GeocodingStatus::parse),
        geocoded_at: geocoded_at.map(|t| t.and_utc()),
    })
}
