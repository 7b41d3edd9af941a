use crate::core::{GeocodingResolver, ResolverStats};
use crate::models::{GeocodeResult, PendingReferral};
use crate::services::{GeocodingService, ReferralStore, StoreError};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// Errors that abort a geocode run
///
/// A referral that cannot be geocoded is not an error; it is recorded as
/// `failed` and the run moves on.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to load referrals: {0}")]
    LoadFailed(#[source] StoreError),

    #[error("Failed to record result for referral {referral_id}: {source}")]
    RecordFailed {
        referral_id: i64,
        #[source]
        source: StoreError,
    },
}

/// Options for one geocode run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOptions {
    /// Re-geocode every referral with an address, including failed ones
    pub force_refresh: bool,
    pub limit: Option<usize>,
    /// List the referrals that would be geocoded without calling the service
    pub dry_run: bool,
}

/// Outcome of one geocode run
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    /// Referrals selected for this run
    pub selected: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub resolver: ResolverStats,
    /// Referrals listed but not geocoded because of `dry_run`
    #[serde(skip)]
    pub planned: Vec<PendingReferral>,
}

/// Geocodes pending referrals one at a time and stores each outcome
pub struct GeocodeJob<'a, S, G> {
    store: &'a S,
    resolver: &'a GeocodingResolver<G>,
}

impl<'a, S, G> GeocodeJob<'a, S, G>
where
    S: ReferralStore,
    G: GeocodingService,
{
    pub fn new(store: &'a S, resolver: &'a GeocodingResolver<G>) -> Self {
        Self { store, resolver }
    }

    /// Run the job
    ///
    /// Referrals are processed strictly in sequence so the resolver's
    /// request pacing holds across the whole run.
    pub async fn run(&self, options: JobOptions) -> Result<JobReport, JobError> {
        let run_id = Uuid::new_v4();
        self.run_with_id(run_id, options)
            .instrument(tracing::info_span!("geocode_run", %run_id))
            .await
    }

    async fn run_with_id(&self, run_id: Uuid, options: JobOptions) -> Result<JobReport, JobError> {
        let pending = self
            .store
            .pending_referrals(options.force_refresh, options.limit)
            .await
            .map_err(JobError::LoadFailed)?;

        let mut report = JobReport {
            run_id,
            dry_run: options.dry_run,
            selected: pending.len(),
            succeeded: 0,
            failed: 0,
            resolver: ResolverStats::default(),
            planned: Vec::new(),
        };

        if pending.is_empty() {
            tracing::info!("No addresses need geocoding");
            return Ok(report);
        }

        tracing::info!(
            "Found {} addresses to geocode (force_refresh: {})",
            pending.len(),
            options.force_refresh
        );

        if options.dry_run {
            for referral in &pending {
                tracing::info!(
                    "Would geocode referral {} ({}): {}",
                    referral.id,
                    referral.order_number.as_deref().unwrap_or("no order number"),
                    referral.patient_address
                );
            }
            report.planned = pending;
            return Ok(report);
        }

        let total = pending.len();
        for (index, referral) in pending.iter().enumerate() {
            tracing::info!(
                "Processing {}/{}: referral {} ({})",
                index + 1,
                total,
                referral.id,
                referral.order_number.as_deref().unwrap_or("no order number")
            );

            let result = self.resolver.resolve(&referral.patient_address).await;

            self.store
                .record_geocode_result(referral.id, &result)
                .await
                .map_err(|source| JobError::RecordFailed {
                    referral_id: referral.id,
                    source,
                })?;

            match &result {
                GeocodeResult::Resolved { point, .. } => {
                    report.succeeded += 1;
                    tracing::info!("Referral {} geocoded: {}", referral.id, point);
                }
                GeocodeResult::Failed(reason) => {
                    report.failed += 1;
                    tracing::warn!("Referral {} marked failed: {}", referral.id, reason);
                }
            }
        }

        report.resolver = self.resolver.stats();

        tracing::info!(
            "Geocoding finished: {} succeeded, {} failed, {} requests ({:.1}% success rate)",
            report.succeeded,
            report.failed,
            report.resolver.requests,
            report.resolver.success_rate()
        );

        Ok(report)
    }
}
