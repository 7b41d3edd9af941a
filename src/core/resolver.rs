use crate::core::fallback::AddressQuery;
use crate::core::retry::{RetryDecision, RetryPolicy};
use crate::models::{FailureReason, GeocodeResult, GeocodedLocation};
use crate::services::{GeocodingError, GeocodingService};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request and outcome counters for one resolver instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub requests: u64,
    pub resolved: u64,
    pub failed: u64,
}

impl ResolverStats {
    /// Share of service requests that ended in a resolved address
    pub fn success_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.resolved as f64 / self.requests as f64 * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    resolved: AtomicU64,
    failed: AtomicU64,
}

/// Resolves free-text addresses to coordinates
///
/// Walks the address fallback cascade in order and stops at the first
/// candidate the service can place. Requests are issued one at a time with
/// the policy's request interval in front of each, so callers must not run
/// several resolutions concurrently against the same public service.
pub struct GeocodingResolver<G> {
    service: G,
    policy: RetryPolicy,
    counters: Counters,
}

enum CandidateOutcome {
    Found(GeocodedLocation),
    NoResult,
    Abandoned(GeocodingError),
}

impl<G: GeocodingService> GeocodingResolver<G> {
    pub fn new(service: G, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            counters: Counters::default(),
        }
    }

    pub fn service(&self) -> &G {
        &self.service
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            resolved: self.counters.resolved.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Resolve an address, trying each fallback candidate in turn
    ///
    /// Empty input fails without contacting the service. Any other failure
    /// means every candidate was tried and none produced a location.
    pub async fn resolve(&self, address: &str) -> GeocodeResult {
        let Some(query) = AddressQuery::parse(address) else {
            return GeocodeResult::Failed(FailureReason::EmptyAddress);
        };

        for (tier, candidate) in query.candidates.iter().enumerate() {
            if tier == 0 {
                tracing::info!("Trying full address: {}", candidate);
            } else {
                tracing::info!("Fallback {}: {}", tier, candidate);
            }

            match self.try_candidate(candidate).await {
                CandidateOutcome::Found(location) => {
                    self.counters.resolved.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        "Resolved to {} (matched: {})",
                        location.point,
                        location.display_address
                    );
                    return GeocodeResult::Resolved {
                        point: location.point,
                        matched_address: location.display_address,
                        query: candidate.clone(),
                        tier,
                    };
                }
                CandidateOutcome::NoResult => {
                    tracing::info!("No results for: {}", candidate);
                }
                CandidateOutcome::Abandoned(e) => {
                    tracing::warn!("Giving up on {}: {}", candidate, e);
                }
            }
        }

        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("All fallback strategies failed for: {}", query.address);

        GeocodeResult::Failed(FailureReason::Exhausted {
            candidates: query.candidates.len(),
        })
    }

    async fn try_candidate(&self, candidate: &str) -> CandidateOutcome {
        let mut state = self.policy.start();

        loop {
            tokio::time::sleep(self.policy.request_interval).await;
            self.counters.requests.fetch_add(1, Ordering::Relaxed);

            let error = match self.service.geocode(candidate).await {
                Ok(Some(location)) => return CandidateOutcome::Found(location),
                Ok(None) => return CandidateOutcome::NoResult,
                Err(e) => e,
            };

            match state.on_error(&error) {
                RetryDecision::RetryAfter(wait) => {
                    tracing::info!(
                        "{}; retrying in {:?} (attempts used: {})",
                        error,
                        wait,
                        state.attempts_used()
                    );
                    tokio::time::sleep(wait).await;
                }
                RetryDecision::Abandon => return CandidateOutcome::Abandoned(error),
            }
        }
    }
}
