use crate::core::distance::distance_miles;
use crate::models::{GeoPoint, ProviderRecord, RankedMatch};

/// Shortlist size used by the provider selection screen
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Result of a nearest-provider query
#[derive(Debug)]
pub struct MatchResult<'a> {
    pub matches: Vec<RankedMatch<'a>>,
    /// Size of the provider snapshot that was searched
    pub total_candidates: usize,
    /// Providers that had usable coordinates
    pub valid_candidates: usize,
}

impl MatchResult<'_> {
    fn empty(total_candidates: usize) -> Self {
        Self {
            matches: Vec::new(),
            total_candidates,
            valid_candidates: 0,
        }
    }
}

/// Ranks providers by great-circle distance from a reference point
///
/// # Pipeline Stages
/// 1. Reference point validation (absent point yields an empty result)
/// 2. Candidate coordinate validation (bad rows are skipped, not errors)
/// 3. Haversine distance in miles
/// 4. Stable ascending sort and truncation
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    max_results: usize,
}

impl Matcher {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Find the providers nearest to `reference`
    ///
    /// # Arguments
    /// * `reference` - The referral's location, if it has a usable one
    /// * `providers` - Snapshot of the provider directory
    ///
    /// # Returns
    /// MatchResult whose matches are non-decreasing in distance and hold at
    /// most `max_results` entries. Equal distances keep snapshot order.
    pub fn find_nearest<'a>(
        &self,
        reference: Option<GeoPoint>,
        providers: &'a [ProviderRecord],
    ) -> MatchResult<'a> {
        self.find_nearest_limited(reference, providers, self.max_results)
    }

    /// Same as [`Matcher::find_nearest`] with a caller-supplied cap, clamped
    /// to the configured maximum
    pub fn find_nearest_limited<'a>(
        &self,
        reference: Option<GeoPoint>,
        providers: &'a [ProviderRecord],
        limit: usize,
    ) -> MatchResult<'a> {
        let total_candidates = providers.len();

        let Some(reference) = reference else {
            tracing::debug!("No reference location, skipping {} providers", total_candidates);
            return MatchResult::empty(total_candidates);
        };

        let mut ranked: Vec<RankedMatch<'a>> = providers
            .iter()
            .filter_map(|provider| {
                let location = provider.location()?;
                Some(RankedMatch {
                    provider,
                    location,
                    distance_miles: distance_miles(&reference, &location),
                })
            })
            .collect();

        let valid_candidates = ranked.len();
        if valid_candidates < total_candidates {
            tracing::debug!(
                "Skipped {} providers without usable coordinates",
                total_candidates - valid_candidates
            );
        }

        // sort_by is stable, so ties keep their snapshot order
        ranked.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
        ranked.truncate(limit.min(self.max_results));

        MatchResult {
            matches: ranked,
            total_candidates,
            valid_candidates,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}
