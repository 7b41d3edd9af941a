//! Per-candidate retry budget for geocoding requests.
//!
//! Each fallback candidate gets a fresh [`RetryState`]. The resolver feeds
//! every service error into it and gets back a [`RetryDecision`]: wait and
//! try the same query again, or abandon the candidate.

use crate::services::GeocodingError;
use std::time::Duration;

/// Timing and budget parameters for one candidate query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per candidate that may end in a timeout or outage
    pub max_attempts: u32,
    /// Pause before every request (service acceptable-use limit)
    pub request_interval: Duration,
    pub rate_limit_backoff: Duration,
    pub timeout_backoff: Duration,
    pub unavailable_backoff: Duration,
    /// Cap on rate-limit retries per candidate; `None` retries until the
    /// service stops rate limiting
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_interval: Duration::from_millis(1100),
            rate_limit_backoff: Duration::from_secs(5),
            timeout_backoff: Duration::from_secs(2),
            unavailable_backoff: Duration::from_secs(5),
            max_rate_limit_retries: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with no waits, for tests and local fakes
    pub fn immediate() -> Self {
        Self {
            request_interval: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            timeout_backoff: Duration::ZERO,
            unavailable_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts_used: 0,
            rate_limited: 0,
        }
    }
}

/// What to do after a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Abandon,
}

/// Retry bookkeeping for a single candidate query
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts_used: u32,
    rate_limited: u32,
}

impl RetryState {
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn rate_limited(&self) -> u32 {
        self.rate_limited
    }

    /// Record a failed request and decide whether to retry
    ///
    /// Rate limiting never spends an attempt. Timeouts and outages spend
    /// one; once the budget is gone the candidate is abandoned. Anything
    /// else abandons the candidate straight away.
    pub fn on_error(&mut self, error: &GeocodingError) -> RetryDecision {
        match error {
            GeocodingError::RateLimited => {
                self.rate_limited += 1;
                match self.policy.max_rate_limit_retries {
                    Some(cap) if self.rate_limited > cap => RetryDecision::Abandon,
                    _ => RetryDecision::RetryAfter(self.policy.rate_limit_backoff),
                }
            }
            GeocodingError::TimedOut => self.spend_attempt(self.policy.timeout_backoff),
            GeocodingError::Unavailable(_) => self.spend_attempt(self.policy.unavailable_backoff),
            GeocodingError::Unexpected(_) => RetryDecision::Abandon,
        }
    }

    fn spend_attempt(&mut self, backoff: Duration) -> RetryDecision {
        self.attempts_used += 1;
        if self.attempts_used >= self.policy.max_attempts {
            RetryDecision::Abandon
        } else {
            RetryDecision::RetryAfter(backoff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_timings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.request_interval, Duration::from_millis(1100));
        assert_eq!(policy.rate_limit_backoff, Duration::from_secs(5));
        assert_eq!(policy.max_rate_limit_retries, None);
    }

    #[test]
    fn test_timeouts_exhaust_budget() {
        let policy = RetryPolicy::default();
        let mut state = policy.start();

        assert_eq!(state.on_error(&GeocodingError::TimedOut), RetryDecision::RetryAfter(Duration::from_secs(2)));
        assert_eq!(
            state.on_error(&GeocodingError::Unavailable("503".into())),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(state.on_error(&GeocodingError::TimedOut), RetryDecision::Abandon);
        assert_eq!(state.attempts_used(), 3);
    }

    #[test]
    fn test_rate_limit_does_not_spend_attempts() {
        let mut state = RetryPolicy::default().start();

        for _ in 0..50 {
            assert_eq!(
                state.on_error(&GeocodingError::RateLimited),
                RetryDecision::RetryAfter(Duration::from_secs(5))
            );
        }
        assert_eq!(state.attempts_used(), 0);
        assert_eq!(state.rate_limited(), 50);

        // Budget is still whole after any amount of rate limiting
        assert!(matches!(state.on_error(&GeocodingError::TimedOut), RetryDecision::RetryAfter(_)));
        assert!(matches!(state.on_error(&GeocodingError::TimedOut), RetryDecision::RetryAfter(_)));
        assert_eq!(state.on_error(&GeocodingError::TimedOut), RetryDecision::Abandon);
    }

    #[test]
    fn test_rate_limit_cap() {
        let policy = RetryPolicy {
            max_rate_limit_retries: Some(2),
            ..RetryPolicy::default()
        };
        let mut state = policy.start();

        assert!(matches!(state.on_error(&GeocodingError::RateLimited), RetryDecision::RetryAfter(_)));
        assert!(matches!(state.on_error(&GeocodingError::RateLimited), RetryDecision::RetryAfter(_)));
        assert_eq!(state.on_error(&GeocodingError::RateLimited), RetryDecision::Abandon);
    }

    #[test]
    fn test_unexpected_error_abandons() {
        let mut state = RetryPolicy::default().start();
        assert_eq!(
            state.on_error(&GeocodingError::Unexpected("bad json".into())),
            RetryDecision::Abandon
        );
        assert_eq!(state.attempts_used(), 0);
    }
}
