use crate::models::ProviderRecord;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const PROVIDERS_KEY: &str = "providers:all";

/// In-process cache for the provider directory snapshot
///
/// Only provider rows are cached. Distances depend on the referral being
/// matched and are computed fresh for every request.
pub struct ProviderCache {
    snapshots: moka::future::Cache<&'static str, Arc<Vec<ProviderRecord>>>,
    ttl_secs: u64,
}

impl ProviderCache {
    pub fn new(ttl_secs: u64) -> Self {
        let snapshots = moka::future::CacheBuilder::new(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { snapshots, ttl_secs }
    }

    /// Return the cached snapshot, loading it with `load` on a miss
    ///
    /// Concurrent misses share a single load. A failed load is not cached.
    pub async fn providers<F, Fut, E>(&self, load: F) -> Result<Arc<Vec<ProviderRecord>>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ProviderRecord>, E>>,
        E: Send + Sync + 'static,
    {
        self.snapshots
            .try_get_with(PROVIDERS_KEY, async move {
                let providers = load().await?;
                tracing::debug!("Provider cache refreshed ({} providers)", providers.len());
                Ok(Arc::new(providers))
            })
            .await
    }

    /// Drop the cached snapshot so the next request reloads it
    pub async fn invalidate(&self) {
        self.snapshots.invalidate(PROVIDERS_KEY).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.snapshots.entry_count(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn provider(id: i64) -> ProviderRecord {
        ProviderRecord {
            id,
            name: format!("Provider {}", id),
            address: None,
            provider_type: None,
            npi: None,
            latitude: Some(40.0.into()),
            longitude: Some((-89.0).into()),
        }
    }

    #[tokio::test]
    async fn test_loads_once_within_ttl() {
        let cache = ProviderCache::new(60);
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let snapshot = cache
                .providers(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(vec![provider(1), provider(2)])
                })
                .await
                .unwrap();
            assert_eq!(snapshot.len(), 2);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_not_cached() {
        let cache = ProviderCache::new(60);

        let first = cache
            .providers(|| async { Err::<Vec<ProviderRecord>, _>("db down".to_string()) })
            .await;
        assert!(first.is_err());

        let second = cache
            .providers(|| async { Ok::<_, String>(vec![provider(3)]) })
            .await
            .unwrap();
        assert_eq!(second[0].id, 3);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = ProviderCache::new(60);

        cache.providers(|| async { Ok::<_, String>(vec![provider(1)]) }).await.unwrap();
        cache.invalidate().await;
        let reloaded = cache
            .providers(|| async { Ok::<_, String>(vec![provider(1), provider(2)]) })
            .await
            .unwrap();

        assert_eq!(reloaded.len(), 2);
    }
}
