//! TTL cache for hold rankings.
//!
//! Rankings are pure functions of persisted state, so a cached ranking is
//! only ever stale, never wrong for its inputs. Entries expire after a fixed
//! TTL (24h by default). Callers that write new observations through the same
//! process drop stale rankings with `invalidate_all`.

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::Stats;

/// Default TTL for cached rankings.
const RANKING_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Maximum number of cached rankings.
const RANKING_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Identifies one cached ranking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankingKey {
    pub version: String,
    pub wave: u8,
    pub anchor_unit: String,
    pub secondary: Option<String>,
}

/// Moka-backed ranking cache.
#[derive(Clone)]
pub struct RankingCache {
    rankings: Cache<RankingKey, Arc<Vec<Stats>>>,
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingCache {
    /// Create a ranking cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(RANKING_CACHE_TTL_SECS))
    }

    /// Create with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        let rankings = Cache::builder()
            .max_capacity(RANKING_CACHE_MAX_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { rankings }
    }

    pub async fn get(&self, key: &RankingKey) -> Option<Arc<Vec<Stats>>> {
        self.rankings.get(key).await
    }

    /// Return the cached ranking, or compute and cache it.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: RankingKey,
        compute: F,
    ) -> DomainResult<Arc<Vec<Stats>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<Vec<Stats>>>,
    {
        if let Some(cached) = self.rankings.get(&key).await {
            return Ok(cached);
        }

        let ranking = Arc::new(compute().await?);
        self.rankings.insert(key, ranking.clone()).await;
        Ok(ranking)
    }

    /// Drop every cached ranking.
    pub fn invalidate_all(&self) {
        self.rankings.invalidate_all();
    }
}
