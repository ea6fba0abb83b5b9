//! TTL cache stores for the resolution-and-merge pipeline.
//!
//! Five independent stores, injected as one `Caches` object rather than
//! living as module-level singletons. Static data (rosters, resolutions)
//! lives 10 minutes; the realtime index and assembled responses live 30
//! seconds. Rebuilds are lazy — the first read after expiry refetches — and
//! deliberately not deduplicated: two callers racing an expired entry both
//! refetch, and the store tolerates that without corruption.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{Departure, RoutePattern, StopPole};
use crate::realtime::RealtimeIndex;

/// TTLs and capacities for the five stores.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for the full stop roster.
    pub roster_ttl: Duration,
    /// TTL for per-name stop resolutions.
    pub resolution_ttl: Duration,
    /// TTL for the full pattern roster.
    pub pattern_ttl: Duration,
    /// TTL for the realtime vehicle index.
    pub realtime_ttl: Duration,
    /// TTL for assembled query responses.
    pub response_ttl: Duration,
    /// Maximum entries for the keyed stores.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            roster_ttl: Duration::from_secs(10 * 60),
            resolution_ttl: Duration::from_secs(10 * 60),
            pattern_ttl: Duration::from_secs(10 * 60),
            realtime_ttl: Duration::from_secs(30),
            response_ttl: Duration::from_secs(30),
            max_capacity: 1000,
        }
    }
}

/// Key for the query-response store: (origin, dest) as the user typed them,
/// trimmed.
pub type ResponseKey = (String, String);

/// The pipeline's cache stores.
pub struct Caches {
    stop_roster: MokaCache<(), Arc<Vec<StopPole>>>,
    resolutions: MokaCache<String, Arc<Vec<StopPole>>>,
    patterns: MokaCache<(), Arc<Vec<RoutePattern>>>,
    realtime: MokaCache<(), Arc<RealtimeIndex>>,
    responses: MokaCache<ResponseKey, Arc<Vec<Departure>>>,
}

impl Caches {
    /// Create the stores with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            stop_roster: MokaCache::builder()
                .time_to_live(config.roster_ttl)
                .max_capacity(1)
                .build(),
            resolutions: MokaCache::builder()
                .time_to_live(config.resolution_ttl)
                .max_capacity(config.max_capacity)
                .build(),
            patterns: MokaCache::builder()
                .time_to_live(config.pattern_ttl)
                .max_capacity(1)
                .build(),
            realtime: MokaCache::builder()
                .time_to_live(config.realtime_ttl)
                .max_capacity(1)
                .build(),
            responses: MokaCache::builder()
                .time_to_live(config.response_ttl)
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    pub async fn stop_roster(&self) -> Option<Arc<Vec<StopPole>>> {
        self.stop_roster.get(&()).await
    }

    pub async fn insert_stop_roster(&self, roster: Arc<Vec<StopPole>>) {
        self.stop_roster.insert((), roster).await;
    }

    pub fn invalidate_stop_roster(&self) {
        self.stop_roster.invalidate_all();
    }

    pub async fn resolution(&self, name: &str) -> Option<Arc<Vec<StopPole>>> {
        self.resolutions.get(name).await
    }

    pub async fn insert_resolution(&self, name: String, poles: Arc<Vec<StopPole>>) {
        self.resolutions.insert(name, poles).await;
    }

    pub fn invalidate_resolutions(&self) {
        self.resolutions.invalidate_all();
    }

    pub async fn pattern_roster(&self) -> Option<Arc<Vec<RoutePattern>>> {
        self.patterns.get(&()).await
    }

    pub async fn insert_pattern_roster(&self, patterns: Arc<Vec<RoutePattern>>) {
        self.patterns.insert((), patterns).await;
    }

    pub fn invalidate_pattern_roster(&self) {
        self.patterns.invalidate_all();
    }

    pub async fn realtime_index(&self) -> Option<Arc<RealtimeIndex>> {
        self.realtime.get(&()).await
    }

    pub async fn insert_realtime_index(&self, index: Arc<RealtimeIndex>) {
        self.realtime.insert((), index).await;
    }

    pub fn invalidate_realtime_index(&self) {
        self.realtime.invalidate_all();
    }

    pub async fn response(&self, key: &ResponseKey) -> Option<Arc<Vec<Departure>>> {
        self.responses.get(key).await
    }

    pub async fn insert_response(&self, key: ResponseKey, departures: Arc<Vec<Departure>>) {
        self.responses.insert(key, departures).await;
    }

    pub fn invalidate_responses(&self) {
        self.responses.invalidate_all();
    }
}
