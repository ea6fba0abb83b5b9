//! Realtime vehicle feed overlay.

mod index;

pub use index::{OccupancySample, RealtimeIndex};

use std::sync::Arc;

use crate::cache::Caches;
use crate::odpt::{BusDto, OdptClient, OdptError, TOEI_OPERATOR};

/// Cached access to the derived realtime index.
///
/// The index is rebuilt from a fresh feed snapshot whenever the short
/// realtime TTL lapses; concurrent rebuilds are tolerated, not deduplicated.
#[derive(Clone)]
pub struct RealtimeFeed {
    client: Arc<OdptClient>,
    caches: Arc<Caches>,
}

impl RealtimeFeed {
    pub fn new(client: Arc<OdptClient>, caches: Arc<Caches>) -> Self {
        Self { client, caches }
    }

    /// The current realtime index, from cache or a fresh snapshot.
    pub async fn index(&self) -> Result<Arc<RealtimeIndex>, OdptError> {
        if let Some(index) = self.caches.realtime_index().await {
            return Ok(index);
        }

        let buses: Vec<BusDto> = self
            .client
            .fetch_collection("odpt:Bus", &[("odpt:operator", TOEI_OPERATOR)])
            .await?;
        tracing::debug!(vehicles = buses.len(), "rebuilt realtime index");

        let index = Arc::new(RealtimeIndex::build(&buses));
        self.caches.insert_realtime_index(index.clone()).await;
        Ok(index)
    }
}
