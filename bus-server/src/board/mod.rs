//! The departure board facade.
//!
//! Owns the gateway, caches, resolver, and realtime feed, and runs the
//! resolution-and-merge pipeline:
//! resolve -> match patterns -> project timetables -> overlay realtime ->
//! aggregate. The two public operations are stop suggestions and ranked
//! next departures.

mod aggregate;
mod config;
mod matcher;
mod project;

pub use config::BoardConfig;
pub use matcher::{CandidatePattern, StopMatchSet, match_patterns};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cache::Caches;
use crate::domain::{Departure, RoutePattern, Suggestion, operator_tz};
use crate::odpt::{
    BusroutePatternDto, BusTimetableDto, OdptClient, OdptError, TOEI_OPERATOR,
};
use crate::realtime::RealtimeFeed;
use crate::stops::{StopResolver, name_variants};

use aggregate::aggregate as aggregate_departures;
use project::{ProjectedDeparture, ProjectionContext, project_timetable};

/// Errors surfaced by the departure board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// No upstream credential is configured. Suggestions degrade to empty;
    /// the departures path reports this and the safe wrapper converts it.
    #[error("ODPT credential is not configured")]
    MissingCredential,

    /// An unrecovered upstream failure for a roster-level resource.
    #[error("upstream fetch failed: {0}")]
    Fetch(#[from] OdptError),
}

/// Occupancy sample counts for a set of routes/patterns, for the debug
/// surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleStats {
    pub route_counts: HashMap<String, usize>,
    pub pattern_counts: HashMap<String, usize>,
    pub total_samples: usize,
}

/// The assembled departure board service.
pub struct DepartureBoard {
    client: Arc<OdptClient>,
    caches: Arc<Caches>,
    resolver: StopResolver,
    realtime: RealtimeFeed,
    config: BoardConfig,
}

impl DepartureBoard {
    pub fn new(client: OdptClient, caches: Caches, config: BoardConfig) -> Self {
        let client = Arc::new(client);
        let caches = Arc::new(caches);
        Self {
            resolver: StopResolver::new(client.clone(), caches.clone()),
            realtime: RealtimeFeed::new(client.clone(), caches.clone()),
            client,
            caches,
            config,
        }
    }

    /// Suggest stops matching a text query, optionally narrowed to stops
    /// sharing a route pattern with `anchor`.
    pub async fn suggest_stops(
        &self,
        query: &str,
        anchor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Suggestion>, BoardError> {
        Ok(self.resolver.suggest(query, anchor, limit).await?)
    }

    /// Ranked next departures for an origin/destination pair.
    ///
    /// Unresolvable names and unbridged pairs yield an empty list; a failed
    /// roster fetch fails the query; a failed per-pattern timetable fetch
    /// only costs that pattern's contribution.
    pub async fn next_departures(
        &self,
        origin: &str,
        dest: &str,
    ) -> Result<Vec<Departure>, BoardError> {
        if !self.client.has_credential() {
            return Err(BoardError::MissingCredential);
        }
        let origin = origin.trim();
        let dest = dest.trim();
        let response_key = (origin.to_string(), dest.to_string());
        if let Some(cached) = self.caches.response(&response_key).await {
            return Ok(cached.as_ref().clone());
        }

        // Origin and destination resolution have no data dependency.
        let (origin_poles, dest_poles) =
            tokio::try_join!(self.resolver.resolve(origin), self.resolver.resolve(dest))?;
        if origin_poles.is_empty() || dest_poles.is_empty() {
            debug!(origin, dest, "no resolvable poles for one side");
            return Ok(self.finish(response_key, Vec::new()).await);
        }

        let origin_pole_titles: HashMap<String, String> = origin_poles
            .iter()
            .map(|p| (p.id.clone(), p.title.clone()))
            .collect();
        let origin_set = StopMatchSet::new(
            origin_poles.iter().map(|p| p.id.clone()),
            &name_variants(origin, &origin_poles),
        );
        let dest_set = StopMatchSet::new(
            dest_poles.iter().map(|p| p.id.clone()),
            &name_variants(dest, &dest_poles),
        );

        // Pattern roster and realtime index are likewise independent.
        let (patterns, realtime) =
            tokio::try_join!(self.pattern_roster(), self.realtime.index())?;

        let candidates = match_patterns(&patterns, &origin_set, &dest_set);
        if candidates.is_empty() {
            debug!(origin, dest, "no patterns bridge the pair");
            return Ok(self.finish(response_key, Vec::new()).await);
        }

        let now = Utc::now().with_timezone(&operator_tz());
        let ctx = ProjectionContext {
            origin_query: origin,
            dest_query: dest,
            origin_set: &origin_set,
            dest_set: &dest_set,
            origin_pole_titles: &origin_pole_titles,
            realtime: &realtime,
            occupancy_window_ms: self.config.occupancy_match_window.as_millis() as i64,
            now,
        };

        // Per-pattern timetable fetches are independent; fan out under the
        // gateway's concurrency cap and merge whatever succeeds.
        let ctx_ref = &ctx;
        let pending: Vec<_> = candidates
            .iter()
            .map(|candidate| self.project_candidate(candidate, ctx_ref))
            .collect();
        let projected: Vec<_> = futures::stream::iter(pending)
            .buffer_unordered(self.client.max_concurrent())
        .collect::<Vec<Vec<_>>>()
        .await
        .into_iter()
        .flatten()
        .collect();

        let results = aggregate_departures(projected, now.timestamp_millis(), &self.config);
        Ok(self.finish(response_key, results).await)
    }

    /// The boundary wrapper: any internal failure is logged and degrades to
    /// an empty list.
    pub async fn next_departures_safe(&self, origin: &str, dest: &str) -> Vec<Departure> {
        match self.next_departures(origin, dest).await {
            Ok(departures) => departures,
            Err(e) => {
                error!(origin, dest, error = %e, "departure query failed");
                Vec::new()
            }
        }
    }

    /// Occupancy sample counts from the current realtime index.
    pub async fn occupancy_sample_stats(
        &self,
        route_ids: &[String],
        pattern_ids: &[String],
    ) -> Result<SampleStats, BoardError> {
        let index = self.realtime.index().await.map_err(BoardError::from)?;

        let unique = |ids: &[String]| -> Vec<String> {
            let mut seen = HashSet::new();
            ids.iter()
                .filter(|id| !id.is_empty() && seen.insert((*id).clone()))
                .cloned()
                .collect()
        };

        Ok(SampleStats {
            route_counts: unique(route_ids)
                .into_iter()
                .map(|id| {
                    let count = index.sample_count(&id);
                    (id, count)
                })
                .collect(),
            pattern_counts: unique(pattern_ids)
                .into_iter()
                .map(|id| {
                    let count = index.sample_count(&id);
                    (id, count)
                })
                .collect(),
            total_samples: index.total_samples(),
        })
    }

    /// The pipeline configuration in effect.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Cache a finished response and hand it back.
    async fn finish(&self, key: (String, String), results: Vec<Departure>) -> Vec<Departure> {
        self.caches
            .insert_response(key, Arc::new(results.clone()))
            .await;
        results
    }

    /// The full pattern roster, cached.
    async fn pattern_roster(&self) -> Result<Arc<Vec<RoutePattern>>, OdptError> {
        if let Some(patterns) = self.caches.pattern_roster().await {
            return Ok(patterns);
        }

        let dtos: Vec<BusroutePatternDto> = self
            .client
            .fetch_collection("odpt:BusroutePattern", &[("odpt:operator", TOEI_OPERATOR)])
            .await?;
        let patterns: Vec<RoutePattern> = dtos
            .into_iter()
            .filter_map(|d| d.into_route_pattern())
            .collect();
        debug!(patterns = patterns.len(), "rebuilt pattern roster");

        let patterns = Arc::new(patterns);
        self.caches.insert_pattern_roster(patterns.clone()).await;
        Ok(patterns)
    }

    /// Timetables for one candidate pattern.
    ///
    /// Patterns and routes are sometimes indexed inconsistently upstream: an
    /// empty pattern-keyed fetch retries once keyed by the owning route.
    /// Fetch and project a single candidate pattern's timetables. Extracted
    /// from the fan-out so the per-pattern future is produced by an `async
    /// fn` call (whose borrow lifetimes elide correctly) rather than a
    /// closure returning an async block.
    async fn project_candidate(
        &self,
        candidate: &CandidatePattern,
        ctx: &ProjectionContext<'_>,
    ) -> Vec<ProjectedDeparture> {
        match self.timetables_for(candidate).await {
            Ok(timetables) => timetables
                .iter()
                .filter_map(|tt| project_timetable(tt, candidate, ctx))
                .collect(),
            Err(e) => {
                warn!(
                    pattern = %candidate.pattern_id,
                    error = %e,
                    "timetable fetch failed; pattern contributes nothing"
                );
                Vec::new()
            }
        }
    }

    async fn timetables_for(
        &self,
        candidate: &CandidatePattern,
    ) -> Result<Vec<BusTimetableDto>, OdptError> {
        let timetables: Vec<BusTimetableDto> = self
            .client
            .fetch_collection(
                "odpt:BusTimetable",
                &[("odpt:busroutePattern", candidate.pattern_id.as_str())],
            )
            .await?;
        if !timetables.is_empty() {
            return Ok(timetables);
        }
        let Some(route_id) = candidate.route_id.as_deref() else {
            return Ok(timetables);
        };
        self.client
            .fetch_collection("odpt:BusTimetable", &[("odpt:busroute", route_id)])
            .await
    }
}
