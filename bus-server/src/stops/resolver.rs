//! Free-text stop-name resolution.
//!
//! Users type either the bare place name or a suffixed station name
//! ("豊洲" vs "豊洲駅前"), so resolution queries the upstream title search
//! with suffix variants of the input, keeps substring matches only, and
//! falls back to a scan over the full cached roster when the title search
//! yields nothing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cache::Caches;
use crate::domain::{StopPole, normalize_for_match};
use crate::odpt::{BusstopPoleDto, OdptClient, OdptError, TOEI_OPERATOR};

/// "station front" suffix: the common pole naming for a stop at a station.
const STATION_FRONT_SUFFIX: &str = "駅前";
/// bare "station" suffix.
const STATION_SUFFIX: &str = "駅";

/// Cap on roster-fallback matches per resolution.
const ROSTER_FALLBACK_LIMIT: usize = 50;

/// Resolves free-text stop names to pole records, with caching.
#[derive(Clone)]
pub struct StopResolver {
    client: Arc<OdptClient>,
    caches: Arc<Caches>,
}

impl StopResolver {
    pub fn new(client: Arc<OdptClient>, caches: Arc<Caches>) -> Self {
        Self { client, caches }
    }

    pub(crate) fn client(&self) -> &OdptClient {
        &self.client
    }

    /// The full operator stop roster, cached.
    ///
    /// Empty (not an error) when no credential is configured, so the
    /// suggestion path degrades to no results.
    pub async fn roster(&self) -> Result<Arc<Vec<StopPole>>, OdptError> {
        if let Some(roster) = self.caches.stop_roster().await {
            return Ok(roster);
        }
        if !self.client.has_credential() {
            return Ok(Arc::new(Vec::new()));
        }

        let dtos: Vec<BusstopPoleDto> = self
            .client
            .fetch_collection("odpt:BusstopPole", &[("odpt:operator", TOEI_OPERATOR)])
            .await?;
        let roster: Vec<StopPole> = dtos.into_iter().filter_map(|d| d.into_stop_pole()).collect();
        debug!(stops = roster.len(), "rebuilt stop roster");

        let roster = Arc::new(roster);
        self.caches.insert_stop_roster(roster.clone()).await;
        Ok(roster)
    }

    /// Resolve a free-text stop name to its matching poles.
    pub async fn resolve(&self, name: &str) -> Result<Arc<Vec<StopPole>>, OdptError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }
        if let Some(cached) = self.caches.resolution(trimmed).await {
            return Ok(cached);
        }

        let normalized = normalize_for_match(trimmed);
        let mut merged: Vec<StopPole> = Vec::new();
        let mut index_by_id: HashMap<String, usize> = HashMap::new();

        for query in query_variants(trimmed) {
            let dtos: Vec<BusstopPoleDto> = self
                .client
                .fetch_collection(
                    "odpt:BusstopPole",
                    &[("odpt:operator", TOEI_OPERATOR), ("dc:title", query.as_str())],
                )
                .await?;
            for dto in dtos {
                let Some(pole) = dto.into_stop_pole() else {
                    continue;
                };
                if !pole.normalized_title().contains(&normalized) {
                    continue;
                }
                match index_by_id.get(&pole.id) {
                    Some(&i) => merged[i].patterns.extend(pole.patterns),
                    None => {
                        index_by_id.insert(pole.id.clone(), merged.len());
                        merged.push(pole);
                    }
                }
            }
        }

        if merged.is_empty() {
            debug!(name = trimmed, "title search empty, scanning roster");
            merged = self
                .roster()
                .await?
                .iter()
                .filter(|p| p.normalized_title().contains(&normalized))
                .take(ROSTER_FALLBACK_LIMIT)
                .cloned()
                .collect();
        }

        for pole in &mut merged {
            let mut seen = HashSet::new();
            pole.patterns.retain(|p| seen.insert(p.clone()));
        }

        let merged = Arc::new(merged);
        self.caches
            .insert_resolution(trimmed.to_string(), merged.clone())
            .await;
        Ok(merged)
    }
}

/// Suffix variants to try against the upstream title search, in order.
pub fn query_variants(trimmed: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    let mut push = |v: String| {
        let v = v.trim().to_string();
        if !v.is_empty() && !variants.contains(&v) {
            variants.push(v);
        }
    };

    push(trimmed.to_string());
    if !trimmed.ends_with(STATION_FRONT_SUFFIX) {
        push(format!("{trimmed}{STATION_FRONT_SUFFIX}"));
    }
    if !trimmed.ends_with(STATION_SUFFIX) {
        push(format!("{trimmed}{STATION_SUFFIX}"));
    }
    if let Some(stripped) = trimmed.strip_suffix(STATION_FRONT_SUFFIX) {
        push(stripped.to_string());
    }
    if let Some(stripped) = trimmed.strip_suffix(STATION_SUFFIX) {
        push(stripped.to_string());
    }
    variants
}

/// Name variants for note-text matching: the query as typed plus every
/// resolved pole title.
pub fn name_variants(input: &str, poles: &[StopPole]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let trimmed = input.trim();
    if !trimmed.is_empty() {
        names.push(trimmed.to_string());
    }
    for pole in poles {
        let title = pole.title.trim();
        if !title.is_empty() && !names.iter().any(|n| n == title) {
            names.push(title.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_for_bare_name() {
        assert_eq!(query_variants("豊洲"), vec!["豊洲", "豊洲駅前", "豊洲駅"]);
    }

    #[test]
    fn variants_for_station_front_name() {
        assert_eq!(
            query_variants("豊洲駅前"),
            vec!["豊洲駅前", "豊洲駅前駅", "豊洲"]
        );
    }

    #[test]
    fn variants_for_station_name() {
        assert_eq!(query_variants("豊洲駅"), vec!["豊洲駅", "豊洲駅駅前", "豊洲"]);
    }

    #[test]
    fn name_variants_include_input_and_titles() {
        let poles = vec![
            StopPole {
                id: "1".into(),
                title: "豊洲駅前".into(),
                patterns: vec![],
            },
            StopPole {
                id: "2".into(),
                title: "豊洲駅前".into(),
                patterns: vec![],
            },
            StopPole {
                id: "3".into(),
                title: " ".into(),
                patterns: vec![],
            },
        ];
        assert_eq!(name_variants("豊洲", &poles), vec!["豊洲", "豊洲駅前"]);
        assert_eq!(name_variants("  ", &[]), Vec::<String>::new());
    }
}
