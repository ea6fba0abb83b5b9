//! Departure deduplication and ranking.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{Departure, service_day};

use super::config::BoardConfig;
use super::project::ProjectedDeparture;

/// Collapse near-simultaneous departures per route key.
///
/// Within a key, entries whose adjusted epochs sit within the window of the
/// previous kept entry merge into it, keeping the later one: overlapping
/// data sources reporting the same physical run. Idempotent.
pub(crate) fn dedupe_departures(
    departures: Vec<ProjectedDeparture>,
    window_ms: i64,
) -> Vec<ProjectedDeparture> {
    let mut by_key: BTreeMap<String, Vec<ProjectedDeparture>> = BTreeMap::new();
    for d in departures {
        by_key.entry(d.route_key.clone()).or_default().push(d);
    }

    let mut merged = Vec::new();
    for (_, mut items) in by_key {
        items.sort_by_key(|d| d.departure.departure_epoch);
        let mut reduced: Vec<ProjectedDeparture> = Vec::new();
        for item in items {
            if let Some(prev) = reduced.last_mut() {
                if item.departure.departure_epoch - prev.departure.departure_epoch <= window_ms {
                    *prev = item;
                    continue;
                }
            }
            reduced.push(item);
        }
        merged.extend(reduced);
    }
    merged
}

/// Assemble the final ranked list from all projected departures.
pub(crate) fn aggregate(
    departures: Vec<ProjectedDeparture>,
    now_ms: i64,
    config: &BoardConfig,
) -> Vec<Departure> {
    let window_ms = config.dedupe_window.as_millis() as i64;

    let upcoming: Vec<ProjectedDeparture> = departures
        .into_iter()
        .filter(|d| d.departure.departure_epoch >= now_ms)
        .collect();

    let mut deduped = dedupe_departures(upcoming, window_ms);
    deduped.sort_by_key(|d| d.departure.departure_epoch);

    // Latest departure still on today's service day, per route key: the
    // "last bus" candidate.
    let today = service_day(now_ms);
    let mut last_today: HashMap<String, i64> = HashMap::new();
    for d in &deduped {
        let epoch = d.departure.departure_epoch;
        if service_day(epoch) != today {
            continue;
        }
        last_today
            .entry(d.route_key.clone())
            .and_modify(|e| *e = (*e).max(epoch))
            .or_insert(epoch);
    }

    let mut by_key: BTreeMap<String, Vec<ProjectedDeparture>> = BTreeMap::new();
    for d in deduped {
        by_key.entry(d.route_key.clone()).or_default().push(d);
    }

    let mut capped: Vec<ProjectedDeparture> = Vec::new();
    for (_, items) in by_key {
        capped.extend(items.into_iter().take(config.max_per_route));
    }
    capped.sort_by_key(|d| d.departure.departure_epoch);

    capped
        .into_iter()
        .map(|d| {
            let is_last = d.status_is_last
                || last_today.get(&d.route_key) == Some(&d.departure.departure_epoch);
            Departure {
                is_last,
                ..d.departure
            }
        })
        .collect()
}



#[cfg(test)]
pub(crate) mod tests_support {
    use super::ProjectedDeparture;
    use crate::domain::{Departure, OccupancyLevel};

    /// Minimal projected departure for aggregation tests.
    pub(crate) fn dep(route_key: &str, epoch: i64) -> ProjectedDeparture {
        ProjectedDeparture {
            departure: Departure {
                id: format!("{route_key}-{epoch}"),
                route_name: route_key.to_string(),
                route_id: None,
                pattern_id: None,
                origin_stop_name: "豊洲駅前".into(),
                origin_pole_name: "豊洲駅前".into(),
                dest_stop_name: "枝川".into(),
                scheduled_time: String::new(),
                scheduled_epoch: epoch,
                delay_minutes: 0,
                departure_time: String::new(),
                departure_epoch: epoch,
                eta_minutes: 0,
                occupancy: None,
                occupancy_level: OccupancyLevel::Unknown,
                occupancy_ratio: None,
                is_last: false,
            },
            route_key: route_key.to_string(),
            status_is_last: false,
        }
    }
}
