//! Snapshot index over the live vehicle feed.
//!
//! Built in a single pass over the `odpt:Bus` collection and rebuilt
//! wholesale on every cache refresh, never mutated in place. Three tables:
//! delay per route-or-pattern, time-stamped occupancy samples per
//! route-or-pattern, and turnaround predictions per (route, destination).

use std::collections::HashMap;

use crate::domain::{normalize_for_match, ratio_from_text};
use crate::odpt::extract::{
    DESTINATION_FIELDS, DESTINATION_KEY_HINTS, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS,
    PREDICTED_ARRIVAL_FIELDS, TIMESTAMP_FIELDS, epoch_field, numeric_value, text_field,
};
use crate::odpt::BusDto;

/// One time-stamped occupancy observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySample {
    /// Observation epoch, ms.
    pub ts: i64,
    /// Raw operator text.
    pub text: String,
    /// Derived 0-100 ratio, when the text yielded one.
    pub ratio: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
struct DelayObs {
    secs: i64,
    ts: i64,
}

#[derive(Debug, Clone, Copy)]
struct TurnaroundObs {
    epoch: i64,
    ts: i64,
}

/// Derived index over one vehicle-feed snapshot.
#[derive(Debug, Default)]
pub struct RealtimeIndex {
    /// Occupancy samples per route id and per pattern id, time-sorted.
    samples: HashMap<String, Vec<OccupancySample>>,
    /// Delay seconds per route-or-pattern key; most recent observation wins.
    delays: HashMap<String, DelayObs>,
    /// Predicted arrival per (route-or-pattern, normalized destination);
    /// most recent observation wins.
    turnarounds: HashMap<(String, String), TurnaroundObs>,
}

impl RealtimeIndex {
    /// Build the index from a feed snapshot.
    pub fn build(buses: &[BusDto]) -> Self {
        let mut index = RealtimeIndex::default();

        for bus in buses {
            let route = bus.route.as_deref().filter(|s| !s.is_empty());
            let pattern = bus.pattern.as_deref().filter(|s| !s.is_empty());
            let Some(key) = route.or(pattern) else {
                continue;
            };

            let ts = epoch_field(&bus.extra, TIMESTAMP_FIELDS).unwrap_or(0);

            let delay_secs = bus
                .delay
                .as_ref()
                .and_then(numeric_value)
                .map(|d| d.max(0.0) as i64)
                .unwrap_or(0);
            let fresher = index.delays.get(key).is_none_or(|existing| ts >= existing.ts);
            if fresher {
                index.delays.insert(
                    key.to_string(),
                    DelayObs {
                        secs: delay_secs,
                        ts,
                    },
                );
            }

            let predicted = epoch_field(&bus.extra, PREDICTED_ARRIVAL_FIELDS).filter(|&e| e > 0);
            let destination = text_field(&bus.extra, DESTINATION_FIELDS, DESTINATION_KEY_HINTS);
            if let (Some(epoch), Some(dest)) = (predicted, destination) {
                let turn_key = (key.to_string(), normalize_for_match(&dest));
                let fresher = index
                    .turnarounds
                    .get(&turn_key)
                    .is_none_or(|existing| ts >= existing.ts);
                if fresher {
                    index.turnarounds.insert(turn_key, TurnaroundObs { epoch, ts });
                }
            }

            let Some(occupancy) = text_field(&bus.extra, OCCUPANCY_FIELDS, OCCUPANCY_KEY_HINTS)
            else {
                continue;
            };
            let ratio = ratio_from_text(&occupancy);
            let sample = OccupancySample {
                ts,
                text: occupancy,
                ratio,
            };
            if let Some(route) = route {
                index
                    .samples
                    .entry(route.to_string())
                    .or_default()
                    .push(sample.clone());
            }
            if let Some(pattern) = pattern {
                index
                    .samples
                    .entry(pattern.to_string())
                    .or_default()
                    .push(sample);
            }
        }

        for samples in index.samples.values_mut() {
            samples.sort_by_key(|s| s.ts);
        }

        index
    }

    /// Delay offset for a departure, keyed by route id with pattern-id
    /// fallback. Unknown keys mean no observed delay.
    pub fn delay_secs(&self, route_id: Option<&str>, pattern_id: &str) -> i64 {
        route_id
            .and_then(|r| self.delays.get(r))
            .or_else(|| self.delays.get(pattern_id))
            .map(|d| d.secs)
            .unwrap_or(0)
    }

    /// Predicted-arrival epoch for a vehicle turning around at the given
    /// stop, keyed by route-or-pattern and normalized stop name.
    pub fn turnaround_epoch(&self, key: &str, normalized_stop: &str) -> Option<i64> {
        self.turnarounds
            .get(&(key.to_string(), normalized_stop.to_string()))
            .map(|t| t.epoch)
    }

    /// Occupancy samples for a departure's route, falling back to its
    /// pattern.
    pub fn samples_for(&self, route_id: Option<&str>, pattern_id: &str) -> &[OccupancySample] {
        route_id
            .and_then(|r| self.samples.get(r))
            .or_else(|| self.samples.get(pattern_id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The sample closest in time to `target_ms`, within `window_ms`.
    ///
    /// Samples are time-sorted and the comparison is strict, so the
    /// earliest-encountered sample wins an exact tie.
    pub fn nearest_sample(
        &self,
        route_id: Option<&str>,
        pattern_id: &str,
        target_ms: i64,
        window_ms: i64,
    ) -> Option<&OccupancySample> {
        let mut best: Option<&OccupancySample> = None;
        let mut best_diff = i64::MAX;
        for sample in self.samples_for(route_id, pattern_id) {
            let diff = (sample.ts - target_ms).abs();
            if diff <= window_ms && diff < best_diff {
                best = Some(sample);
                best_diff = diff;
            }
        }
        best
    }

    /// Number of samples recorded under one key.
    pub fn sample_count(&self, key: &str) -> usize {
        self.samples.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Total samples across all keys.
    pub fn total_samples(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }
}
