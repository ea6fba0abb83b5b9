//! Timetable projection: scheduled rows to realtime-adjusted departures.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::trace;

use crate::domain::{
    Departure, LAST_RUN_MARKER, format_hhmm, level_from_ratio, level_from_text,
    normalize_for_match, normalize_text, operator_tz, project_time, ratio_from_text, route_key,
};
use crate::odpt::extract::{STATUS_FIELDS, STATUS_KEY_HINTS, text_field};
use crate::odpt::BusTimetableDto;
use crate::realtime::RealtimeIndex;

use super::matcher::{CandidatePattern, StopMatchSet, find_visit_index};

/// A projected departure plus the grouping metadata the aggregator needs.
#[derive(Debug, Clone)]
pub(crate) struct ProjectedDeparture {
    pub departure: Departure,
    pub route_key: String,
    pub status_is_last: bool,
}

/// Shared inputs for projecting one query's timetables.
pub(crate) struct ProjectionContext<'a> {
    /// The origin stop as the user typed it.
    pub origin_query: &'a str,
    /// The destination stop as the user typed it.
    pub dest_query: &'a str,
    pub origin_set: &'a StopMatchSet,
    pub dest_set: &'a StopMatchSet,
    /// Resolved pole id -> display title, for the boarding-pole name.
    pub origin_pole_titles: &'a HashMap<String, String>,
    pub realtime: &'a RealtimeIndex,
    pub occupancy_window_ms: i64,
    pub now: DateTime<FixedOffset>,
}

/// Project one timetable (one scheduled run) into a departure.
///
/// Returns `None` when the run doesn't bridge origin and destination in
/// order, or its origin row has no parseable time; such rows are skipped
/// individually.
pub(crate) fn project_timetable(
    tt: &BusTimetableDto,
    candidate: &CandidatePattern,
    ctx: &ProjectionContext<'_>,
) -> Option<ProjectedDeparture> {
    let visits = tt.stop_visits();
    let origin_idx = find_visit_index(visits, ctx.origin_set)?;
    let dest_idx = find_visit_index(visits, ctx.dest_set)?;
    if origin_idx >= dest_idx {
        return None;
    }

    let row = &visits[origin_idx];
    let time_str = row.time_str()?;
    let scheduled = project_time(time_str, row.is_midnight.unwrap_or(false), ctx.now)?;
    let scheduled_ms = scheduled.timestamp_millis();

    let route_id = candidate.route_id.as_deref();
    let delay_secs = ctx.realtime.delay_secs(route_id, &candidate.pattern_id);
    let mut adjusted_ms = scheduled_ms + delay_secs * 1000;

    // A vehicle whose previous leg is running late enough that its delay
    // figure alone understates the wait: the predicted arrival at our origin
    // overrides, but only ever later.
    let turn_key = route_id.unwrap_or(&candidate.pattern_id);
    if let Some(predicted) = ctx
        .realtime
        .turnaround_epoch(turn_key, &normalize_for_match(ctx.origin_query))
    {
        if predicted > adjusted_ms {
            trace!(pattern = %candidate.pattern_id, "turnaround override applied");
            adjusted_ms = predicted;
        }
    }

    let adjusted = DateTime::<Utc>::from_timestamp_millis(adjusted_ms)?.with_timezone(&operator_tz());

    // Delay reported from the final adjusted time, so the turnaround
    // override shows up in the displayed delay.
    let delay_minutes = minutes_between(scheduled_ms, adjusted_ms);
    let eta_minutes = minutes_between(ctx.now.timestamp_millis(), adjusted_ms);

    let sample = ctx.realtime.nearest_sample(
        route_id,
        &candidate.pattern_id,
        adjusted_ms,
        ctx.occupancy_window_ms,
    );
    let occupancy = sample.map(|s| s.text.clone());
    let occupancy_ratio = sample.and_then(|s| s.ratio.or_else(|| ratio_from_text(&s.text)));
    let occupancy_level = match occupancy_ratio {
        Some(ratio) => level_from_ratio(ratio),
        None => level_from_text(occupancy.as_deref()),
    };

    let route_name = display_route_name(tt, candidate);
    let key = route_key(
        &route_name,
        route_id.unwrap_or_default(),
        &candidate.pattern_id,
    );

    // When the route name already encodes the destination, showing it again
    // is noise.
    let dest_stop_name =
        if normalize_text(&route_name).contains(&normalize_text(ctx.dest_query)) {
            String::new()
        } else {
            ctx.dest_query.to_string()
        };

    let origin_pole_name = row
        .pole
        .as_deref()
        .and_then(|p| ctx.origin_pole_titles.get(p))
        .cloned()
        .or_else(|| {
            row.note
                .as_deref()
                .map(crate::domain::stop_name_from_note)
                .filter(|n| !n.is_empty())
                .map(String::from)
        })
        .unwrap_or_else(|| ctx.origin_query.to_string());

    let status_is_last = text_field(&tt.extra, STATUS_FIELDS, STATUS_KEY_HINTS)
        .is_some_and(|status| status.contains(LAST_RUN_MARKER));

    let departure_time = format_hhmm(adjusted);
    Some(ProjectedDeparture {
        departure: Departure {
            id: format!("{key}-{departure_time}"),
            route_name,
            route_id: candidate.route_id.clone(),
            pattern_id: Some(candidate.pattern_id.clone()),
            origin_stop_name: ctx.origin_query.to_string(),
            origin_pole_name,
            dest_stop_name,
            scheduled_time: format_hhmm(scheduled),
            scheduled_epoch: scheduled_ms,
            delay_minutes,
            departure_time,
            departure_epoch: adjusted_ms,
            eta_minutes,
            occupancy,
            occupancy_level,
            occupancy_ratio,
            is_last: false,
        },
        route_key: key,
        status_is_last,
    })
}

/// Route display name: the timetable title, else the pattern title, else the
/// route id, else the pattern id.
fn display_route_name(tt: &BusTimetableDto, candidate: &CandidatePattern) -> String {
    tt.title
        .as_deref()
        .filter(|t| !t.is_empty())
        .or(Some(candidate.title.as_str()).filter(|t| !t.is_empty()))
        .or(candidate.route_id.as_deref().filter(|t| !t.is_empty()))
        .unwrap_or(&candidate.pattern_id)
        .to_string()
}

/// Whole minutes between two epochs, floored at zero.
fn minutes_between(from_ms: i64, to_ms: i64) -> i64 {
    (((to_ms - from_ms) as f64 / 60_000.0).round() as i64).max(0)
}
