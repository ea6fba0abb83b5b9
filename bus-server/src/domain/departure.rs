//! The query output: one upcoming departure.

use serde::Serialize;

use super::occupancy::OccupancyLevel;

/// One ranked departure for an origin/destination query.
///
/// Constructed fresh per query and never persisted. `departure_epoch` is the
/// realtime-adjusted time and is never earlier than `scheduled_epoch`; the
/// turnaround override can only push it later still.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    /// Stable-ish display id: route key plus adjusted "HH:MM".
    pub id: String,
    pub route_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// The origin stop as the user asked for it.
    pub origin_stop_name: String,
    /// The specific boarding pole's display name.
    pub origin_pole_name: String,
    /// Destination display name; empty when the route name already encodes it.
    pub dest_stop_name: String,
    pub scheduled_time: String,
    pub scheduled_epoch: i64,
    /// Minutes between the final adjusted time and the schedule, so the
    /// turnaround override is reflected here too.
    pub delay_minutes: i64,
    /// Adjusted departure time, "HH:MM".
    pub departure_time: String,
    pub departure_epoch: i64,
    pub eta_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<String>,
    pub occupancy_level: OccupancyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_ratio: Option<u8>,
    /// Last departure of the service day on this route.
    pub is_last: bool,
}
