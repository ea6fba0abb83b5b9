//! Core domain types and pure algorithms.

mod departure;
mod occupancy;
mod pattern;
mod route_key;
mod stop;
mod text;
mod time;

pub use departure::Departure;
pub use occupancy::{OccupancyLevel, level_from_ratio, level_from_text, ratio_from_text};
pub use pattern::{RoutePattern, StopRef, infer_route_id, stop_ref};
pub use route_key::{route_key, strip_branch_from_name, strip_branch_from_pattern};
pub use stop::{StopPole, Suggestion};
pub use text::{normalize_for_match, normalize_text, stop_name_from_note};
pub use time::{
    format_hhmm, operator_tz, parse_hhmm, project_time, service_day, LAST_RUN_MARKER,
};
