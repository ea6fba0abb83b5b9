//! Route patterns: directional stop-sequence variants of a route.

use super::text::stop_name_from_note;

/// One stop position within a pattern's ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRef {
    /// Pole identifier, possibly empty for malformed upstream rows.
    pub pole_id: String,
    /// Stop display name, extracted from the free-text note.
    pub name: String,
    /// Position in the sequence.
    pub index: usize,
}

/// One directional variant of a bus route.
///
/// Immutable for its cache lifetime. The stop sequence order is the order
/// vehicles serve the stops; origin-before-destination checks rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub id: String,
    /// Owning route id, when the upstream record carries one.
    pub route_id: Option<String>,
    pub title: String,
    pub stops: Vec<StopRef>,
}

impl RoutePattern {
    /// The owning route id, inferred from the pattern id when the record
    /// itself lacks one.
    pub fn effective_route_id(&self) -> Option<String> {
        self.route_id
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| infer_route_id(&self.id))
    }
}

/// Infer a route id from a pattern id of the form
/// `odpt.BusroutePattern:Toei.<route>.<branch>`.
pub fn infer_route_id(pattern_id: &str) -> Option<String> {
    let rest = pattern_id.strip_prefix("odpt.BusroutePattern:Toei.")?;
    let (route, rest) = rest.split_once('.')?;
    if route.is_empty() || rest.is_empty() {
        return None;
    }
    Some(format!("odpt.Busroute:Toei.{route}"))
}

/// Build a `StopRef` from a raw (pole id, note) pair.
pub fn stop_ref(pole_id: Option<&str>, note: Option<&str>, index: usize) -> StopRef {
    StopRef {
        pole_id: pole_id.unwrap_or_default().to_string(),
        name: stop_name_from_note(note.unwrap_or_default()).to_string(),
        index,
    }
}
