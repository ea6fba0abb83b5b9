//! Pattern matching: which route patterns bridge origin and destination.

use std::collections::HashSet;

use crate::domain::{RoutePattern, normalize_for_match};
use crate::odpt::TimetableObjectDto;

/// Matching criteria for one side of a query: resolved pole ids, plus name
/// variants for note-text matching.
///
/// Id matching takes precedence whenever any ids exist; note text is generic
/// enough ("station front") that it only serves as the fallback when
/// resolution produced no ids at all.
#[derive(Debug, Clone)]
pub struct StopMatchSet {
    ids: HashSet<String>,
    /// Normalized name variants.
    names: Vec<String>,
}

impl StopMatchSet {
    pub fn new(ids: impl IntoIterator<Item = String>, names: &[String]) -> Self {
        Self {
            ids: ids.into_iter().filter(|s| !s.is_empty()).collect(),
            names: names.iter().map(|n| normalize_for_match(n)).collect(),
        }
    }

    /// Whether a (pole id, stop name) pair matches this side.
    pub fn matches(&self, pole_id: &str, name: &str) -> bool {
        if !self.ids.is_empty() {
            self.ids.contains(pole_id)
        } else {
            let normalized = normalize_for_match(name);
            self.names.iter().any(|n| *n == normalized)
        }
    }
}

/// A pattern that serves the origin strictly before the destination.
#[derive(Debug, Clone)]
pub struct CandidatePattern {
    pub pattern_id: String,
    pub route_id: Option<String>,
    pub title: String,
}

/// Scan every pattern's stop sequence once and keep those where the first
/// origin match comes strictly before the first destination match.
pub fn match_patterns(
    patterns: &[RoutePattern],
    origin: &StopMatchSet,
    dest: &StopMatchSet,
) -> Vec<CandidatePattern> {
    patterns
        .iter()
        .filter_map(|pattern| {
            let mut origin_idx = None;
            let mut dest_idx = None;
            for (i, stop) in pattern.stops.iter().enumerate() {
                if origin_idx.is_none() && origin.matches(&stop.pole_id, &stop.name) {
                    origin_idx = Some(i);
                }
                if dest_idx.is_none() && dest.matches(&stop.pole_id, &stop.name) {
                    dest_idx = Some(i);
                }
            }
            match (origin_idx, dest_idx) {
                (Some(o), Some(d)) if o < d => Some(CandidatePattern {
                    pattern_id: pattern.id.clone(),
                    route_id: pattern.effective_route_id(),
                    title: pattern.title.clone(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Locate a stop within a timetable's visit order using the same
/// id-or-note rule; per-timetable order can differ from the pattern's
/// canonical order, so each timetable is searched independently.
pub fn find_visit_index(visits: &[TimetableObjectDto], set: &StopMatchSet) -> Option<usize> {
    visits.iter().position(|v| {
        set.matches(
            v.pole.as_deref().unwrap_or_default(),
            crate::domain::stop_name_from_note(v.note.as_deref().unwrap_or_default()),
        )
    })
}
