//! Stop poles and suggestions.

use serde::Serialize;

use super::text::normalize_for_match;

/// A single physical boarding point.
///
/// A named "stop" may have several poles; each pole carries the list of
/// route patterns serving it. Immutable once fetched, for one cache TTL
/// window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPole {
    /// Canonical upstream identifier (`owl:sameAs`).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Route-pattern ids serving this pole.
    pub patterns: Vec<String>,
}

impl StopPole {
    /// Matching form of the title.
    pub fn normalized_title(&self) -> String {
        normalize_for_match(&self.title)
    }

    /// Whether this pole shares at least one pattern with the given set.
    pub fn serves_any(&self, patterns: &std::collections::HashSet<String>) -> bool {
        self.patterns.iter().any(|p| patterns.contains(p))
    }
}

/// A stop suggestion for a text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
}
