//! Text normalization for stop-name matching.
//!
//! Upstream titles mix full-width and half-width spacing, so all matching
//! goes through whitespace-stripped forms. Case folding is included for the
//! occasional romanized title.

/// Strip all whitespace (including full-width spaces) from a string.
pub fn normalize_text(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalized form used for matching: whitespace stripped, lowercased.
pub fn normalize_for_match(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The display name of a stop from a timetable/pattern note.
///
/// Notes are of the form `name` or `name:qualifier`; only the leading
/// segment is the stop name.
pub fn stop_name_from_note(note: &str) -> &str {
    note.split(':').next().unwrap_or(note)
}
