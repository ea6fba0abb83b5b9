//! Route grouping keys.
//!
//! Branch variants of one line ("海01-2", "海01-3") publish separate
//! patterns but are the same series for a rider waiting at a stop. The
//! grouping key strips the trailing numeric branch suffix so they merge
//! during deduplication.

/// Dash characters that may precede a numeric branch suffix.
const BRANCH_DASHES: &[char] = &['-', '‐', '‑', '–', '—'];

/// Strip a trailing numeric branch suffix (optionally preceded by a dash)
/// from a route display name. Returns the trimmed name unchanged when no
/// suffix is present, and an empty string for an all-suffix name.
pub fn strip_branch_from_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let without_digits = trimmed.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == trimmed.len() {
        return trimmed.to_string();
    }
    without_digits
        .strip_suffix(BRANCH_DASHES)
        .unwrap_or(without_digits)
        .to_string()
}

/// Strip the final dot-separated segment from a pattern identifier
/// (`odpt.BusroutePattern:Toei.海01.40301` -> `odpt.BusroutePattern:Toei.海01`).
pub fn strip_branch_from_pattern(pattern_id: &str) -> String {
    match pattern_id.rfind('.') {
        Some(idx) => pattern_id[..idx].to_string(),
        None => pattern_id.to_string(),
    }
}

/// Grouping key for a departure: branch-stripped display name, falling back
/// to the branch-stripped pattern id, then the route id, then whatever
/// non-empty identifier remains.
pub fn route_key(route_name: &str, route_id: &str, pattern_id: &str) -> String {
    let base_name = strip_branch_from_name(route_name);
    if !base_name.is_empty() {
        return base_name;
    }
    let base_pattern = strip_branch_from_pattern(pattern_id);
    if !base_pattern.is_empty() {
        return base_pattern;
    }
    if !route_id.is_empty() {
        return route_id.to_string();
    }
    if !route_name.is_empty() {
        route_name.to_string()
    } else {
        pattern_id.to_string()
    }
}
