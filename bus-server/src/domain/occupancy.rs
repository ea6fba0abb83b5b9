//! Occupancy text interpretation.
//!
//! The live feed reports occupancy as free-form operator text: sometimes a
//! literal percentage, sometimes qualitative wording (Japanese or English).
//! Text converts to a 0-100 ratio where possible, and the ratio buckets into
//! a coarse level for display.

use serde::Serialize;

/// Coarse occupancy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyLevel {
    Low,
    Medium,
    High,
    Unknown,
}

/// Representative ratios for qualitative occupancy wording.
const HIGH_RATIO: u8 = 85;
const MEDIUM_RATIO: u8 = 55;
const LOW_RATIO: u8 = 25;

const HIGH_KEYWORDS: &[&str] = &["満", "full", "high", "crowd"];
const MEDIUM_KEYWORDS: &[&str] = &["多", "medium", "normal"];
const LOW_KEYWORDS: &[&str] = &["少", "low", "empty"];

/// "no data" marker some feeds send instead of omitting the field.
const NO_DATA_MARKER: &str = "データなし";

/// Derive a 0-100 occupancy ratio from operator text.
///
/// A literal number (first run of up to three digits) wins; otherwise
/// qualitative keywords map to fixed representative ratios; otherwise `None`.
pub fn ratio_from_text(text: &str) -> Option<u8> {
    if let Some(n) = leading_number(text) {
        return Some(n.min(100) as u8);
    }
    let lower = text.to_lowercase();
    if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(HIGH_RATIO);
    }
    if MEDIUM_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(MEDIUM_RATIO);
    }
    if LOW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(LOW_RATIO);
    }
    None
}

/// Bucket a ratio: >=70 high, >=40 medium, otherwise low.
pub fn level_from_ratio(ratio: u8) -> OccupancyLevel {
    if ratio >= 70 {
        OccupancyLevel::High
    } else if ratio >= 40 {
        OccupancyLevel::Medium
    } else {
        OccupancyLevel::Low
    }
}

/// Bucket raw text directly, for samples that never yielded a ratio.
///
/// Unmapped non-empty text reads as medium: the vehicle reported something,
/// just not in a recognized vocabulary.
pub fn level_from_text(text: Option<&str>) -> OccupancyLevel {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return OccupancyLevel::Unknown;
    };
    if text.contains(NO_DATA_MARKER) {
        return OccupancyLevel::Medium;
    }
    let lower = text.to_lowercase();
    if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        OccupancyLevel::High
    } else if MEDIUM_KEYWORDS.iter().any(|k| lower.contains(k)) {
        OccupancyLevel::Medium
    } else if LOW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        OccupancyLevel::Low
    } else {
        OccupancyLevel::Medium
    }
}

/// First run of up to three ASCII digits in the text.
fn leading_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(3)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_percentage_wins() {
        assert_eq!(ratio_from_text("45%"), Some(45));
        assert_eq!(ratio_from_text("乗車率 80%"), Some(80));
        // clamped to 100
        assert_eq!(ratio_from_text("150"), Some(100));
        // only the first three digits are read
        assert_eq!(ratio_from_text("1234"), Some(100));
    }

    #[test]
    fn keywords_map_to_representative_ratios() {
        assert_eq!(ratio_from_text("満員"), Some(85));
        assert_eq!(ratio_from_text("Crowded"), Some(85));
        assert_eq!(ratio_from_text("やや多い"), Some(55));
        assert_eq!(ratio_from_text("空席少"), Some(25));
        assert_eq!(ratio_from_text("empty"), Some(25));
        assert_eq!(ratio_from_text("???"), None);
    }

    #[test]
    fn ratio_buckets() {
        assert_eq!(level_from_ratio(85), OccupancyLevel::High);
        assert_eq!(level_from_ratio(70), OccupancyLevel::High);
        assert_eq!(level_from_ratio(69), OccupancyLevel::Medium);
        assert_eq!(level_from_ratio(40), OccupancyLevel::Medium);
        assert_eq!(level_from_ratio(39), OccupancyLevel::Low);
        assert_eq!(level_from_ratio(0), OccupancyLevel::Low);
    }

    #[test]
    fn text_fallback_levels() {
        assert_eq!(level_from_text(None), OccupancyLevel::Unknown);
        assert_eq!(level_from_text(Some("")), OccupancyLevel::Unknown);
        assert_eq!(level_from_text(Some("データなし")), OccupancyLevel::Medium);
        assert_eq!(level_from_text(Some("満員")), OccupancyLevel::High);
        assert_eq!(level_from_text(Some("少なめ")), OccupancyLevel::Low);
        // unmapped wording still means the vehicle reported something
        assert_eq!(level_from_text(Some("不明な表現")), OccupancyLevel::Medium);
    }
}
