//! Stop suggestions for incremental text queries.
//!
//! Candidates come from the cached roster; an optional anchor stop narrows
//! them to stops sharing a route pattern with the anchor, which is how
//! destination suggestions tighten once an origin is chosen.

use std::collections::HashSet;

use crate::domain::{StopPole, Suggestion, normalize_for_match};
use crate::odpt::OdptError;

use super::resolver::StopResolver;

/// Default number of suggestions returned.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 20;
/// Hard cap on suggestions per query.
pub const MAX_SUGGESTION_LIMIT: usize = 50;

impl StopResolver {
    /// Suggest stops matching a text query.
    ///
    /// Missing credential and blank queries yield an empty list, never an
    /// error.
    pub async fn suggest(
        &self,
        query: &str,
        anchor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Suggestion>, OdptError> {
        let limit = limit
            .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
            .clamp(1, MAX_SUGGESTION_LIMIT);
        let trimmed = query.trim();
        if trimmed.is_empty() || !self.client().has_credential() {
            return Ok(Vec::new());
        }

        let anchor = anchor.map(str::trim).filter(|a| !a.is_empty());

        let (roster, anchor_poles) = match anchor {
            // The roster fetch and the anchor resolution are independent.
            Some(a) => {
                let (roster, poles) = tokio::try_join!(self.roster(), self.resolve(a))?;
                (roster, Some(poles))
            }
            None => (self.roster().await?, None),
        };

        let mut candidates: Vec<&StopPole> = roster.iter().collect();

        if let Some(anchor) = anchor {
            let union = anchor_pattern_union(
                &roster,
                anchor_poles.as_deref().map(Vec::as_slice).unwrap_or(&[]),
                &normalize_for_match(anchor),
            );
            // An anchor with no known patterns narrows nothing.
            if !union.is_empty() {
                candidates.retain(|p| p.serves_any(&union));
            }
        }

        Ok(rank_suggestions(
            &candidates,
            &normalize_for_match(trimmed),
            limit,
        ))
    }
}

/// Union of the pattern ids serving the anchor: every roster stop whose
/// normalized title contains the anchor text, plus the anchor's own resolved
/// poles.
pub fn anchor_pattern_union(
    roster: &[StopPole],
    anchor_poles: &[StopPole],
    normalized_anchor: &str,
) -> HashSet<String> {
    let mut union: HashSet<String> = roster
        .iter()
        .filter(|p| p.normalized_title().contains(normalized_anchor))
        .flat_map(|p| p.patterns.iter().cloned())
        .collect();
    for pole in anchor_poles {
        union.extend(pole.patterns.iter().cloned());
    }
    union
}

/// Rank matching candidates: prefix matches before substring-only matches,
/// ties broken by shorter title then lexicographic order; duplicate titles
/// collapse to the first occurrence.
pub fn rank_suggestions(
    candidates: &[&StopPole],
    normalized_query: &str,
    limit: usize,
) -> Vec<Suggestion> {
    let mut scored: Vec<(&StopPole, u8)> = candidates
        .iter()
        .filter_map(|pole| {
            let name = pole.normalized_title();
            if !name.contains(normalized_query) {
                return None;
            }
            let score = if name.starts_with(normalized_query) { 0 } else { 1 };
            Some((*pole, score))
        })
        .collect();

    scored.sort_by(|(a, score_a), (b, score_b)| {
        score_a
            .cmp(score_b)
            .then_with(|| a.title.chars().count().cmp(&b.title.chars().count()))
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut seen_titles = HashSet::new();
    let mut results = Vec::new();
    for (pole, _) in scored {
        if results.len() >= limit {
            break;
        }
        if !seen_titles.insert(pole.title.clone()) {
            continue;
        }
        results.push(Suggestion {
            id: pole.id.clone(),
            title: pole.title.clone(),
        });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pole(id: &str, title: &str, patterns: &[&str]) -> StopPole {
        StopPole {
            id: id.into(),
            title: title.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn rank_titles(poles: &[StopPole], query: &str, limit: usize) -> Vec<String> {
        let refs: Vec<&StopPole> = poles.iter().collect();
        rank_suggestions(&refs, &normalize_for_match(query), limit)
            .into_iter()
            .map(|s| s.title)
            .collect()
    }

    #[test]
    fn prefix_matches_rank_before_substring_matches() {
        let poles = vec![
            pole("1", "Kiba Toyosu", &[]),
            pole("2", "Toyosu Station", &[]),
            pole("3", "Toyosu Pier", &[]),
        ];
        assert_eq!(
            rank_titles(&poles, "Toyosu", 10),
            vec!["Toyosu Pier", "Toyosu Station", "Kiba Toyosu"]
        );
    }

    #[test]
    fn shorter_title_wins_among_prefix_matches() {
        let poles = vec![
            pole("1", "豊洲駅前ターミナル", &[]),
            pole("2", "豊洲駅前", &[]),
        ];
        assert_eq!(rank_titles(&poles, "豊洲", 10), vec!["豊洲駅前", "豊洲駅前ターミナル"]);
    }

    #[test]
    fn equal_length_titles_sort_lexicographically() {
        let poles = vec![pole("1", "豊洲二丁目", &[]), pole("2", "豊洲一丁目", &[])];
        assert_eq!(rank_titles(&poles, "豊洲", 10), vec!["豊洲一丁目", "豊洲二丁目"]);
    }

    #[test]
    fn duplicate_titles_collapse() {
        let poles = vec![
            pole("1", "豊洲駅前", &[]),
            pole("2", "豊洲駅前", &[]),
            pole("3", "豊洲", &[]),
        ];
        assert_eq!(rank_titles(&poles, "豊洲", 10), vec!["豊洲", "豊洲駅前"]);
    }

    #[test]
    fn limit_truncates_after_collapsing() {
        let poles = vec![
            pole("1", "豊洲", &[]),
            pole("2", "豊洲駅前", &[]),
            pole("3", "豊洲市場", &[]),
        ];
        assert_eq!(rank_titles(&poles, "豊洲", 2).len(), 2);
    }

    #[test]
    fn non_matching_candidates_are_excluded() {
        let poles = vec![pole("1", "枝川", &[])];
        assert!(rank_titles(&poles, "豊洲", 10).is_empty());
    }

    #[test]
    fn matching_is_case_and_whitespace_insensitive() {
        let poles = vec![pole("1", "Toyosu Station", &[])];
        assert_eq!(rank_titles(&poles, "toyosu", 10), vec!["Toyosu Station"]);
    }

    #[test]
    fn anchor_union_collects_patterns_from_roster_and_resolution() {
        let roster = vec![
            pole("1", "枝川", &["P"]),
            pole("2", "枝川二丁目", &["Q"]),
            pole("3", "豊洲駅前", &["R"]),
        ];
        let resolved = vec![pole("9", "枝川", &["S"])];
        let union = anchor_pattern_union(&roster, &resolved, &normalize_for_match("枝川"));
        assert!(union.contains("P"));
        assert!(union.contains("Q"));
        assert!(union.contains("S"));
        assert!(!union.contains("R"));
    }

    #[test]
    fn anchor_narrows_candidates_to_shared_patterns() {
        // The anchor's only serving pattern is P; the query matches stops on
        // patterns {P, Q}; only the stop on P survives.
        let roster = vec![
            pole("anchor", "枝川", &["P"]),
            pole("on-p", "豊洲駅前", &["P"]),
            pole("on-q", "豊洲市場", &["Q"]),
        ];
        let union = anchor_pattern_union(&roster, &[], &normalize_for_match("枝川"));
        let candidates: Vec<&StopPole> = roster.iter().filter(|p| p.serves_any(&union)).collect();
        let suggestions = rank_suggestions(&candidates, &normalize_for_match("豊洲"), 10);
        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["豊洲駅前"]);
    }
}
