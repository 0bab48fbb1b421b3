use tracing::debug;

use super::error::{validate_threshold, Result};
use super::normalizer::normalize;
use super::sequence::similarity_ratio;
use super::taxonomy::TaxonomyStore;
use super::types::{Detection, MatchStrategy, RfoMatch, TaxonomyEntry};
use super::TARGET_RFO;

/// Resolves free text against a taxonomy with three strategies, in order:
/// exact, fuzzy, substring. The first strategy that finds an entry wins.
///
/// Each strategy is a linear scan over the store, so a query costs
/// O(entries) comparisons; the taxonomy is small enough that no index is kept.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    store: &'a TaxonomyStore,
}

impl<'a> Matcher<'a> {
    pub fn new(store: &'a TaxonomyStore) -> Self {
        Self { store }
    }

    /// Classify `text`, accepting fuzzy candidates scoring at least `threshold`.
    ///
    /// Fails only when `threshold` is outside `[0, 1]`; that check comes before
    /// anything else, so an empty expression with a bad threshold still fails.
    pub fn match_expression(&self, text: &str, threshold: f64) -> Result<Detection<'a>> {
        // Checked ahead of the empty-input test on purpose: blank text with an
        // out-of-range threshold is an error, not an empty expression.
        let threshold = validate_threshold(threshold)?;
        Ok(self.classify(text, threshold))
    }

    /// Strategy cascade for a threshold already known to be within `[0, 1]`.
    pub(crate) fn classify(&self, text: &str, threshold: f64) -> Detection<'a> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            debug!(target: TARGET_RFO, "Empty expression after normalization: {:?}", text);
            return Detection::EmptyExpression;
        }

        if let Some(entry) = self.find_exact(&normalized) {
            debug!(
                target: TARGET_RFO,
                "Exact match: '{}' -> {} ({})", text, entry.code(), entry.description()
            );
            return Detection::Matched(RfoMatch {
                entry,
                strategy: MatchStrategy::Exact,
                score: Some(1.0),
            });
        }

        if let Some((entry, score)) = self.find_fuzzy(&normalized, threshold) {
            debug!(
                target: TARGET_RFO,
                "Fuzzy match: '{}' -> {} ({}) with similarity {:.3} (threshold: {:.3})",
                text,
                entry.code(),
                entry.description(),
                score,
                threshold
            );
            return Detection::Matched(RfoMatch {
                entry,
                strategy: MatchStrategy::Fuzzy,
                score: Some(score),
            });
        }

        if let Some(entry) = self.find_substring(&normalized) {
            debug!(
                target: TARGET_RFO,
                "Substring match: '{}' -> {} ({})", text, entry.code(), entry.description()
            );
            return Detection::Matched(RfoMatch {
                entry,
                strategy: MatchStrategy::Substring,
                score: None,
            });
        }

        debug!(target: TARGET_RFO, "No taxonomy entry for '{}'", text);
        Detection::NeedsUpgrade
    }

    /// First entry whose canonical description equals the normalized query.
    pub fn find_exact(&self, normalized: &str) -> Option<&'a TaxonomyEntry> {
        self.store
            .iter()
            .find(|entry| entry.normalized_description() == normalized)
    }

    /// Highest-scoring entry at or above `threshold`, with its score.
    ///
    /// Only a strictly higher score replaces the current best, so ties go to
    /// the entry that comes first in the store.
    pub fn find_fuzzy(
        &self,
        normalized: &str,
        threshold: f64,
    ) -> Option<(&'a TaxonomyEntry, f64)> {
        let mut best: Option<(&'a TaxonomyEntry, f64)> = None;

        for entry in self.store.iter() {
            let score = similarity_ratio(normalized, entry.normalized_description());
            if score < threshold {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry, score)),
            }
        }

        best
    }

    /// First entry where either canonical form contains the other.
    pub fn find_substring(&self, normalized: &str) -> Option<&'a TaxonomyEntry> {
        self.store.iter().find(|entry| {
            let description = entry.normalized_description();
            description.contains(normalized) || normalized.contains(description)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfo::error::MatchError;

    fn store(rows: &[(&str, &str)]) -> TaxonomyStore {
        let mut raw = String::from("Code\tRoot_Caused\tPriority\n");
        for (code, description) in rows {
            raw.push_str(&format!("{}\t{}\tCritical Impact\n", code, description));
        }
        TaxonomyStore::parse(&raw)
    }

    #[test]
    fn test_exact_takes_first_in_store_order() {
        let store = store(&[
            ("00020", "BTS, Power connector"),
            ("00022", "BTS, Power Connector (duplicate entry)"),
        ]);
        let matcher = Matcher::new(&store);

        let detection = matcher
            .match_expression("bts power connector", 0.8)
            .unwrap();
        let matched = detection.matched().unwrap();
        assert_eq!(matched.code(), "00020");
        assert_eq!(matched.strategy, MatchStrategy::Exact);
        assert_eq!(matched.score, Some(1.0));
    }

    #[test]
    fn test_fuzzy_picks_highest_score() {
        let store = store(&[("1", "rectifier issue"), ("2", "rectifier hardware issue")]);
        let matcher = Matcher::new(&store);

        let detection = matcher
            .match_expression("rectifier hardwar issue", 0.8)
            .unwrap();
        let matched = detection.matched().unwrap();
        assert_eq!(matched.code(), "2");
        assert_eq!(matched.strategy, MatchStrategy::Fuzzy);
        assert!(matched.score.unwrap() >= 0.8);
    }

    #[test]
    fn test_fuzzy_tie_keeps_earliest_entry() {
        let store = store(&[("first", "abcd"), ("second", "abce")]);
        let matcher = Matcher::new(&store);

        let (entry, score) = matcher.find_fuzzy("abcx", 0.7).unwrap();
        assert_eq!(entry.code(), "first");
        assert!((score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_fuzzy_threshold_monotonic() {
        let store = store(&[("1", "dg fan belt broken"), ("2", "dg fan belt loose")]);
        let matcher = Matcher::new(&store);
        let query = "dg fan belt brokn";

        let mut previous: Option<f64> = None;
        for step in 0..=20 {
            let threshold = step as f64 / 20.0;
            match matcher.find_fuzzy(query, threshold) {
                Some((_, score)) => {
                    assert!(score >= threshold);
                    if let Some(previous) = previous {
                        assert!(score >= previous);
                    }
                    previous = Some(score);
                }
                None => {
                    // Once nothing qualifies, no higher threshold finds anything.
                    for higher in step..=20 {
                        assert!(matcher.find_fuzzy(query, higher as f64 / 20.0).is_none());
                    }
                    break;
                }
            }
        }
    }

    #[test]
    fn test_zero_threshold_accepts_zero_score() {
        let store = store(&[("1", "abc")]);
        let matcher = Matcher::new(&store);
        let (entry, score) = matcher.find_fuzzy("xyz", 0.0).unwrap();
        assert_eq!(entry.code(), "1");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_substring_both_directions() {
        let store = store(&[("00207", "Fiber cut access"), ("00198", "Vandalism")]);
        let matcher = Matcher::new(&store);

        let shorter = matcher.match_expression("fiber", 0.8).unwrap();
        let matched = shorter.matched().unwrap();
        assert_eq!(matched.code(), "00207");
        assert_eq!(matched.strategy, MatchStrategy::Substring);
        assert_eq!(matched.score, None);

        let longer = matcher
            .match_expression("technician reports fiber cut access near the hub", 0.8)
            .unwrap();
        assert_eq!(longer.matched().unwrap().code(), "00207");
        assert_eq!(longer.matched().unwrap().strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_fuzzy_wins_over_substring() {
        // "cable theft" scores above the threshold against the second entry,
        // while the first entry only matches as a substring.
        let store = store(&[("1", "cable"), ("2", "cable thef")]);
        let matcher = Matcher::new(&store);

        let detection = matcher.match_expression("cable theft", 0.8).unwrap();
        let matched = detection.matched().unwrap();
        assert_eq!(matched.code(), "2");
        assert_eq!(matched.strategy, MatchStrategy::Fuzzy);
    }

    #[test]
    fn test_unmatched_and_empty_are_distinct() {
        let store = store(&[("00001", "BTS, CPRI")]);
        let matcher = Matcher::new(&store);

        assert_eq!(
            matcher.match_expression("xyz123", 0.8).unwrap(),
            Detection::NeedsUpgrade
        );
        assert_eq!(
            matcher.match_expression("", 0.8).unwrap(),
            Detection::EmptyExpression
        );
        assert_eq!(
            matcher.match_expression("  (n/a) ", 0.8).unwrap(),
            Detection::EmptyExpression
        );
    }

    #[test]
    fn test_invalid_threshold_fails_first() {
        let store = store(&[("00001", "BTS, CPRI")]);
        let matcher = Matcher::new(&store);

        assert_eq!(
            matcher.match_expression("BTS, CPRI", 1.5),
            Err(MatchError::InvalidThreshold(1.5))
        );
        assert!(matcher.match_expression("", -0.5).is_err());
    }

    #[test]
    fn test_blank_text_with_bad_threshold_is_an_error() {
        let store = store(&[("00001", "BTS, CPRI")]);
        let matcher = Matcher::new(&store);

        for text in ["", "   ", "(n/a)"] {
            assert_eq!(
                matcher.match_expression(text, 1.5),
                Err(MatchError::InvalidThreshold(1.5))
            );
            assert_eq!(
                matcher.match_expression(text, 1.0).unwrap(),
                Detection::EmptyExpression
            );
        }
    }

    #[test]
    fn test_empty_store_needs_upgrade() {
        let store = TaxonomyStore::default();
        let matcher = Matcher::new(&store);
        assert_eq!(
            matcher.match_expression("BTS, CPRI", 0.8).unwrap(),
            Detection::NeedsUpgrade
        );
    }
}
