use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::info;

use super::error::{validate_threshold, Result};
use super::matcher::Matcher;
use super::normalizer::normalize;
use super::taxonomy::TaxonomyStore;
use super::types::{Detection, Priority, TaxonomyEntry};
use super::TARGET_RFO;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Read-only query interface over a shared taxonomy store.
///
/// Cloning is cheap and clones share the same store, so one detector can be
/// handed to any number of threads.
#[derive(Debug, Clone)]
pub struct RfoDetector {
    store: Arc<TaxonomyStore>,
    threshold: f64,
}

impl Default for RfoDetector {
    fn default() -> Self {
        Self::new(TaxonomyStore::embedded())
    }
}

impl RfoDetector {
    pub fn new(store: TaxonomyStore) -> Self {
        Self::from_shared(Arc::new(store))
    }

    pub fn from_shared(store: Arc<TaxonomyStore>) -> Self {
        Self {
            store,
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    /// Replace the default fuzzy threshold used by [`RfoDetector::detect_expression`].
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        self.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.store)
    }

    /// Classify one expression with the detector's default threshold.
    pub fn detect_expression(&self, text: &str) -> Detection<'_> {
        // Validated by `with_threshold`.
        self.matcher().classify(text, self.threshold)
    }

    pub fn detect_expression_with_threshold(
        &self,
        text: &str,
        threshold: f64,
    ) -> Result<Detection<'_>> {
        self.matcher().match_expression(text, threshold)
    }

    /// First entry with exactly this code.
    pub fn get_by_code(&self, code: &str) -> Option<&TaxonomyEntry> {
        self.store.iter().find(|entry| entry.code() == code)
    }

    /// Every entry with this priority, in store order.
    pub fn get_by_priority(&self, priority: Priority) -> Vec<&TaxonomyEntry> {
        self.store
            .iter()
            .filter(|entry| entry.priority() == priority)
            .collect()
    }

    /// Entries whose canonical description contains the normalized term.
    /// A term that normalizes to nothing matches nothing.
    pub fn search(&self, term: &str) -> Vec<&TaxonomyEntry> {
        let normalized = normalize(term);
        if normalized.is_empty() {
            return Vec::new();
        }

        self.store
            .iter()
            .filter(|entry| entry.normalized_description().contains(&normalized))
            .collect()
    }

    /// Classify a batch of technician expressions, e.g. one report column.
    pub fn classify_all<'s, I>(&self, expressions: I) -> ClassificationReport<'_>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut report = ClassificationReport::default();
        let mut seen_unmatched = HashSet::new();

        for expression in expressions {
            let detection = self.detect_expression(expression);
            match &detection {
                Detection::Matched(m) => {
                    report.matched += 1;
                    *report.by_priority.entry(m.priority()).or_insert(0) += 1;
                }
                Detection::EmptyExpression => report.empty += 1,
                Detection::NeedsUpgrade => {
                    report.needs_upgrade += 1;
                    let trimmed = expression.trim();
                    if seen_unmatched.insert(normalize(trimmed)) {
                        report.upgrade_candidates.push(trimmed.to_string());
                    }
                }
            }
            report.results.push(ClassifiedExpression {
                expression: expression.to_string(),
                detection,
            });
        }

        info!(
            target: TARGET_RFO,
            "Classified {} expressions: {} matched, {} empty, {} need taxonomy upgrade",
            report.results.len(),
            report.matched,
            report.empty,
            report.needs_upgrade
        );

        report
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedExpression<'a> {
    pub expression: String,
    #[serde(flatten)]
    pub detection: Detection<'a>,
}

/// Batch classification summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationReport<'a> {
    pub results: Vec<ClassifiedExpression<'a>>,
    pub matched: usize,
    pub empty: usize,
    pub needs_upgrade: usize,
    pub by_priority: BTreeMap<Priority, usize>,
    // Distinct unmatched expressions, first-seen order, for curator review
    pub upgrade_candidates: Vec<String>,
}
