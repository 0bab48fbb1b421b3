//! Taxonomy store
//!
//! Parses the three-column fault taxonomy (code, root-cause description,
//! priority) into an immutable, ordered list of entries. Order follows the
//! source rows and decides ties during fuzzy and substring scans.
//!
//! Parsing never fails on bad rows: rows that cannot yield a usable entry are
//! skipped and counted, and unknown priority labels fall back to
//! `Moderate Impact` (counted separately) so one bad label never drops a code.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::types::{Priority, TaxonomyEntry, TaxonomyStats};
use super::TARGET_RFO;

/// The curated RFO taxonomy shipped with the crate.
pub const EMBEDDED_TAXONOMY: &str = include_str!("../../data/rfo_taxonomy.tsv");

/// Priority assigned when a row's label is not one of the four known labels.
pub const FALLBACK_PRIORITY: Priority = Priority::ModerateImpact;

lazy_static! {
    // Column separator for rows that are not tab-delimited.
    static ref FIELD_GAP: Regex = Regex::new(r"\s{2,}").unwrap();
}

#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    entries: Vec<TaxonomyEntry>,
    skipped_rows: usize,
    unknown_priority_rows: usize,
}

impl TaxonomyStore {
    /// Build a store from tabular text whose first non-blank line is a header.
    pub fn parse(raw: &str) -> Self {
        let mut store = TaxonomyStore::default();

        let mut rows = raw
            .lines()
            .enumerate()
            .skip_while(|(_, line)| line.trim().is_empty());
        // Header
        rows.next();

        for (index, line) in rows {
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;

            let fields = split_row(line);
            if fields.len() < 3 {
                warn!(
                    target: TARGET_RFO,
                    "Skipping taxonomy line {}: expected 3 fields, found {}",
                    line_number,
                    fields.len()
                );
                store.skipped_rows += 1;
                continue;
            }

            let (code, description, label) = (fields[0], fields[1], fields[2]);
            if code.is_empty() || description.is_empty() {
                warn!(
                    target: TARGET_RFO,
                    "Skipping taxonomy line {}: empty code or description", line_number
                );
                store.skipped_rows += 1;
                continue;
            }

            let priority = match Priority::from_label(label) {
                Some(priority) => priority,
                None => {
                    warn!(
                        target: TARGET_RFO,
                        "Unknown priority '{}' for code {} on line {}, using '{}'",
                        label,
                        code,
                        line_number,
                        FALLBACK_PRIORITY
                    );
                    store.unknown_priority_rows += 1;
                    FALLBACK_PRIORITY
                }
            };

            let entry = TaxonomyEntry::new(code, description, priority);
            // An empty canonical form would be a substring of every query.
            if entry.normalized_description().is_empty() {
                warn!(
                    target: TARGET_RFO,
                    "Skipping taxonomy line {}: description '{}' has nothing to match on",
                    line_number,
                    description
                );
                store.skipped_rows += 1;
                continue;
            }

            store.entries.push(entry);
        }

        info!(
            target: TARGET_RFO,
            "Loaded {} taxonomy entries ({} rows skipped, {} unknown priorities)",
            store.entries.len(),
            store.skipped_rows,
            store.unknown_priority_rows
        );

        store
    }

    /// The taxonomy compiled into the binary.
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_TAXONOMY)
    }

    /// Load a taxonomy file with the same three-column layout.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaxonomyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> TaxonomyStats {
        TaxonomyStats {
            entries: self.entries.len(),
            skipped_rows: self.skipped_rows,
            unknown_priority_rows: self.unknown_priority_rows,
        }
    }
}

impl<'a> IntoIterator for &'a TaxonomyStore {
    type Item = &'a TaxonomyEntry;
    type IntoIter = std::slice::Iter<'a, TaxonomyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Split a row into trimmed fields: tabs first, runs of 2+ whitespace otherwise.
/// Fields beyond the third are ignored by the caller.
fn split_row(line: &str) -> Vec<&str> {
    let tabbed: Vec<&str> = line.split('\t').map(str::trim).collect();
    if tabbed.len() >= 3 {
        return tabbed;
    }

    FIELD_GAP.split(line.trim()).map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_taxonomy() {
        let store = TaxonomyStore::embedded();
        assert_eq!(store.len(), 216);
        assert_eq!(
            store.stats(),
            TaxonomyStats {
                entries: 216,
                skipped_rows: 0,
                unknown_priority_rows: 0,
            }
        );

        let first = &store.entries()[0];
        assert_eq!(first.code(), "00001");
        assert_eq!(first.description(), "BTS, CPRI");
        assert_eq!(first.priority(), Priority::CriticalImpact);
        assert_eq!(first.normalized_description(), "bts cpri");

        let last = &store.entries()[215];
        assert_eq!(last.code(), "00216");
        assert_eq!(last.description(), "Site access issue");
    }

    #[test]
    fn test_header_and_blank_lines_skipped() {
        let raw = "\n\nCode\tRoot_Caused\tPriority\n\n00001\tBTS, CPRI\tCritical Impact\n\n";
        let store = TaxonomyStore::parse(raw);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().skipped_rows, 0);
        assert_eq!(store.entries()[0].code(), "00001");
    }

    #[test]
    fn test_whitespace_delimited_rows() {
        let raw = "Code  Root_Caused  Priority\n\
                   00300   Fiber cut   Critical Impact\n\
                   00301\tDG, Fan broken\tModerate Impact\n";
        let store = TaxonomyStore::parse(raw);
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].code(), "00300");
        assert_eq!(store.entries()[0].description(), "Fiber cut");
        assert_eq!(store.entries()[0].priority(), Priority::CriticalImpact);
        assert_eq!(store.entries()[1].description(), "DG, Fan broken");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let raw = "Code\tRoot_Caused\tPriority\n 00038 \tDG, Starting motor fault \t Minor Impact \r\n";
        let store = TaxonomyStore::parse(raw);
        let entry = &store.entries()[0];
        assert_eq!(entry.code(), "00038");
        assert_eq!(entry.description(), "DG, Starting motor fault");
        assert_eq!(entry.priority(), Priority::MinorImpact);
    }

    #[test]
    fn test_malformed_rows_skipped_and_counted() {
        let raw = "Code\tRoot_Caused\tPriority\n\
                   00001\tBTS, CPRI\tCritical Impact\n\
                   justonefield\n\
                   00002\tonly two\n\
                   00003\t\tCritical Impact\n\
                   00004\t(aside only)\tMinor Impact\n\
                   00005\tFire\tContextual Factor\n";
        let store = TaxonomyStore::parse(raw);
        let codes: Vec<&str> = store.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["00001", "00005"]);
        assert_eq!(store.stats().skipped_rows, 4);
    }

    #[test]
    fn test_unknown_priority_falls_back() {
        let raw = "Code\tRoot_Caused\tPriority\n\
                   00001\tBTS, CPRI\tcritical impact\n\
                   00002\tBTS, RRU\tSevere\n\
                   00003\tBTS, BBU\tCritical Impact\n";
        let store = TaxonomyStore::parse(raw);
        assert_eq!(store.len(), 3);
        assert_eq!(store.entries()[0].priority(), FALLBACK_PRIORITY);
        assert_eq!(store.entries()[1].priority(), FALLBACK_PRIORITY);
        assert_eq!(store.entries()[2].priority(), Priority::CriticalImpact);
        assert_eq!(store.stats().unknown_priority_rows, 2);
        assert_eq!(store.stats().skipped_rows, 0);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let raw = "Code\tRoot_Caused\tPriority\tNotes\n00001\tBTS, CPRI\tCritical Impact\tsee ticket\n";
        let store = TaxonomyStore::parse(raw);
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].priority(), Priority::CriticalImpact);
    }

    #[test]
    fn test_empty_input() {
        assert!(TaxonomyStore::parse("").is_empty());
        assert!(TaxonomyStore::parse("Code\tRoot_Caused\tPriority\n").is_empty());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Code\tRoot_Caused\tPriority").unwrap();
        writeln!(file, "90001\tGenerator, Belt\tMinor Impact").unwrap();
        file.flush().unwrap();

        let store = TaxonomyStore::from_path(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].code(), "90001");
    }

    #[test]
    fn test_from_missing_path() {
        let err = TaxonomyStore::from_path("/nonexistent/rfo_taxonomy.tsv").unwrap_err();
        assert!(err.to_string().contains("Failed to read taxonomy file"));
    }
}
