use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::normalizer::normalize;

/// Severity attached to every taxonomy entry, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Priority {
    CriticalImpact,
    ModerateImpact,
    MinorImpact,
    ContextualFactor,
}

impl Priority {
    /// All priorities, most severe first.
    pub const ALL: [Priority; 4] = [
        Priority::CriticalImpact,
        Priority::ModerateImpact,
        Priority::MinorImpact,
        Priority::ContextualFactor,
    ];

    /// Label used in the taxonomy dataset.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::CriticalImpact => "Critical Impact",
            Priority::ModerateImpact => "Moderate Impact",
            Priority::MinorImpact => "Minor Impact",
            Priority::ContextualFactor => "Contextual Factor",
        }
    }

    /// Exact, case-sensitive lookup of a dataset label.
    pub fn from_label(label: &str) -> Option<Self> {
        Priority::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lenient parsing for user input: the dataset label or a short form, any case.
impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "critical impact" | "criticalimpact" => Ok(Priority::CriticalImpact),
            "moderate" | "moderate impact" | "moderateimpact" => Ok(Priority::ModerateImpact),
            "minor" | "minor impact" | "minorimpact" => Ok(Priority::MinorImpact),
            "contextual" | "contextual factor" | "contextualfactor" => {
                Ok(Priority::ContextualFactor)
            }
            _ => Err(format!(
                "Invalid priority: {}. Must be one of: critical, moderate, minor, contextual",
                s
            )),
        }
    }
}

/// One row of the fault taxonomy.
///
/// Fields are private so the normalized description can only be produced by
/// [`TaxonomyEntry::new`] and never drifts from the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    code: String,
    description: String,
    priority: Priority,
    normalized_description: String,
}

impl TaxonomyEntry {
    pub fn new(code: &str, description: &str, priority: Priority) -> Self {
        TaxonomyEntry {
            code: code.to_string(),
            description: description.to_string(),
            priority,
            normalized_description: normalize(description),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn normalized_description(&self) -> &str {
        &self.normalized_description
    }
}

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
    Substring,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact"),
            MatchStrategy::Fuzzy => write!(f, "fuzzy"),
            MatchStrategy::Substring => write!(f, "substring"),
        }
    }
}

/// A resolved expression, borrowing the entry from the taxonomy store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RfoMatch<'a> {
    #[serde(flatten)]
    pub entry: &'a TaxonomyEntry,

    pub strategy: MatchStrategy,

    // 1.0 for exact, the similarity ratio for fuzzy, none for substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl<'a> RfoMatch<'a> {
    pub fn code(&self) -> &'a str {
        self.entry.code()
    }

    pub fn description(&self) -> &'a str {
        self.entry.description()
    }

    pub fn priority(&self) -> Priority {
        self.entry.priority()
    }
}

/// Outcome of classifying one expression. None of these is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Detection<'a> {
    Matched(RfoMatch<'a>),
    /// Nothing left to classify after normalization.
    EmptyExpression,
    /// No strategy matched; the expression should be reviewed by a curator.
    NeedsUpgrade,
}

impl<'a> Detection<'a> {
    pub fn matched(&self) -> Option<&RfoMatch<'a>> {
        match self {
            Detection::Matched(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, Detection::Matched(_))
    }

    /// `(code, description)` of the matched entry.
    pub fn code_and_description(&self) -> Option<(&'a str, &'a str)> {
        match self {
            Detection::Matched(m) => Some((m.code(), m.description())),
            _ => None,
        }
    }
}

impl fmt::Display for Detection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::Matched(m) => write!(f, "({}, {})", m.code(), m.description()),
            Detection::EmptyExpression => write!(f, "Empty expression provided"),
            Detection::NeedsUpgrade => write!(f, "expression needs taxonomy upgrade"),
        }
    }
}

/// Load diagnostics for a taxonomy store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaxonomyStats {
    pub entries: usize,
    pub skipped_rows: usize,
    pub unknown_priority_rows: usize,
}
