pub mod detector;
pub mod error;
pub mod matcher;
pub mod normalizer;
pub mod sequence;
pub mod taxonomy;
pub mod types;


pub use detector::{
    ClassificationReport, ClassifiedExpression, RfoDetector, DEFAULT_FUZZY_THRESHOLD,
};
pub use error::MatchError;
pub use normalizer::normalize;
pub use taxonomy::TaxonomyStore;
pub use types::*;

// Module-level constants
pub const TARGET_RFO: &str = "rfo";
