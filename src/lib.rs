pub mod environment;
pub mod logging;
pub mod rfo;

pub use rfo::{Detection, Priority, RfoDetector, TaxonomyEntry, TaxonomyStore};

pub const TARGET_CLI: &str = "rfo_cli";
