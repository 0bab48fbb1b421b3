use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

use crate::rfo::detector::DEFAULT_FUZZY_THRESHOLD;
use crate::rfo::error::validate_threshold;

pub const TAXONOMY_PATH_VAR: &str = "RFO_TAXONOMY_PATH";
pub const FUZZY_THRESHOLD_VAR: &str = "RFO_FUZZY_THRESHOLD";
pub const LOG_DIR_VAR: &str = "RFO_LOG_DIR";

/// Retrieves an environment variable, treating unset and blank values alike.
///
/// # Arguments
/// - `var`: The name of the environment variable.
///
/// # Returns
/// - `Option<String>` with surrounding whitespace removed.
pub fn get_env_var(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Retrieves an environment variable as a path.
pub fn get_env_var_as_path(var: &str) -> Option<PathBuf> {
    get_env_var(var).map(PathBuf::from)
}

/// Taxonomy file to load instead of the embedded dataset, if configured.
pub fn taxonomy_path() -> Option<PathBuf> {
    get_env_var_as_path(TAXONOMY_PATH_VAR)
}

/// Directory for the rolling log file, if configured.
pub fn log_dir() -> Option<PathBuf> {
    get_env_var_as_path(LOG_DIR_VAR)
}

/// Default fuzzy threshold, from the environment or the built-in default.
///
/// Values that do not parse or fall outside `[0, 1]` are errors, not clamped.
pub fn fuzzy_threshold() -> Result<f64> {
    match get_env_var(FUZZY_THRESHOLD_VAR) {
        Some(raw) => parse_threshold(&raw)
            .with_context(|| format!("Invalid {} value", FUZZY_THRESHOLD_VAR)),
        None => Ok(DEFAULT_FUZZY_THRESHOLD),
    }
}

fn parse_threshold(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|_| anyhow!("'{}' is not a number", raw))?;
    Ok(validate_threshold(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0.9").unwrap(), 0.9);
        assert_eq!(parse_threshold("1").unwrap(), 1.0);
        assert!(parse_threshold("high").is_err());
        assert!(parse_threshold("1.2").is_err());
        assert!(parse_threshold("NaN").is_err());
    }

    #[test]
    fn test_unset_variable_is_none() {
        assert_eq!(get_env_var("RFO_TEST_VARIABLE_THAT_IS_NEVER_SET"), None);
    }
}
