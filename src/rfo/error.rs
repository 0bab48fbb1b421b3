use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

/// Caller mistakes. Classification outcomes (empty, unmatched) are never errors.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MatchError {
    #[error("fuzzy threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),
}

/// Reject thresholds outside `[0, 1]`, including NaN.
pub fn validate_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(MatchError::InvalidThreshold(threshold))
    }
}
