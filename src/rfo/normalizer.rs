use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Parenthesized asides such as "(duplicate entry)" or "(Indoor Unit)".
    static ref PARENTHESIZED: Regex = Regex::new(r"\s*\([^)]*\)\s*").unwrap();
}

/// Reduce free text to the canonical form used for every comparison.
///
/// Steps, in order:
/// 1. lowercase
/// 2. drop parenthesized substrings along with the whitespace around them
/// 3. drop every character that is not `a-z`, `0-9` or whitespace
/// 4. collapse whitespace runs to one space and trim
///
/// Characters dropped in step 3 are removed, not replaced, so "A/B" becomes
/// "ab". The function is total and idempotent.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let without_asides = PARENTHESIZED.replace_all(&lowered, "");

    without_asides
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
