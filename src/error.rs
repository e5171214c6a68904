//! Error types for token evaluation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The aggregate parse failure: no expression was recognized at all, or
    /// the parser recorded diagnostics. Carries the trimmed input and the
    /// underlying messages; a token with any recorded error is rejected
    /// whole, none of its leading nodes are applied.
    #[error("token \"{token}\" is invalid{}", join_causes(.errors))]
    InvalidToken { token: String, errors: Vec<String> },

    /// A zone name that does not resolve to an IANA timezone.
    #[error("invalid timezone: \"{0}\"")]
    InvalidTimezone(String),
}

fn join_causes(errors: &[String]) -> String {
    if errors.is_empty() { String::new() } else { format!(": {}", errors.join("; ")) }
}
