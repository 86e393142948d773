//! Fatal runtime conditions.

use thiserror::Error;

/// Conditions that abort a match outright.
///
/// An ordinary mismatch is not an error; it comes back as a
/// [`MatchResult`](crate::MatchResult) with `matched() == false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The requested start rule is not part of the program.
    #[error("unknown start rule `{0}`")]
    UnknownRule(String),
    /// Rule calls nested beyond the configured depth limit.
    #[error("rule call depth exceeded the limit of {0}")]
    DepthExceeded(u32),
    /// The instruction budget ran out before the match finished.
    #[error("execution exceeded the step budget of {0}")]
    FuelExhausted(u64),
}
