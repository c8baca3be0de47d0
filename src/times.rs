//! Call-count expectations used by verification.

use std::fmt;

/// How many times something is expected to have happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Never,
    Once,
    AtLeastOnce,
    Exactly(u32),
    AtMost(u32),
    /// Inclusive range.
    Between(u32, u32),
}

impl Times {
    /// Whether `count` satisfies the expectation.
    pub fn matches(&self, count: u32) -> bool {
        match *self {
            Times::Never => count == 0,
            Times::Once => count == 1,
            Times::AtLeastOnce => count >= 1,
            Times::Exactly(n) => count == n,
            Times::AtMost(n) => count <= n,
            Times::Between(lo, hi) => (lo..=hi).contains(&count),
        }
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Times::Never => write!(f, "never"),
            Times::Once => write!(f, "exactly once"),
            Times::AtLeastOnce => write!(f, "at least once"),
            Times::Exactly(n) => write!(f, "exactly {} times", n),
            Times::AtMost(n) => write!(f, "at most {} times", n),
            Times::Between(lo, hi) => write!(f, "between {} and {} times", lo, hi),
        }
    }
}
