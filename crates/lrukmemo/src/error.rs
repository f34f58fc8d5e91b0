//! Error types for lrukmemo

use std::fmt;

/// Result type alias for lrukmemo construction and configuration
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring a memo cache.
///
/// Failures of the memoized computation itself are never wrapped here; they
/// reach the caller of [`crate::LrukMemo::invoke`] as the computation's own
/// error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Promotion threshold below 1
    InvalidThreshold(usize),

    /// Cache capacity below 1
    InvalidCapacity(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidThreshold(k) => write!(
                f,
                "Invalid promotion threshold: {} (must be at least 1, or keys would never be cached)",
                k
            ),
            Error::InvalidCapacity(cap) => write!(
                f,
                "Invalid cache capacity: {} (must be at least 1, or the cache would stay empty)",
                cap
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidThreshold(0);
        assert!(err.to_string().contains("promotion threshold: 0"));

        let err = Error::InvalidCapacity(0);
        assert!(err.to_string().contains("cache capacity: 0"));
    }
}
