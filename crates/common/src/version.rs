//! Aggregate version for optimistic concurrency control.

use serde::{Deserialize, Serialize};

/// Monotonic version of a stored aggregate.
///
/// A freshly built aggregate is at `Version::initial()`; every successful
/// store update bumps it. Updates supply the version they read, and the
/// store rejects the write if the record has moved on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// The version of an aggregate that has never been persisted.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the version as a plain integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_and_next() {
        let v = Version::initial();
        assert_eq!(v.as_u64(), 0);
        assert_eq!(v.next().as_u64(), 1);
        assert_eq!(v.next().next(), Version::initial().next().next());
    }

    #[test]
    fn test_ordering() {
        assert!(Version::initial() < Version::initial().next());
    }
}
