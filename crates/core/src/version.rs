//! Optimistic concurrency expectations for entity writes.

/// What a writer believes the stored revision of an entity to be.
///
/// Stores compare this against the persisted revision and refuse the write on
/// mismatch, which turns the read-guard-write sequence of every mutation into a
/// compare-and-swap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The entity must not exist yet.
    New,
    /// Require the stored entity to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `stored` is `None` when no entity with the id exists.
    pub fn matches(self, stored: Option<u64>) -> bool {
        match (self, stored) {
            (ExpectedVersion::New, None) => true,
            (ExpectedVersion::New, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(actual)) => v == actual,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }
}
