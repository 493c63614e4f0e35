//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing revision of the entity's persisted state.
    ///
    /// Starts at 1 on creation and is bumped by every successful mutation.
    /// Immutable records stay at 1 forever.
    fn version(&self) -> u64;
}
