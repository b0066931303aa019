//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stock rows and journal entries are entities: two values with the same id are
/// the same record even when their quantities or posting state differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
