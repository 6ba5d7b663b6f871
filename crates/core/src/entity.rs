//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Categories, parents and variants are entities: two records with the same id
/// are the same entity even when their fields differ (e.g. before and after a
/// partial update).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
