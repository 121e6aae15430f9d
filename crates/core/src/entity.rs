//! Entity trait: identity + continuity across state changes.

use crate::id::CooperativeId;

/// Entity marker + minimal interface.
///
/// Every entity belongs to exactly one cooperative and is stored under a
/// stable `KIND` name alongside its identifier.
pub trait Entity {
    /// Strongly-typed entity identifier. Its `Display` form is the storage key.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Storage namespace for this entity type (e.g. `"voiture"`).
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Cooperative owning this entity.
    fn cooperative_id(&self) -> CooperativeId;
}
