//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are immutable: two values with the same
/// attributes are the same value (`Ariary(500) == Ariary(500)`).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
