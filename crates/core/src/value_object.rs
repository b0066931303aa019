//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values
/// (an entry number, a stock key, a counterparty snapshot). They are immutable:
/// to "change" one, build a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
