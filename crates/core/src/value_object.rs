//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity - they are defined entirely by their
/// attribute values and are immutable: to "change" one, construct a new
/// one. A unit of measure or a supplier offer is a value object; a product
/// is not (it has an id and a lifecycle).
///
/// Requiring `Clone + PartialEq + Debug` keeps them cheap to pass around,
/// comparable in invariant checks, and printable in test failures.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
