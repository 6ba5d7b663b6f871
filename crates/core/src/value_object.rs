//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**: they are defined entirely by their
//! attribute values. In the catalog, `Price`, `Stock` and `Sku` are value
//! objects; each one is validated on construction, so holding one means the
//! value already passed the field rules.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two prices of `59.99` are the same price)
/// - **Entity**: Has identity (two variants with the same id are the same variant)
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: value objects are compared by their attribute values
/// - **Debug**: value objects should be debuggable (logging, testing)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
