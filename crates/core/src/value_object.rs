//! Value object trait: equality by value, not identity.
//!
//! Feature vectors, ranges and similar inputs have no identity. Two vectors
//! with the same eight readings describe the same field conditions.

/// Marker trait for value objects.
///
/// Value objects are **immutable** once built and **compared by value**. To
/// "modify" one, construct a new value.
///
/// ```ignore
/// let a = FeatureVector::from_array([6.5, 3.0, 25.0, 20.0, 150.0, 22.0, 800.0, 65.0]);
/// let b = a;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
