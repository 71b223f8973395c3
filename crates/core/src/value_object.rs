//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**; two instances with the same attributes are
/// the same value. `Amount` and `Currency` are the ledger's value objects: an
/// amount of 100 USD is interchangeable with any other amount of 100 USD.
///
/// Value objects are immutable. To "change" one, build a new value:
///
/// ```
/// use folio_core::{Amount, Currency};
///
/// let usd = Currency::new("USD").unwrap();
/// let a = Amount::new(100, usd.clone());
/// let b = a.with_value(250);
/// assert_eq!(a.value(), 100);
/// assert_eq!(b, Amount::new(250, usd));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
