//! Dynamic JSON tree representation.
//!
//! [`JsonValue`] represents any materialized JSON value. It is the form the
//! structure adapter builds and replays, the input/output of the untyped
//! binding paths, and the subtree handed to custom deserializers.
//!
//! Numbers preserve their exact value end to end: integral literals become
//! [`Number::Int`] or [`Number::BigInt`], fractional literals become
//! [`Number::Decimal`] (arbitrary precision). Whether a number is emitted as
//! a bare literal or a quoted string is decided by the precision policy in
//! [`crate::number`] at emission time, never stored in the tree.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{jval, JsonValue};
//!
//! let doc = jval!({
//!     "name": "Alice",
//!     "age": 30,
//!     "tags": ["admin", "ops"]
//! });
//!
//! assert!(doc.is_object());
//! assert_eq!(doc.as_object().unwrap().get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::number::BigDecimal;
use crate::{JsonMap, Result};
use num_bigint::BigInt;
use std::fmt;

/// A numeric JSON value.
///
/// `Int` and `Float` cover the common machine representations; `BigInt` and
/// `Decimal` carry values that may exceed double precision and therefore may
/// be emitted quoted by the precision policy.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    Decimal(BigDecimal),
}

impl Number {
    /// Returns `true` if this number can be emitted as a bare JSON literal
    /// without losing precision in a double-based consumer.
    #[must_use]
    pub fn is_ieee754(&self) -> bool {
        match self {
            Number::Int(v) => crate::number::is_safe_i64(*v),
            Number::Float(v) => v.is_finite(),
            Number::BigInt(v) => crate::number::is_safe_big_int(v),
            Number::Decimal(d) => d.is_ieee754(),
        }
    }

    /// Converts to an `i64` if the value is integral and in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(*v),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Number::BigInt(v) => i64::try_from(v).ok(),
            Number::Decimal(d) => d.to_i64(),
        }
    }

    /// Converts to an `f64`, possibly losing precision.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(f) => *f,
            Number::BigInt(v) => v.to_string().parse().unwrap_or(f64::NAN),
            Number::Decimal(d) => d.to_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
            Number::BigInt(v) => write!(f, "{v}"),
            Number::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// A dynamically-typed representation of any JSON value.
///
/// Used when the structure is not known at compile time: the untyped binding
/// fallback, custom handler subtrees, and pre-built input trees.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonValue>),
    Object(JsonMap),
}

impl JsonValue {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    /// Returns `true` if the value is a boolean.
    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, JsonValue::Bool(_))
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, JsonValue::Number(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, JsonValue::String(_))
    }

    /// Returns `true` if the value is an array.
    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, JsonValue::Array(_))
    }

    /// Returns `true` if the value is an object.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, JsonValue::Object(_))
    }

    /// If the value is a boolean, returns it.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an integral number in `i64` range, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// If the value is a number, returns it as an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// If the value is an array, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        match self {
            JsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// If the value is an object, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&JsonMap> {
        match self {
            JsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Renders the tree as compact JSON text, applying the precision policy
    /// to numbers.
    ///
    /// # Errors
    ///
    /// Returns an error for values with no JSON representation, e.g. a
    /// non-finite float.
    pub fn to_text(&self) -> Result<String> {
        let mut generator = crate::text::TextGenerator::new(Vec::new(), false, 0);
        let mut events = crate::adapter::ValueEvents::new(self);
        crate::adapter::replay(&mut events, &mut generator)?;
        String::from_utf8(generator.into_inner()).map_err(crate::Error::custom)
    }
}

/// Serializes into the serde data model, for handing trees to serde-based
/// sinks. Numbers follow the precision policy: values a double-based
/// consumer would corrupt are serialized as strings.
impl serde::Serialize for JsonValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};
        match self {
            JsonValue::Null => serializer.serialize_unit(),
            JsonValue::Bool(b) => serializer.serialize_bool(*b),
            JsonValue::String(s) => serializer.serialize_str(s),
            JsonValue::Number(Number::Int(v)) => {
                if crate::number::is_safe_i64(*v) {
                    serializer.serialize_i64(*v)
                } else {
                    serializer.serialize_str(&v.to_string())
                }
            }
            JsonValue::Number(Number::Float(v)) => serializer.serialize_f64(*v),
            JsonValue::Number(Number::BigInt(v)) => {
                if crate::number::is_safe_big_int(v) {
                    match i64::try_from(v) {
                        Ok(small) => serializer.serialize_i64(small),
                        Err(_) => serializer.serialize_str(&v.to_string()),
                    }
                } else {
                    serializer.serialize_str(&v.to_string())
                }
            }
            JsonValue::Number(Number::Decimal(d)) => {
                if d.is_ieee754() {
                    serializer.serialize_f64(d.to_f64())
                } else {
                    serializer.serialize_str(&d.to_string())
                }
            }
            JsonValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            JsonValue::Object(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        JsonValue::Bool(value)
    }
}

impl From<i32> for JsonValue {
    fn from(value: i32) -> Self {
        JsonValue::Number(Number::Int(value as i64))
    }
}

impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        JsonValue::Number(Number::Int(value))
    }
}

impl From<u32> for JsonValue {
    fn from(value: u32) -> Self {
        JsonValue::Number(Number::Int(value as i64))
    }
}

impl From<u64> for JsonValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => JsonValue::Number(Number::Int(v)),
            Err(_) => JsonValue::Number(Number::BigInt(BigInt::from(value))),
        }
    }
}

impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        JsonValue::Number(Number::Float(value))
    }
}

impl From<BigInt> for JsonValue {
    fn from(value: BigInt) -> Self {
        JsonValue::Number(Number::BigInt(value))
    }
}

impl From<BigDecimal> for JsonValue {
    fn from(value: BigDecimal) -> Self {
        JsonValue::Number(Number::Decimal(value))
    }
}

impl From<Number> for JsonValue {
    fn from(value: Number) -> Self {
        JsonValue::Number(value)
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        JsonValue::String(value.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        JsonValue::String(value)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(value: Vec<JsonValue>) -> Self {
        JsonValue::Array(value)
    }
}

impl From<JsonMap> for JsonValue {
    fn from(value: JsonMap) -> Self {
        JsonValue::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_primitives() {
        assert_eq!(JsonValue::from(true), JsonValue::Bool(true));
        assert_eq!(JsonValue::from(42i64), JsonValue::Number(Number::Int(42)));
        assert_eq!(
            JsonValue::from(3.5f64),
            JsonValue::Number(Number::Float(3.5))
        );
        assert_eq!(JsonValue::from("hi"), JsonValue::String("hi".to_string()));
        assert_eq!(
            JsonValue::from(u64::MAX),
            JsonValue::Number(Number::BigInt(BigInt::from(u64::MAX)))
        );
    }

    #[test]
    fn test_accessors() {
        let v = JsonValue::from(42);
        assert!(v.is_number());
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_str(), None);

        let v = JsonValue::from("text");
        assert_eq!(v.as_str(), Some("text"));
        assert!(v.as_bool().is_none());
    }

    #[test]
    fn test_number_as_i64() {
        assert_eq!(Number::Int(42).as_i64(), Some(42));
        assert_eq!(Number::Float(42.0).as_i64(), Some(42));
        assert_eq!(Number::Float(42.5).as_i64(), None);
        assert_eq!(Number::BigInt(BigInt::from(7)).as_i64(), Some(7));
    }

    #[test]
    fn test_number_policy() {
        assert!(Number::Int(9007199254740991).is_ieee754());
        assert!(!Number::Int(9007199254740992).is_ieee754());
        assert!(Number::Float(1e300).is_ieee754());
        assert!(!Number::Float(f64::INFINITY).is_ieee754());
    }

    #[test]
    fn test_serde_serialize() {
        use crate::jval;
        let tree = jval!({"a": [1, true], "big": (Number::Int(9007199254740992))});
        let out = serde_json::to_string(&tree).unwrap();
        assert_eq!(out, r#"{"a":[1,true],"big":"9007199254740992"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(JsonValue::Null.to_string(), "null");
        assert_eq!(JsonValue::from(42).to_string(), "42");
        assert_eq!(JsonValue::from("a\"b").to_string(), "\"a\\\"b\"");
    }
}
