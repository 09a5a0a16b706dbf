//! Streaming events and the generator seam.
//!
//! Serialization is expressed against the [`JsonGenerator`] trait so the same
//! marshalling code can drive a text writer or build an in-memory
//! [`JsonValue`](crate::JsonValue) tree, and so custom serializers receive a
//! restricted write capability rather than access to the output buffer.
//!
//! [`write_number`] is the single place the IEEE-754 precision policy turns a
//! number into generator calls; every emission path for numbers funnels
//! through it so a value is never policy-checked twice.

use crate::number::BigDecimal;
use crate::value::Number;
use crate::{Error, Result};
use num_bigint::BigInt;

/// One parse or replay event.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Key(String),
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Event {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Event::StartObject => "object",
            Event::EndObject => "end of object",
            Event::StartArray => "array",
            Event::EndArray => "end of array",
            Event::Key(_) => "key",
            Event::Null => "null",
            Event::Bool(_) => "boolean",
            Event::Number(_) => "number",
            Event::String(_) => "string",
        }
    }
}

/// A pull source of JSON events, either from parsed input or from replaying a
/// materialized tree.
pub trait EventSource {
    /// The next event, or `None` when the source is exhausted.
    fn next_event(&mut self) -> Option<Event>;
}

/// A sink for structured JSON output.
///
/// Numbers carry no formatting decision of their own; callers apply the
/// precision policy through [`write_number`] and the generator only receives
/// representable values.
pub trait JsonGenerator {
    fn write_start_object(&mut self) -> Result<()>;
    fn write_end_object(&mut self) -> Result<()>;
    fn write_start_array(&mut self) -> Result<()>;
    fn write_end_array(&mut self) -> Result<()>;
    fn write_key(&mut self, key: &str) -> Result<()>;
    fn write_null(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
    fn write_big_int(&mut self, value: &BigInt) -> Result<()>;
    fn write_decimal(&mut self, value: &BigDecimal) -> Result<()>;
}

/// Emits a number through the precision policy: bare when the value survives
/// an IEEE-754 double round trip, quoted otherwise.
///
/// # Errors
///
/// Non-finite floats have no JSON representation and fail with
/// [`Error::Unsupported`].
pub fn write_number(gen: &mut dyn JsonGenerator, number: &Number) -> Result<()> {
    match number {
        Number::Int(v) => {
            if crate::number::is_safe_i64(*v) {
                gen.write_i64(*v)
            } else {
                gen.write_string(&v.to_string())
            }
        }
        Number::Float(v) => {
            if v.is_finite() {
                gen.write_f64(*v)
            } else {
                Err(Error::unsupported("non-finite double"))
            }
        }
        Number::BigInt(v) => {
            if crate::number::is_safe_big_int(v) {
                gen.write_big_int(v)
            } else {
                gen.write_string(&v.to_string())
            }
        }
        Number::Decimal(d) => {
            if d.is_ieee754() {
                gen.write_decimal(d)
            } else {
                gen.write_string(&d.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ValueBuilder;
    use crate::value::JsonValue;

    fn emit(n: Number) -> JsonValue {
        let mut builder = ValueBuilder::new();
        write_number(&mut builder, &n).unwrap();
        builder.into_value().unwrap()
    }

    #[test]
    fn test_safe_values_stay_bare() {
        assert_eq!(emit(Number::Int(9007199254740991)), JsonValue::from(9007199254740991i64));
        assert_eq!(emit(Number::Float(0.5)), JsonValue::from(0.5));
    }

    #[test]
    fn test_unsafe_values_are_quoted() {
        assert_eq!(
            emit(Number::Int(9007199254740992)),
            JsonValue::from("9007199254740992")
        );
        assert_eq!(
            emit(Number::Decimal("0.10000000000000001".parse().unwrap())),
            JsonValue::from("0.10000000000000001")
        );
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let mut builder = ValueBuilder::new();
        let err = write_number(&mut builder, &Number::Float(f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
