//! Bridging between event streams and materialized [`JsonValue`] trees.
//!
//! The adapter has two roles. [`ValueBuilder`] is a [`JsonGenerator`] that
//! assembles a tree instead of writing text, so the marshaller can produce
//! in-memory output through the same code path it uses for text.
//! [`ValueEvents`] replays an existing tree as an event stream in the order
//! the tree holds its entries, never re-sorting, so a tree built under one
//! ordering discipline serializes in exactly that order.
//!
//! [`replay`] pipes a source into a generator, applying the numeric
//! precision policy; [`collect_value`] materializes one balanced value from
//! a stream exactly, with no policy applied, for handing to custom
//! deserializers.

use crate::event::{Event, EventSource, JsonGenerator};
use crate::map::JsonMap;
use crate::number::BigDecimal;
use crate::value::{JsonValue, Number};
use crate::{Error, Result};
use num_bigint::BigInt;

enum BuildFrame {
    Array(Vec<JsonValue>),
    Object {
        map: JsonMap,
        pending_key: Option<String>,
    },
}

/// A [`JsonGenerator`] that builds a [`JsonValue`] tree.
#[derive(Default)]
pub struct ValueBuilder {
    frames: Vec<BuildFrame>,
    root: Option<JsonValue>,
}

impl ValueBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree. Fails if no value was written or a container is
    /// still open.
    pub fn into_value(self) -> Result<JsonValue> {
        if !self.frames.is_empty() {
            return Err(Error::custom("unclosed container in generated value"));
        }
        self.root
            .ok_or_else(|| Error::custom("no value was generated"))
    }

    fn push(&mut self, value: JsonValue) -> Result<()> {
        match self.frames.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(Error::custom("more than one top-level value"));
                }
                self.root = Some(value);
                Ok(())
            }
            Some(BuildFrame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(BuildFrame::Object { map, pending_key }) => match pending_key.take() {
                Some(key) => {
                    map.insert(key, value);
                    Ok(())
                }
                None => Err(Error::custom("object value written without a key")),
            },
        }
    }

    /// Applies one event to the builder, preserving numbers exactly.
    pub(crate) fn push_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::StartObject => self.write_start_object(),
            Event::EndObject => self.write_end_object(),
            Event::StartArray => self.write_start_array(),
            Event::EndArray => self.write_end_array(),
            Event::Key(key) => self.write_key(&key),
            Event::Null => self.write_null(),
            Event::Bool(b) => self.write_bool(b),
            Event::String(s) => self.push(JsonValue::String(s)),
            Event::Number(n) => self.push(JsonValue::Number(n)),
        }
    }
}

impl JsonGenerator for ValueBuilder {
    fn write_start_object(&mut self) -> Result<()> {
        self.frames.push(BuildFrame::Object {
            map: JsonMap::new(),
            pending_key: None,
        });
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(BuildFrame::Object { map, pending_key }) => {
                if pending_key.is_some() {
                    return Err(Error::custom("object closed with a dangling key"));
                }
                self.push(JsonValue::Object(map))
            }
            _ => Err(Error::custom("end of object without matching start")),
        }
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.frames.push(BuildFrame::Array(Vec::new()));
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(BuildFrame::Array(items)) => self.push(JsonValue::Array(items)),
            _ => Err(Error::custom("end of array without matching start")),
        }
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        match self.frames.last_mut() {
            Some(BuildFrame::Object { pending_key, .. }) => {
                if pending_key.replace(key.to_string()).is_some() {
                    return Err(Error::custom("key written twice without a value"));
                }
                Ok(())
            }
            _ => Err(Error::custom("key written outside an object")),
        }
    }

    fn write_null(&mut self) -> Result<()> {
        self.push(JsonValue::Null)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.push(JsonValue::Bool(value))
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.push(JsonValue::String(value.to_string()))
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.push(JsonValue::Number(Number::Int(value)))
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.push(JsonValue::Number(Number::Float(value)))
    }

    fn write_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.push(JsonValue::Number(Number::BigInt(value.clone())))
    }

    fn write_decimal(&mut self, value: &BigDecimal) -> Result<()> {
        self.push(JsonValue::Number(Number::Decimal(value.clone())))
    }
}

enum ReplayFrame<'v> {
    Value(&'v JsonValue),
    Array(std::slice::Iter<'v, JsonValue>),
    Object(indexmap::map::Iter<'v, String, JsonValue>),
}

/// Replays a [`JsonValue`] tree as an event stream, in tree order.
pub struct ValueEvents<'v> {
    stack: Vec<ReplayFrame<'v>>,
}

impl<'v> ValueEvents<'v> {
    #[must_use]
    pub fn new(value: &'v JsonValue) -> Self {
        ValueEvents {
            stack: vec![ReplayFrame::Value(value)],
        }
    }
}

impl EventSource for ValueEvents<'_> {
    fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.stack.pop()? {
                ReplayFrame::Value(value) => {
                    return Some(match value {
                        JsonValue::Null => Event::Null,
                        JsonValue::Bool(b) => Event::Bool(*b),
                        JsonValue::Number(n) => Event::Number(n.clone()),
                        JsonValue::String(s) => Event::String(s.clone()),
                        JsonValue::Array(items) => {
                            self.stack.push(ReplayFrame::Array(items.iter()));
                            Event::StartArray
                        }
                        JsonValue::Object(map) => {
                            self.stack.push(ReplayFrame::Object(map.iter()));
                            Event::StartObject
                        }
                    });
                }
                ReplayFrame::Array(mut items) => match items.next() {
                    Some(value) => {
                        self.stack.push(ReplayFrame::Array(items));
                        self.stack.push(ReplayFrame::Value(value));
                    }
                    None => return Some(Event::EndArray),
                },
                ReplayFrame::Object(mut entries) => match entries.next() {
                    Some((key, value)) => {
                        self.stack.push(ReplayFrame::Object(entries));
                        self.stack.push(ReplayFrame::Value(value));
                        return Some(Event::Key(key.clone()));
                    }
                    None => return Some(Event::EndObject),
                },
            }
        }
    }
}

/// Pipes every remaining event of `source` into `gen`, routing numbers
/// through the precision policy.
pub fn replay(source: &mut dyn EventSource, gen: &mut dyn JsonGenerator) -> Result<()> {
    while let Some(event) = source.next_event() {
        match event {
            Event::StartObject => gen.write_start_object()?,
            Event::EndObject => gen.write_end_object()?,
            Event::StartArray => gen.write_start_array()?,
            Event::EndArray => gen.write_end_array()?,
            Event::Key(key) => gen.write_key(&key)?,
            Event::Null => gen.write_null()?,
            Event::Bool(b) => gen.write_bool(b)?,
            Event::String(s) => gen.write_string(&s)?,
            Event::Number(n) => crate::event::write_number(gen, &n)?,
        }
    }
    Ok(())
}

/// Materializes one balanced value from the stream, starting from an already
/// consumed first event. Numbers are kept exactly as parsed.
pub(crate) fn collect_value(first: Event, source: &mut dyn EventSource) -> Result<JsonValue> {
    let mut depth = match first {
        Event::StartObject | Event::StartArray => 1usize,
        _ => 0,
    };
    let mut builder = ValueBuilder::new();
    builder.push_event(first)?;
    while depth > 0 {
        let event = source
            .next_event()
            .ok_or_else(|| Error::custom("unexpected end of input"))?;
        match event {
            Event::StartObject | Event::StartArray => depth += 1,
            Event::EndObject | Event::EndArray => depth -= 1,
            _ => {}
        }
        builder.push_event(event)?;
    }
    builder.into_value()
}
