//! Deserialization of JSON events into object graphs.
//!
//! A [`DeserializationContext`] is created per engine call and carries the
//! depth guard and the property path for diagnostics. Dispatch is driven by
//! the target [`TypeRef`]: scalars coerce single events, lists and maps
//! recurse element-wise, class targets walk the cached class model, and
//! [`TypeRef::Any`] falls back to the untyped map/list representation with
//! the configured key ordering.
//!
//! Numeric targets accept both bare number literals and quoted number
//! strings (the two forms the precision policy can emit); quoted forms are
//! parsed exactly, never routed through a double. Unknown JSON properties of
//! a class target are skipped without error.

use crate::adapter::{collect_value, ValueEvents};
use crate::event::{Event, EventSource};
use crate::map::ordered_insert;
use crate::number::{parse_literal, BigDecimal};
use crate::obj::{Instance, Obj};
use crate::types::{ClassId, ScalarKind, TypeRef};
use crate::value::{JsonValue, Number};
use crate::{Error, JsonBinding, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use std::str::FromStr;

/// Per-call deserialization state.
pub struct DeserializationContext<'e> {
    engine: &'e JsonBinding,
    depth: usize,
    path: Vec<String>,
}

impl<'e> DeserializationContext<'e> {
    pub(crate) fn new(engine: &'e JsonBinding) -> Self {
        DeserializationContext {
            engine,
            depth: 0,
            path: Vec::new(),
        }
    }

    /// The JSON property path of the value currently being read.
    #[must_use]
    pub fn path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(segment);
        }
        out
    }

    /// Deserializes a materialized subtree against a target type,
    /// dispatching to a registered custom deserializer when one applies.
    pub fn deserialize(&mut self, value: &JsonValue, ty: &TypeRef) -> Result<Obj> {
        let mut events = ValueEvents::new(value);
        self.run(&mut events, ty)
    }

    /// Deserializes a subtree through the built-in dispatch, skipping any
    /// custom deserializer at this level. Nested values still honor
    /// registered handlers.
    pub fn deserialize_default(&mut self, value: &JsonValue, ty: &TypeRef) -> Result<Obj> {
        let mut events = ValueEvents::new(value);
        let event = next(&mut events)?;
        self.value(event, &mut events, ty, false, None)
    }

    pub(crate) fn run(&mut self, source: &mut dyn EventSource, ty: &TypeRef) -> Result<Obj> {
        let event = next(source)?;
        self.value(event, source, ty, true, None)
    }

    fn descend<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let limit = self.engine.config().recursion_limit;
        if self.depth >= limit {
            return Err(Error::RecursionLimit {
                limit,
                path: self.path(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn mismatch(&self, ty: &TypeRef, event: &Event) -> Error {
        Error::structure(
            &self.path(),
            &self.engine.registry().describe(ty),
            event.describe(),
        )
    }

    fn value(
        &mut self,
        event: Event,
        source: &mut dyn EventSource,
        ty: &TypeRef,
        use_handler: bool,
        date_format: Option<&str>,
    ) -> Result<Obj> {
        self.descend(|ctx| {
            // Null binds to every target.
            if event == Event::Null {
                return Ok(Obj::Null);
            }
            match ty {
                TypeRef::Any => ctx.untyped(event, source),
                TypeRef::Scalar(kind) => ctx.scalar(event, *kind, date_format, ty),
                TypeRef::List(element) => {
                    if event != Event::StartArray {
                        return Err(ctx.mismatch(ty, &event));
                    }
                    ctx.list(source, element)
                }
                TypeRef::Map(element) => {
                    if event != Event::StartObject {
                        return Err(ctx.mismatch(ty, &event));
                    }
                    ctx.map(source, element)
                }
                TypeRef::Class(class) => ctx.class(event, source, ty, *class, use_handler),
                TypeRef::Parameterized { class, .. } => {
                    ctx.class(event, source, ty, *class, use_handler)
                }
                TypeRef::Variable { declared_by, index } => {
                    let registry = ctx.engine.registry();
                    Err(Error::type_resolution(
                        &registry.variable_name(*declared_by, *index),
                        registry.class_name(*declared_by),
                    ))
                }
            }
        })
    }

    fn untyped(&mut self, event: Event, source: &mut dyn EventSource) -> Result<Obj> {
        match event {
            Event::Bool(b) => Ok(Obj::Bool(b)),
            Event::String(s) => Ok(Obj::Str(s)),
            Event::Number(Number::Int(v)) => Ok(Obj::Int(v)),
            Event::Number(Number::Float(v)) => Ok(Obj::Float(v)),
            Event::Number(Number::BigInt(v)) => Ok(Obj::BigInt(v)),
            Event::Number(Number::Decimal(d)) => Ok(Obj::Decimal(d)),
            Event::StartArray => self.list(source, &TypeRef::Any),
            Event::StartObject => self.map(source, &TypeRef::Any),
            other => Err(self.mismatch(&TypeRef::Any, &other)),
        }
    }

    fn list(&mut self, source: &mut dyn EventSource, element: &TypeRef) -> Result<Obj> {
        let mut items = Vec::new();
        loop {
            let event = next(source)?;
            if event == Event::EndArray {
                return Ok(Obj::List(items));
            }
            self.path.push(format!("[{}]", items.len()));
            let item = self.value(event, source, element, true, None);
            self.path.pop();
            items.push(item?);
        }
    }

    /// Reads an object as a string-keyed map, placing keys per the
    /// configured ordering strategy so a later serialization reproduces
    /// that order.
    fn map(&mut self, source: &mut dyn EventSource, element: &TypeRef) -> Result<Obj> {
        let order = self.engine.config().order_strategy;
        let mut entries: IndexMap<String, Obj> = IndexMap::new();
        loop {
            match next(source)? {
                Event::EndObject => return Ok(Obj::Map(entries)),
                Event::Key(key) => {
                    let event = next(source)?;
                    self.path.push(format!(".{key}"));
                    let item = self.value(event, source, element, true, None);
                    self.path.pop();
                    ordered_insert(&mut entries, order, key, item?);
                }
                other => return Err(self.mismatch(&TypeRef::map(element.clone()), &other)),
            }
        }
    }

    fn class(
        &mut self,
        event: Event,
        source: &mut dyn EventSource,
        ty: &TypeRef,
        class: ClassId,
        use_handler: bool,
    ) -> Result<Obj> {
        if use_handler {
            let handler = self
                .engine
                .config()
                .deserializer_for(self.engine.registry(), class);
            if let Some(handler) = handler {
                let subtree = collect_value(event, source)?;
                return handler.deserialize(&subtree, self).map_err(|e| match e {
                    Error::Message(message) => Error::custom_handler(&self.path(), &message),
                    other => other,
                });
            }
        }
        if event != Event::StartObject {
            return Err(self.mismatch(ty, &event));
        }
        self.instance(source, ty, class)
    }

    fn instance(
        &mut self,
        source: &mut dyn EventSource,
        runtime_ty: &TypeRef,
        class: ClassId,
    ) -> Result<Obj> {
        let model = self.engine.class_model(class);
        let inst = Instance::new(class);
        loop {
            match next(source)? {
                Event::EndObject => return Ok(Obj::Inst(inst)),
                Event::Key(key) => match model.property_by_json_name(&key) {
                    Some(prop) => {
                        // Generic field types resolve against the runtime
                        // type before descending.
                        let resolved = self
                            .engine
                            .registry()
                            .resolve_type(&prop.ty, runtime_ty)?;
                        let event = next(source)?;
                        self.path.push(format!(".{key}"));
                        let item = self.value(
                            event,
                            source,
                            &resolved,
                            true,
                            prop.date_format.as_deref(),
                        );
                        self.path.pop();
                        inst.set(&prop.field_name, item?);
                    }
                    None => {
                        let event = next(source)?;
                        skip_value(event, source)?;
                    }
                },
                other => return Err(self.mismatch(runtime_ty, &other)),
            }
        }
    }

    fn scalar(
        &mut self,
        event: Event,
        kind: ScalarKind,
        date_format: Option<&str>,
        ty: &TypeRef,
    ) -> Result<Obj> {
        let mismatch = |ctx: &Self, event: &Event| ctx.mismatch(ty, event);
        match kind {
            ScalarKind::Bool => match event {
                Event::Bool(b) => Ok(Obj::Bool(b)),
                other => Err(mismatch(self, &other)),
            },
            ScalarKind::String => match event {
                Event::String(s) => Ok(Obj::Str(s)),
                other => Err(mismatch(self, &other)),
            },
            ScalarKind::Date => match event {
                Event::String(s) => self.parse_date(&s, date_format),
                other => Err(mismatch(self, &other)),
            },
            ScalarKind::I64 => {
                let number = self.numeric(event, ty)?;
                number
                    .as_i64()
                    .map(Obj::Int)
                    .ok_or_else(|| Error::structure(&self.path(), "integer", "number out of range"))
            }
            ScalarKind::F64 => {
                let number = self.numeric(event, ty)?;
                Ok(Obj::Float(number.as_f64()))
            }
            ScalarKind::BigInt => {
                let decimal = decimal_of(&self.numeric(event, ty)?)?;
                decimal.to_big_int().map(Obj::BigInt).ok_or_else(|| {
                    Error::structure(&self.path(), "big integer", "fractional number")
                })
            }
            ScalarKind::Decimal => Ok(Obj::Decimal(decimal_of(&self.numeric(event, ty)?)?)),
        }
    }

    /// Extracts the exact numeric value of a bare or quoted number event.
    /// A string that does not hold a decimal numeral is a structure
    /// mismatch against the numeric target, not a number error.
    fn numeric(&self, event: Event, ty: &TypeRef) -> Result<Number> {
        match event {
            Event::Number(n) => Ok(n),
            Event::String(s) => match parse_literal(&s) {
                Ok(n) => Ok(n),
                Err(_) => Err(self.mismatch(ty, &Event::String(s))),
            },
            other => Err(self.mismatch(ty, &other)),
        }
    }

    fn parse_date(&self, text: &str, format: Option<&str>) -> Result<Obj> {
        let parsed = match format {
            Some(fmt) => NaiveDateTime::parse_from_str(text, fmt).map(|n| n.and_utc()),
            None => DateTime::parse_from_rfc3339(text).map(|d| d.with_timezone(&Utc)),
        };
        parsed
            .map(Obj::Date)
            .map_err(|e| Error::custom(format!("invalid date '{text}' at {}: {e}", self.path())))
    }
}

fn next(source: &mut dyn EventSource) -> Result<Event> {
    source
        .next_event()
        .ok_or_else(|| Error::custom("unexpected end of input"))
}

/// Converts any exact number to its decimal form.
fn decimal_of(number: &Number) -> Result<BigDecimal> {
    match number {
        Number::Int(v) => Ok(BigDecimal::from(*v)),
        Number::BigInt(v) => Ok(BigDecimal::from(v.clone())),
        Number::Decimal(d) => Ok(d.clone()),
        Number::Float(f) => {
            if f.is_finite() {
                BigDecimal::from_str(&f.to_string())
            } else {
                Err(Error::InvalidNumber(f.to_string()))
            }
        }
    }
}

/// Consumes a balanced value whose first event has already been read.
fn skip_value(first: Event, source: &mut dyn EventSource) -> Result<()> {
    let mut depth = match first {
        Event::StartObject | Event::StartArray => 1usize,
        _ => return Ok(()),
    };
    while depth > 0 {
        match next(source)? {
            Event::StartObject | Event::StartArray => depth += 1,
            Event::EndObject | Event::EndArray => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_decimal_of_is_exact() {
        let big: BigInt = "9223372036854775808".parse().unwrap();
        assert_eq!(
            decimal_of(&Number::BigInt(big.clone())).unwrap().to_big_int(),
            Some(big)
        );
        assert!(decimal_of(&Number::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_skip_value_consumes_balanced_subtree() {
        use crate::jval;
        let tree = jval!([{"a": [1, 2]}, "after"]);
        let mut events = ValueEvents::new(&tree);
        assert_eq!(events.next_event(), Some(Event::StartArray));
        let first = events.next_event().unwrap();
        skip_value(first, &mut events).unwrap();
        assert_eq!(events.next_event(), Some(Event::String("after".into())));
    }
}
