//! Serialization of object graphs to JSON events.
//!
//! A [`SerializationContext`] is created per engine call and carries the
//! mutable traversal state: the recursion depth guard, the set of instances
//! currently being written (for cycle detection), and the JSON property path
//! used in diagnostics. Custom serializers receive the same context and may
//! re-enter the engine through it; re-entry is covered by the same bounded
//! depth guard.
//!
//! Dispatch order for an instance: a registered custom serializer for its
//! class (or nearest superclass) wins, otherwise the built-in property walk
//! driven by the cached class model.

use crate::config::CustomSerializer;
use crate::event::{write_number, JsonGenerator};
use crate::model::ClassModel;
use crate::obj::{Instance, Obj};
use crate::value::Number;
use crate::{Error, JsonBinding, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Per-call serialization state.
pub struct SerializationContext<'e> {
    engine: &'e JsonBinding,
    depth: usize,
    in_progress: HashSet<usize>,
    path: Vec<String>,
}

impl<'e> SerializationContext<'e> {
    pub(crate) fn new(engine: &'e JsonBinding) -> Self {
        SerializationContext {
            engine,
            depth: 0,
            in_progress: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// The JSON property path of the value currently being written.
    #[must_use]
    pub fn path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(segment);
        }
        out
    }

    /// Serializes a value, dispatching to a registered custom serializer
    /// when one applies.
    pub fn serialize(&mut self, obj: &Obj, gen: &mut dyn JsonGenerator) -> Result<()> {
        self.descend(|ctx| ctx.dispatch(obj, gen, true))
    }

    /// Serializes a value through the built-in dispatch, skipping any custom
    /// serializer at this level. Nested values still honor registered
    /// handlers, so a handler can decorate the default output of its own
    /// class without recursing into itself.
    pub fn serialize_default(&mut self, obj: &Obj, gen: &mut dyn JsonGenerator) -> Result<()> {
        self.descend(|ctx| ctx.dispatch(obj, gen, false))
    }

    fn descend<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
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

    fn dispatch(&mut self, obj: &Obj, gen: &mut dyn JsonGenerator, use_handler: bool) -> Result<()> {
        match obj {
            Obj::Null => gen.write_null(),
            Obj::Bool(b) => gen.write_bool(*b),
            Obj::Int(v) => write_number(gen, &Number::Int(*v)),
            Obj::Float(v) => write_number(gen, &Number::Float(*v)),
            Obj::BigInt(v) => write_number(gen, &Number::BigInt(v.clone())),
            Obj::Decimal(d) => write_number(gen, &Number::Decimal(d.clone())),
            Obj::Str(s) => gen.write_string(s),
            Obj::Date(d) => gen.write_string(&format_date(d, None)),
            Obj::List(items) => {
                gen.write_start_array()?;
                for (index, item) in items.iter().enumerate() {
                    self.path.push(format!("[{index}]"));
                    let result = self.serialize(item, gen);
                    self.path.pop();
                    result?;
                }
                gen.write_end_array()
            }
            Obj::Map(map) => {
                gen.write_start_object()?;
                for key in self.engine.ordered_keys(map.keys()) {
                    let Some(value) = map.get(key.as_str()) else {
                        continue;
                    };
                    gen.write_key(&key)?;
                    self.path.push(format!(".{key}"));
                    let result = self.serialize(value, gen);
                    self.path.pop();
                    result?;
                }
                gen.write_end_object()
            }
            Obj::Inst(inst) => {
                if use_handler {
                    if let Some(handler) = self.handler_for(inst) {
                        return self.delegate(&handler, obj, gen);
                    }
                }
                self.serialize_instance(inst, gen)
            }
        }
    }

    fn handler_for(&self, inst: &Instance) -> Option<Arc<dyn CustomSerializer>> {
        self.engine
            .config()
            .serializer_for(self.engine.registry(), inst.class())
    }

    fn delegate(
        &mut self,
        handler: &Arc<dyn CustomSerializer>,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
    ) -> Result<()> {
        handler.serialize(obj, gen, self).map_err(|e| match e {
            Error::Message(message) => Error::custom_handler(&self.path(), &message),
            other => other,
        })
    }

    fn serialize_instance(&mut self, inst: &Instance, gen: &mut dyn JsonGenerator) -> Result<()> {
        let identity = inst.identity();
        if !self.in_progress.insert(identity) {
            return Err(Error::Cycle { path: self.path() });
        }
        let model = self.engine.class_model(inst.class());
        let result = self.write_instance_body(inst, &model, gen);
        self.in_progress.remove(&identity);
        result
    }

    fn write_instance_body(
        &mut self,
        inst: &Instance,
        model: &ClassModel,
        gen: &mut dyn JsonGenerator,
    ) -> Result<()> {
        gen.write_start_object()?;
        for prop in &model.properties {
            let value = inst.get(&prop.field_name).unwrap_or(Obj::Null);
            if value.is_null() && !prop.nillable {
                continue;
            }
            gen.write_key(&prop.json_name)?;
            self.path.push(format!(".{}", prop.json_name));
            let result = match &value {
                // Property-level date formats apply here, not in nested
                // dispatch, because the format belongs to the field.
                Obj::Date(d) => gen.write_string(&format_date(d, prop.date_format.as_deref())),
                other => self.serialize(other, gen),
            };
            self.path.pop();
            result?;
        }
        gen.write_end_object()
    }
}

/// Formats a date with the field's format, or RFC 3339 when unspecified.
pub(crate) fn format_date(date: &DateTime<Utc>, format: Option<&str>) -> String {
    match format {
        Some(fmt) => date.format(fmt).to_string(),
        None => date.to_rfc3339(),
    }
}
