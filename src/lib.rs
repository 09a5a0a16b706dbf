//! # jsonbind
//!
//! A binding engine between dynamic object graphs and JSON documents.
//!
//! Applications describe their classes once in a [`TypeRegistry`] (fields,
//! generics, inheritance) and then move values between [`Obj`] graphs and
//! JSON text or [`JsonValue`] trees through a shared [`JsonBinding`] engine.
//!
//! ## Features
//!
//! - **Generic-aware binding**: type variables of generic classes resolve
//!   against the runtime type by climbing the declared inheritance chain,
//!   including variables propagated through wrapper generics
//! - **Exact numbers**: integers, big integers, and arbitrary-precision
//!   decimals survive round trips without passing through a double; values
//!   that a double-based consumer would corrupt are emitted quoted
//! - **Customization**: property ordering and naming strategies, per-field
//!   overrides, null policies, date formats, and user-registered
//!   serializers/deserializers per class
//! - **Safe traversal**: cyclic graphs and runaway handler recursion are
//!   detected and reported with the JSON property path
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonbind::{FieldDef, Instance, JsonBinding, Obj, TypeRef, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let person = registry.declare("Person");
//! registry.add_field(person, FieldDef::new("name", TypeRef::string()));
//! registry.add_field(person, FieldDef::new("age", TypeRef::i64()));
//!
//! let binding = JsonBinding::new(registry);
//!
//! let alice = Instance::new(person);
//! alice.set("name", Obj::from("Alice"));
//! alice.set("age", Obj::from(30));
//!
//! let json = binding.to_json(&Obj::Inst(alice))?;
//! assert_eq!(json, r#"{"name":"Alice","age":30}"#);
//!
//! let back = binding.from_json(&json, &TypeRef::Class(person))?;
//! let inst = back.as_instance().unwrap();
//! assert_eq!(inst.get("age"), Some(Obj::Int(30)));
//! # Ok::<(), jsonbind::Error>(())
//! ```
//!
//! ## Untyped Binding
//!
//! Without a registered target, JSON binds to plain maps, lists, and exact
//! scalars via [`TypeRef::Any`], honoring the configured key ordering.
//! Untyped number literals narrow to the smallest exact representation:
//! an integral literal becomes [`Obj::Int`] when it fits `i64`, otherwise
//! [`Obj::BigInt`]; fractional and exponent literals become [`Obj::Decimal`].
//! The literal round-trips exactly in every case.
//!
//! ```rust
//! use jsonbind::{JsonBinding, Obj, TypeRef, TypeRegistry};
//!
//! let binding = JsonBinding::new(TypeRegistry::new());
//! let value = binding.from_json(r#"{"n": 9007199254740993}"#, &TypeRef::Any)?;
//! assert!(matches!(value, Obj::Map(_)));
//! # Ok::<(), jsonbind::Error>(())
//! ```

pub mod adapter;
pub mod config;
pub mod de;
pub mod error;
pub mod event;
mod macros;
pub mod map;
pub mod model;
pub mod number;
pub mod obj;
pub mod ser;
pub mod text;
pub mod types;
pub mod value;

pub use adapter::{replay, ValueBuilder, ValueEvents};
pub use config::{
    BindingConfig, CustomDeserializer, CustomSerializer, NamingStrategy, OrderStrategy,
};
pub use de::DeserializationContext;
pub use error::{Error, Result};
pub use event::{write_number, Event, EventSource, JsonGenerator};
pub use map::JsonMap;
pub use model::{ClassModel, PropertyModel};
pub use number::{BigDecimal, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};
pub use obj::{Instance, Obj};
pub use ser::SerializationContext;
pub use text::{parse_text, TextGenerator};
pub use types::{ClassId, FieldDef, ScalarKind, TypeRef, TypeRegistry};
pub use value::{JsonValue, Number};

use model::ModelCache;
use std::io::Write;
use std::sync::Arc;

/// The binding engine.
///
/// Holds the immutable type registry and configuration plus a lazily
/// populated cache of class models. One engine is built per configuration
/// and shared across calls; each call creates its own traversal state, so
/// concurrent use is safe.
#[derive(Debug)]
pub struct JsonBinding {
    registry: TypeRegistry,
    config: BindingConfig,
    models: ModelCache,
}

impl JsonBinding {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_config(registry, BindingConfig::new())
    }

    /// Creates an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(registry: TypeRegistry, config: BindingConfig) -> Self {
        JsonBinding {
            registry,
            config,
            models: ModelCache::new(),
        }
    }

    /// The type registry this engine binds against.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub(crate) fn class_model(&self, class: ClassId) -> Arc<ClassModel> {
        self.models.get_or_build(&self.registry, &self.config, class)
    }

    /// Map keys in the order the configured strategy dictates.
    pub(crate) fn ordered_keys<'a>(
        &self,
        keys: impl Iterator<Item = &'a String>,
    ) -> Vec<String> {
        let mut keys: Vec<String> = keys.cloned().collect();
        match self.config.order_strategy {
            OrderStrategy::Lexicographical => keys.sort(),
            OrderStrategy::Reverse => {
                keys.sort();
                keys.reverse();
            }
            OrderStrategy::Declaration | OrderStrategy::Any => {}
        }
        keys
    }

    /// Serializes an object graph to JSON text, honoring the configured
    /// pretty-print setting.
    ///
    /// # Errors
    ///
    /// Fails on cyclic graphs, values with no JSON representation, handler
    /// failures, or when the recursion limit trips.
    pub fn to_json(&self, obj: &Obj) -> Result<String> {
        let mut gen = TextGenerator::new(Vec::new(), self.config.pretty, self.config.indent);
        let mut ctx = SerializationContext::new(self);
        ctx.serialize(obj, &mut gen)?;
        String::from_utf8(gen.into_inner()).map_err(Error::custom)
    }

    /// Serializes an object graph to pretty-printed JSON text.
    pub fn to_json_pretty(&self, obj: &Obj) -> Result<String> {
        let mut gen = TextGenerator::new(Vec::new(), true, self.config.indent);
        let mut ctx = SerializationContext::new(self);
        ctx.serialize(obj, &mut gen)?;
        String::from_utf8(gen.into_inner()).map_err(Error::custom)
    }

    /// Serializes an object graph to a writer.
    pub fn to_writer<W: Write>(&self, obj: &Obj, out: W) -> Result<()> {
        let mut gen = TextGenerator::new(out, self.config.pretty, self.config.indent);
        let mut ctx = SerializationContext::new(self);
        ctx.serialize(obj, &mut gen)
    }

    /// Serializes an object graph to an in-memory [`JsonValue`] tree. The
    /// precision policy applies here too: a non-safe number becomes a
    /// string node.
    pub fn to_value(&self, obj: &Obj) -> Result<JsonValue> {
        let mut builder = ValueBuilder::new();
        let mut ctx = SerializationContext::new(self);
        ctx.serialize(obj, &mut builder)?;
        builder.into_value()
    }

    /// Deserializes JSON text into an object graph bound to `ty`.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, structural mismatches against the target
    /// type, unresolvable type variables, or handler failures.
    pub fn from_json(&self, input: &str, ty: &TypeRef) -> Result<Obj> {
        let value = parse_text(input)?;
        self.from_value(&value, ty)
    }

    /// Deserializes a materialized [`JsonValue`] tree into an object graph
    /// bound to `ty`.
    pub fn from_value(&self, value: &JsonValue, ty: &TypeRef) -> Result<Obj> {
        let mut events = ValueEvents::new(value);
        let mut ctx = DeserializationContext::new(self);
        ctx.run(&mut events, ty)
    }
}
