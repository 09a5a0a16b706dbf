//! Engine configuration and customization.
//!
//! A [`BindingConfig`] is built once at bootstrap and injected into the
//! engine at construction; it is immutable afterwards. It carries:
//!
//! - the global property [`OrderStrategy`] and [`NamingStrategy`]
//! - the default null-serialization policy (overridable per class/field)
//! - the bounded recursion limit for handler delegation
//! - type-keyed tables of user-registered serializers and deserializers
//!
//! Per-property overrides live on the registered field definitions; the
//! resolution precedence is explicit property override, then class-level
//! default, then the global default configured here.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{BindingConfig, OrderStrategy, NamingStrategy};
//!
//! let config = BindingConfig::new()
//!     .with_order_strategy(OrderStrategy::Lexicographical)
//!     .with_naming_strategy(NamingStrategy::LowerCaseWithUnderscores)
//!     .with_serialize_nulls(true);
//! ```

use crate::de::DeserializationContext;
use crate::event::JsonGenerator;
use crate::obj::Obj;
use crate::types::{ClassId, TypeRegistry};
use crate::value::JsonValue;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Policy governing emitted/assumed property key order.
///
/// The same strategy is applied symmetrically: an untyped object deserialized
/// under a given strategy uses a map discipline that preserves that ordering
/// on subsequent serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OrderStrategy {
    /// Declaration/insertion order (the default when unspecified).
    #[default]
    Declaration,
    /// Ascending name sort.
    Lexicographical,
    /// Descending name sort.
    Reverse,
    /// Implementation-chosen; consumers must not depend on a specific order.
    Any,
}

/// Policy translating a declared field name into its JSON property name.
///
/// An explicit per-field name override always wins over the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NamingStrategy {
    /// Use the declared field name as-is.
    #[default]
    Identity,
    /// `userName` becomes `user_name`.
    LowerCaseWithUnderscores,
    /// `userName` becomes `UserName`.
    UpperCamelCase,
}

impl NamingStrategy {
    /// Applies this strategy to a declared field name.
    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingStrategy::Identity => name.to_string(),
            NamingStrategy::LowerCaseWithUnderscores => {
                let mut out = String::with_capacity(name.len() + 4);
                for ch in name.chars() {
                    if ch.is_uppercase() {
                        if !out.is_empty() {
                            out.push('_');
                        }
                        out.extend(ch.to_lowercase());
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            NamingStrategy::UpperCamelCase => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// User-registered serializer for a class.
///
/// The engine delegates wholesale: the handler receives the value and a
/// restricted write capability, and the engine does not inspect or alter
/// what the handler emits. Re-entering the engine through the context is
/// covered by the recursion-depth guard.
pub trait CustomSerializer: Send + Sync {
    fn serialize(
        &self,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
        ctx: &mut crate::ser::SerializationContext<'_>,
    ) -> Result<()>;
}

/// User-registered deserializer for a class.
///
/// The handler receives the materialized JSON subtree for the value and may
/// re-enter the engine through the context.
pub trait CustomDeserializer: Send + Sync {
    fn deserialize(&self, value: &JsonValue, ctx: &mut DeserializationContext<'_>) -> Result<Obj>;
}

/// Immutable engine configuration.
#[derive(Clone)]
pub struct BindingConfig {
    pub order_strategy: OrderStrategy,
    pub naming_strategy: NamingStrategy,
    /// Global default for emitting null-valued properties.
    pub serialize_nulls: bool,
    /// Pretty-print output of `to_string`.
    pub pretty: bool,
    /// Indentation width for pretty output.
    pub indent: usize,
    /// Bounded depth guard for dispatch, including handler delegation.
    pub recursion_limit: usize,
    serializers: HashMap<ClassId, Arc<dyn CustomSerializer>>,
    deserializers: HashMap<ClassId, Arc<dyn CustomDeserializer>>,
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            order_strategy: OrderStrategy::default(),
            naming_strategy: NamingStrategy::default(),
            serialize_nulls: false,
            pretty: false,
            indent: 2,
            recursion_limit: 256,
            serializers: HashMap::new(),
            deserializers: HashMap::new(),
        }
    }
}

impl BindingConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_order_strategy(mut self, strategy: OrderStrategy) -> Self {
        self.order_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_naming_strategy(mut self, strategy: NamingStrategy) -> Self {
        self.naming_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.serialize_nulls = serialize_nulls;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Registers a custom serializer for a class.
    #[must_use]
    pub fn with_serializer<S>(mut self, class: ClassId, serializer: S) -> Self
    where
        S: CustomSerializer + 'static,
    {
        self.serializers.insert(class, Arc::new(serializer));
        self
    }

    /// Registers a custom deserializer for a class.
    #[must_use]
    pub fn with_deserializer<D>(mut self, class: ClassId, deserializer: D) -> Self
    where
        D: CustomDeserializer + 'static,
    {
        self.deserializers.insert(class, Arc::new(deserializer));
        self
    }

    /// Most-specific-first serializer lookup: the class itself, then its
    /// superclass chain. First registered match wins.
    pub(crate) fn serializer_for(
        &self,
        registry: &TypeRegistry,
        class: ClassId,
    ) -> Option<Arc<dyn CustomSerializer>> {
        for candidate in registry.class_chain(class) {
            if let Some(handler) = self.serializers.get(&candidate) {
                return Some(Arc::clone(handler));
            }
        }
        None
    }

    /// Most-specific-first deserializer lookup.
    pub(crate) fn deserializer_for(
        &self,
        registry: &TypeRegistry,
        class: ClassId,
    ) -> Option<Arc<dyn CustomDeserializer>> {
        for candidate in registry.class_chain(class) {
            if let Some(handler) = self.deserializers.get(&candidate) {
                return Some(Arc::clone(handler));
            }
        }
        None
    }
}

impl std::fmt::Debug for BindingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingConfig")
            .field("order_strategy", &self.order_strategy)
            .field("naming_strategy", &self.naming_strategy)
            .field("serialize_nulls", &self.serialize_nulls)
            .field("pretty", &self.pretty)
            .field("indent", &self.indent)
            .field("recursion_limit", &self.recursion_limit)
            .field("serializers", &self.serializers.len())
            .field("deserializers", &self.deserializers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_identity() {
        assert_eq!(NamingStrategy::Identity.apply("userName"), "userName");
    }

    #[test]
    fn test_naming_lower_case_with_underscores() {
        let s = NamingStrategy::LowerCaseWithUnderscores;
        assert_eq!(s.apply("userName"), "user_name");
        assert_eq!(s.apply("URL"), "u_r_l");
        assert_eq!(s.apply("plain"), "plain");
    }

    #[test]
    fn test_naming_upper_camel_case() {
        let s = NamingStrategy::UpperCamelCase;
        assert_eq!(s.apply("userName"), "UserName");
        assert_eq!(s.apply(""), "");
    }

    #[test]
    fn test_builder() {
        let config = BindingConfig::new()
            .with_order_strategy(OrderStrategy::Reverse)
            .with_serialize_nulls(true)
            .with_recursion_limit(8);
        assert_eq!(config.order_strategy, OrderStrategy::Reverse);
        assert!(config.serialize_nulls);
        assert_eq!(config.recursion_limit, 8);
    }
}
