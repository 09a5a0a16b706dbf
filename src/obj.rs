//! Dynamic object-graph values.
//!
//! [`Obj`] is the in-memory form the engine binds to and from JSON: scalars,
//! homogeneous lists, string-keyed maps, and [`Instance`]s of registered
//! classes. An instance is a shared, mutable record of field values; sharing
//! is what makes self-referential graphs expressible, and instance identity
//! (the shared allocation, not value equality) is what the cycle guard keys
//! on during serialization.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{FieldDef, Instance, Obj, TypeRef, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let person = registry.declare("Person");
//! registry.add_field(person, FieldDef::new("name", TypeRef::string()));
//!
//! let alice = Instance::new(person);
//! alice.set("name", Obj::from("Alice"));
//! assert_eq!(alice.get("name"), Some(Obj::from("Alice")));
//! ```

use crate::number::BigDecimal;
use crate::types::ClassId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use std::cell::RefCell;
use std::rc::Rc;

/// A value in the application object graph.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Obj {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    BigInt(BigInt),
    Decimal(BigDecimal),
    Str(String),
    Date(DateTime<Utc>),
    List(Vec<Obj>),
    Map(IndexMap<String, Obj>),
    Inst(Instance),
}

impl Obj {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Obj::Null)
    }

    /// If the value is an instance, returns it.
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Obj::Inst(inst) => Some(inst),
            _ => None,
        }
    }

    /// If the value is a string, returns a copy of it.
    #[must_use]
    pub fn as_str(&self) -> Option<String> {
        match self {
            Obj::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// If the value is an integral number in `i64` range, returns it.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Obj::Int(v) => Some(*v),
            Obj::BigInt(v) => i64::try_from(v).ok(),
            Obj::Decimal(d) => d.to_i64(),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
struct InstanceData {
    class: ClassId,
    fields: IndexMap<String, Obj>,
}

/// A shared, mutable instance of a registered class.
///
/// Cloning an `Instance` clones the handle, not the record: both handles
/// observe the same fields. Two handles to the same record have the same
/// [`identity`](Instance::identity); distinct records comparing equal by
/// value do not.
#[derive(Clone, Debug)]
pub struct Instance(Rc<RefCell<InstanceData>>);

impl Instance {
    /// Creates an instance of the given class with no fields set.
    #[must_use]
    pub fn new(class: ClassId) -> Self {
        Instance(Rc::new(RefCell::new(InstanceData {
            class,
            fields: IndexMap::new(),
        })))
    }

    /// The class this instance was created with.
    #[must_use]
    pub fn class(&self) -> ClassId {
        self.0.borrow().class
    }

    /// Sets a field value, replacing any previous value.
    pub fn set(&self, name: &str, value: Obj) {
        self.0.borrow_mut().fields.insert(name.to_string(), value);
    }

    /// Returns a copy of the named field value, if set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Obj> {
        self.0.borrow().fields.get(name).cloned()
    }

    /// Stable identity of the shared record, for cycle detection.
    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity() || *self.0.borrow() == *other.0.borrow()
    }
}

impl From<bool> for Obj {
    fn from(value: bool) -> Self {
        Obj::Bool(value)
    }
}

impl From<i32> for Obj {
    fn from(value: i32) -> Self {
        Obj::Int(value as i64)
    }
}

impl From<i64> for Obj {
    fn from(value: i64) -> Self {
        Obj::Int(value)
    }
}

impl From<f64> for Obj {
    fn from(value: f64) -> Self {
        Obj::Float(value)
    }
}

impl From<BigInt> for Obj {
    fn from(value: BigInt) -> Self {
        Obj::BigInt(value)
    }
}

impl From<BigDecimal> for Obj {
    fn from(value: BigDecimal) -> Self {
        Obj::Decimal(value)
    }
}

impl From<&str> for Obj {
    fn from(value: &str) -> Self {
        Obj::Str(value.to_string())
    }
}

impl From<String> for Obj {
    fn from(value: String) -> Self {
        Obj::Str(value)
    }
}

impl From<DateTime<Utc>> for Obj {
    fn from(value: DateTime<Utc>) -> Self {
        Obj::Date(value)
    }
}

impl From<Vec<Obj>> for Obj {
    fn from(value: Vec<Obj>) -> Self {
        Obj::List(value)
    }
}

impl From<IndexMap<String, Obj>> for Obj {
    fn from(value: IndexMap<String, Obj>) -> Self {
        Obj::Map(value)
    }
}

impl From<Instance> for Obj {
    fn from(value: Instance) -> Self {
        Obj::Inst(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;

    #[test]
    fn test_instance_fields() {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        let inst = Instance::new(person);
        assert_eq!(inst.get("name"), None);
        inst.set("name", Obj::from("Alice"));
        inst.set("age", Obj::from(30));
        assert_eq!(inst.get("name"), Some(Obj::from("Alice")));
        assert_eq!(inst.get("age"), Some(Obj::Int(30)));
        inst.set("age", Obj::from(31));
        assert_eq!(inst.get("age"), Some(Obj::Int(31)));
    }

    #[test]
    fn test_instance_identity_shared_through_clone() {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        let a = Instance::new(person);
        let b = a.clone();
        assert_eq!(a.identity(), b.identity());
        b.set("name", Obj::from("shared"));
        assert_eq!(a.get("name"), Some(Obj::from("shared")));

        let c = Instance::new(person);
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_instance_value_equality() {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        let a = Instance::new(person);
        a.set("name", Obj::from("Alice"));
        let b = Instance::new(person);
        b.set("name", Obj::from("Alice"));
        assert_eq!(a, b);
        b.set("name", Obj::from("Bob"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_obj_accessors() {
        assert_eq!(Obj::Int(7).as_i64(), Some(7));
        assert_eq!(Obj::BigInt(BigInt::from(7)).as_i64(), Some(7));
        assert_eq!(Obj::Str("x".into()).as_i64(), None);
        assert!(Obj::Null.is_null());
        assert_eq!(Obj::from("s").as_str(), Some("s".to_string()));
    }
}
