//! Type descriptors and generic type resolution.
//!
//! The engine binds dynamic object graphs against a statically-built graph
//! of type descriptors: applications declare their classes (name, type
//! parameters, superclass reference, fields) in a [`TypeRegistry`] once at
//! bootstrap. A [`TypeRef`] describes any declarable type, including unbound
//! type variables of generic classes.
//!
//! Resolution walks the inheritance chain of a runtime type, positionally
//! matching type arguments against the variable's declaring class, with a
//! redirection stack for variables propagated through wrapper generics.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::{FieldDef, TypeRef, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//!
//! // class GenericBox<T> { content: T }
//! let generic_box = registry.declare_generic("GenericBox", &["T"]);
//! let t = registry.type_var(generic_box, "T").unwrap();
//! registry.add_field(generic_box, FieldDef::new("content", t));
//!
//! // class StringBox extends GenericBox<String>
//! let string_box = registry.declare("StringBox");
//! registry.set_superclass(
//!     string_box,
//!     TypeRef::parameterized(generic_box, vec![TypeRef::string()]),
//! );
//! ```

use crate::{Error, Result};

/// Handle to a class descriptor in a [`TypeRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

/// The built-in scalar kinds a leaf value can bind to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I64,
    F64,
    BigInt,
    Decimal,
    String,
    Date,
}

impl ScalarKind {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::I64 => "integer",
            ScalarKind::F64 => "double",
            ScalarKind::BigInt => "big integer",
            ScalarKind::Decimal => "decimal",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
        }
    }
}

/// A declarable type: the static type of a field, a type argument, or an
/// explicit type token passed to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    /// No static type information; binding falls back to the untyped
    /// map/list/decimal representation.
    Any,
    Scalar(ScalarKind),
    /// Homogeneous sequence of the element type.
    List(Box<TypeRef>),
    /// String-keyed map of the element type.
    Map(Box<TypeRef>),
    /// A registered class with its type parameters unbound (raw).
    Class(ClassId),
    /// A registered class applied to concrete (or propagated) arguments.
    Parameterized { class: ClassId, args: Vec<TypeRef> },
    /// An unbound type variable: parameter `index` of `declared_by`.
    Variable { declared_by: ClassId, index: usize },
}

impl TypeRef {
    #[must_use]
    pub fn boolean() -> TypeRef {
        TypeRef::Scalar(ScalarKind::Bool)
    }

    #[must_use]
    pub fn i64() -> TypeRef {
        TypeRef::Scalar(ScalarKind::I64)
    }

    #[must_use]
    pub fn f64() -> TypeRef {
        TypeRef::Scalar(ScalarKind::F64)
    }

    #[must_use]
    pub fn big_int() -> TypeRef {
        TypeRef::Scalar(ScalarKind::BigInt)
    }

    #[must_use]
    pub fn decimal() -> TypeRef {
        TypeRef::Scalar(ScalarKind::Decimal)
    }

    #[must_use]
    pub fn string() -> TypeRef {
        TypeRef::Scalar(ScalarKind::String)
    }

    #[must_use]
    pub fn date() -> TypeRef {
        TypeRef::Scalar(ScalarKind::Date)
    }

    #[must_use]
    pub fn list(element: TypeRef) -> TypeRef {
        TypeRef::List(Box::new(element))
    }

    #[must_use]
    pub fn map(element: TypeRef) -> TypeRef {
        TypeRef::Map(Box::new(element))
    }

    #[must_use]
    pub fn parameterized(class: ClassId, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Parameterized { class, args }
    }

    /// The raw class behind a class or parameterized reference.
    #[must_use]
    pub fn raw_class(&self) -> Option<ClassId> {
        match self {
            TypeRef::Class(id) => Some(*id),
            TypeRef::Parameterized { class, .. } => Some(*class),
            _ => None,
        }
    }
}

/// Declared metadata for one field of a registered class.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) ty: TypeRef,
    pub(crate) json_name: Option<String>,
    pub(crate) nillable: Option<bool>,
    pub(crate) date_format: Option<String>,
}

impl FieldDef {
    /// Creates a field with the declared name and static type.
    #[must_use]
    pub fn new(name: &str, ty: TypeRef) -> Self {
        FieldDef {
            name: name.to_string(),
            ty,
            json_name: None,
            nillable: None,
            date_format: None,
        }
    }

    /// Overrides the JSON property name, taking precedence over the global
    /// naming strategy.
    #[must_use]
    pub fn with_json_name(mut self, json_name: &str) -> Self {
        self.json_name = Some(json_name.to_string());
        self
    }

    /// Overrides null emission for this field, taking precedence over the
    /// class-level and global defaults.
    #[must_use]
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = Some(nillable);
        self
    }

    /// Sets a `chrono` format string applied to date values of this field on
    /// both serialization and deserialization.
    #[must_use]
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = Some(format.to_string());
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ClassDef {
    pub(crate) name: String,
    pub(crate) type_params: Vec<String>,
    pub(crate) superclass: Option<TypeRef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) nillable: Option<bool>,
}

/// The statically-built graph of class descriptors.
///
/// Built once at bootstrap, then moved into the engine and shared immutably
/// by every call.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    classes: Vec<ClassDef>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a non-generic class and returns its handle.
    pub fn declare(&mut self, name: &str) -> ClassId {
        self.declare_generic(name, &[])
    }

    /// Declares a class with the given type parameter names.
    pub fn declare_generic(&mut self, name: &str, type_params: &[&str]) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef {
            name: name.to_string(),
            type_params: type_params.iter().map(|p| p.to_string()).collect(),
            superclass: None,
            fields: Vec::new(),
            nillable: None,
        });
        id
    }

    /// Sets the superclass reference of a class. The reference must be a
    /// class or parameterized class reference.
    pub fn set_superclass(&mut self, id: ClassId, superclass: TypeRef) {
        self.classes[id.0 as usize].superclass = Some(superclass);
    }

    /// Sets the class-level nillable default for all fields of the class.
    pub fn set_nillable(&mut self, id: ClassId, nillable: bool) {
        self.classes[id.0 as usize].nillable = Some(nillable);
    }

    /// Adds a field to a class.
    pub fn add_field(&mut self, id: ClassId, field: FieldDef) {
        self.classes[id.0 as usize].fields.push(field);
    }

    /// The declared name of a class.
    #[must_use]
    pub fn class_name(&self, id: ClassId) -> &str {
        &self.classes[id.0 as usize].name
    }

    /// A variable reference to the named type parameter of a class.
    #[must_use]
    pub fn type_var(&self, id: ClassId, name: &str) -> Option<TypeRef> {
        let index = self.classes[id.0 as usize]
            .type_params
            .iter()
            .position(|p| p == name)?;
        Some(TypeRef::Variable {
            declared_by: id,
            index,
        })
    }

    pub(crate) fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0 as usize]
    }

    /// The class and its raw superclasses, most specific first.
    pub(crate) fn class_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(raw) = self
            .class(current)
            .superclass
            .as_ref()
            .and_then(TypeRef::raw_class)
        {
            chain.push(raw);
            current = raw;
        }
        chain
    }

    pub(crate) fn variable_name(&self, declared_by: ClassId, index: usize) -> String {
        self.class(declared_by)
            .type_params
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"))
    }

    /// Human-readable rendering of a type reference for diagnostics.
    #[must_use]
    pub fn describe(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Any => "any".to_string(),
            TypeRef::Scalar(kind) => kind.describe().to_string(),
            TypeRef::List(el) => format!("list<{}>", self.describe(el)),
            TypeRef::Map(el) => format!("map<{}>", self.describe(el)),
            TypeRef::Class(id) => self.class_name(*id).to_string(),
            TypeRef::Parameterized { class, args } => {
                let args: Vec<String> = args.iter().map(|a| self.describe(a)).collect();
                format!("{}<{}>", self.class_name(*class), args.join(", "))
            }
            TypeRef::Variable { declared_by, index } => {
                self.variable_name(*declared_by, *index)
            }
        }
    }

    /// Resolves a type variable against a runtime type by climbing the
    /// inheritance chain of class descriptors.
    ///
    /// When the positional match yields another type variable (propagated
    /// from a wrapping generic class), the current frame is pushed onto a
    /// redirection stack and the climb continues; the propagated variable is
    /// resolved later by popping one frame per redirection and repeating the
    /// positional match against it. Redirection depth is bounded only by the
    /// declared inheritance depth.
    ///
    /// Exhausting the hierarchy without a binding is a contract violation
    /// and fails with [`Error::TypeResolution`].
    pub fn resolve_variable(
        &self,
        type_to_search: &TypeRef,
        declared_by: ClassId,
        index: usize,
    ) -> Result<TypeRef> {
        let unresolved = |d: ClassId, i: usize| {
            Error::type_resolution(&self.variable_name(d, i), self.class_name(d))
        };
        let mut search = VariableSearch {
            registry: self,
            frames: Vec::new(),
        };
        match search.search(Some(type_to_search.clone()), declared_by, index)? {
            Some(TypeRef::Variable {
                declared_by: d,
                index: i,
            }) => Err(unresolved(d, i)),
            Some(concrete) => Ok(concrete),
            None => Err(unresolved(declared_by, index)),
        }
    }

    /// Recursively substitutes every variable inside a declared type using
    /// the given runtime type, returning a fully concrete reference.
    pub fn resolve_type(&self, ty: &TypeRef, runtime: &TypeRef) -> Result<TypeRef> {
        match ty {
            TypeRef::Variable { declared_by, index } => {
                self.resolve_variable(runtime, *declared_by, *index)
            }
            TypeRef::List(el) => Ok(TypeRef::list(self.resolve_type(el, runtime)?)),
            TypeRef::Map(el) => Ok(TypeRef::map(self.resolve_type(el, runtime)?)),
            TypeRef::Parameterized { class, args } => {
                let resolved: Result<Vec<TypeRef>> = args
                    .iter()
                    .map(|arg| self.resolve_type(arg, runtime))
                    .collect();
                Ok(TypeRef::Parameterized {
                    class: *class,
                    args: resolved?,
                })
            }
            other => Ok(other.clone()),
        }
    }
}

/// Search for a type variable in an inheritance hierarchy.
///
/// `frames` holds the parameterized subclasses passed on the way up; a
/// variable that resolves to another propagated variable is rematched
/// against the popped frame.
struct VariableSearch<'r> {
    registry: &'r TypeRegistry,
    frames: Vec<(ClassId, Vec<TypeRef>)>,
}

impl VariableSearch<'_> {
    fn search(
        &mut self,
        type_to_search: Option<TypeRef>,
        declared_by: ClassId,
        index: usize,
    ) -> Result<Option<TypeRef>> {
        let Some((class, args)) = self.find_parameterized_superclass(type_to_search)? else {
            return Ok(None);
        };
        if let Some(matched) = self.match_argument(class, &args, declared_by, index) {
            return Ok(Some(matched));
        }
        self.frames.push((class, args));
        let superclass = self.registry.class(class).superclass.clone();
        self.search(superclass, declared_by, index)
    }

    /// Climbs plain class frames until the nearest parameterized superclass.
    fn find_parameterized_superclass(
        &self,
        ty: Option<TypeRef>,
    ) -> Result<Option<(ClassId, Vec<TypeRef>)>> {
        match ty {
            None => Ok(None),
            Some(TypeRef::Parameterized { class, args }) => Ok(Some((class, args))),
            Some(TypeRef::Class(id)) => {
                self.find_parameterized_superclass(self.registry.class(id).superclass.clone())
            }
            Some(other) => Err(Error::custom(format!(
                "cannot search for a type variable inside {}",
                self.registry.describe(&other)
            ))),
        }
    }

    fn match_argument(
        &mut self,
        class: ClassId,
        args: &[TypeRef],
        declared_by: ClassId,
        index: usize,
    ) -> Option<TypeRef> {
        if class != declared_by {
            return None;
        }
        let matched = args.get(index)?.clone();
        if let TypeRef::Variable {
            declared_by: d,
            index: i,
        } = matched
        {
            // Propagated generic from a wrapping class.
            return self.check_subclass_runtime_info(d, i);
        }
        Some(matched)
    }

    fn check_subclass_runtime_info(&mut self, declared_by: ClassId, index: usize) -> Option<TypeRef> {
        match self.frames.pop() {
            None => Some(TypeRef::Variable { declared_by, index }),
            Some((class, args)) => self.match_argument(class, &args, declared_by, index),
        }
    }
}
