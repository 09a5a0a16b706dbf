//! Introspected class models and their cache.
//!
//! A [`ClassModel`] is the fully-resolved binding view of one registered
//! class: every property (inherited fields included) with its effective JSON
//! name, null policy, and declared type, arranged in the order the configured
//! strategy dictates. Models are computed on first use and cached for the
//! lifetime of the engine; concurrent readers share the cached model.
//!
//! Customization precedence, applied here once per class:
//!
//! - JSON name: explicit field override, else the global naming strategy
//! - nillable: explicit field override, else the class-level default of the
//!   declaring class, else the global `serialize_nulls` flag

use crate::config::{BindingConfig, OrderStrategy};
use crate::types::{ClassId, TypeRef, TypeRegistry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// The resolved binding view of one field.
#[derive(Clone, Debug)]
pub struct PropertyModel {
    /// Declared field name on the instance.
    pub field_name: String,
    /// Effective JSON property name after overrides and naming strategy.
    pub json_name: String,
    /// Declared static type, possibly containing type variables.
    pub ty: TypeRef,
    /// Whether a null value of this property is emitted as an explicit null.
    pub nillable: bool,
    /// Per-property date format, when overridden.
    pub date_format: Option<String>,
}

/// The resolved binding view of one class.
#[derive(Clone, Debug)]
pub struct ClassModel {
    pub class: ClassId,
    pub name: String,
    /// Properties in emission order, inherited properties first.
    pub properties: Vec<PropertyModel>,
    by_json_name: HashMap<String, usize>,
}

impl ClassModel {
    pub(crate) fn build(
        registry: &TypeRegistry,
        config: &BindingConfig,
        class: ClassId,
    ) -> ClassModel {
        // Walk the chain base-first so inherited properties precede the
        // subclass's own under declaration ordering.
        let mut chain = registry.class_chain(class);
        chain.reverse();

        let mut properties = Vec::new();
        for id in chain {
            let def = registry.class(id);
            for field in &def.fields {
                let json_name = match &field.json_name {
                    Some(name) => name.clone(),
                    None => config.naming_strategy.apply(&field.name),
                };
                let nillable = field
                    .nillable
                    .or(def.nillable)
                    .unwrap_or(config.serialize_nulls);
                properties.push(PropertyModel {
                    field_name: field.name.clone(),
                    json_name,
                    ty: field.ty.clone(),
                    nillable,
                    date_format: field.date_format.clone(),
                });
            }
        }

        match config.order_strategy {
            OrderStrategy::Lexicographical => {
                properties.sort_by(|a, b| a.json_name.cmp(&b.json_name));
            }
            OrderStrategy::Reverse => {
                properties.sort_by(|a, b| b.json_name.cmp(&a.json_name));
            }
            OrderStrategy::Declaration | OrderStrategy::Any => {}
        }

        let by_json_name = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.json_name.clone(), i))
            .collect();

        ClassModel {
            class,
            name: registry.class_name(class).to_string(),
            properties,
            by_json_name,
        }
    }

    /// Looks up a property by its JSON name.
    #[must_use]
    pub fn property_by_json_name(&self, json_name: &str) -> Option<&PropertyModel> {
        self.by_json_name
            .get(json_name)
            .map(|&i| &self.properties[i])
    }
}

/// Populate-once cache of class models, shared across calls and threads.
#[derive(Debug, Default)]
pub(crate) struct ModelCache {
    models: RwLock<HashMap<ClassId, Arc<ClassModel>>>,
}

impl ModelCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached model, computing and publishing it on first use.
    pub(crate) fn get_or_build(
        &self,
        registry: &TypeRegistry,
        config: &BindingConfig,
        class: ClassId,
    ) -> Arc<ClassModel> {
        if let Some(model) = self
            .models
            .read()
            .ok()
            .and_then(|models| models.get(&class).cloned())
        {
            return model;
        }
        let built = Arc::new(ClassModel::build(registry, config, class));
        match self.models.write() {
            Ok(mut models) => {
                // Another thread may have raced us; keep the published one.
                Arc::clone(models.entry(class).or_insert(built))
            }
            Err(_) => built,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingStrategy;
    use crate::types::FieldDef;

    fn registry_with_person() -> (TypeRegistry, ClassId) {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        registry.add_field(person, FieldDef::new("userName", TypeRef::string()));
        registry.add_field(person, FieldDef::new("age", TypeRef::i64()));
        (registry, person)
    }

    #[test]
    fn test_naming_strategy_applied() {
        let (registry, person) = registry_with_person();
        let config =
            BindingConfig::new().with_naming_strategy(NamingStrategy::LowerCaseWithUnderscores);
        let model = ClassModel::build(&registry, &config, person);
        assert_eq!(model.properties[0].json_name, "user_name");
        assert!(model.property_by_json_name("user_name").is_some());
        assert!(model.property_by_json_name("userName").is_none());
    }

    #[test]
    fn test_explicit_name_wins_over_strategy() {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        registry.add_field(
            person,
            FieldDef::new("userName", TypeRef::string()).with_json_name("handle"),
        );
        let config =
            BindingConfig::new().with_naming_strategy(NamingStrategy::LowerCaseWithUnderscores);
        let model = ClassModel::build(&registry, &config, person);
        assert_eq!(model.properties[0].json_name, "handle");
    }

    #[test]
    fn test_property_order_strategies() {
        let (registry, person) = registry_with_person();

        let model = ClassModel::build(&registry, &BindingConfig::new(), person);
        let names: Vec<_> = model.properties.iter().map(|p| p.json_name.clone()).collect();
        assert_eq!(names, vec!["userName", "age"]);

        let config = BindingConfig::new().with_order_strategy(OrderStrategy::Lexicographical);
        let model = ClassModel::build(&registry, &config, person);
        let names: Vec<_> = model.properties.iter().map(|p| p.json_name.clone()).collect();
        assert_eq!(names, vec!["age", "userName"]);

        let config = BindingConfig::new().with_order_strategy(OrderStrategy::Reverse);
        let model = ClassModel::build(&registry, &config, person);
        let names: Vec<_> = model.properties.iter().map(|p| p.json_name.clone()).collect();
        assert_eq!(names, vec!["userName", "age"]);
    }

    #[test]
    fn test_inherited_properties_come_first() {
        let mut registry = TypeRegistry::new();
        let base = registry.declare("Base");
        registry.add_field(base, FieldDef::new("id", TypeRef::i64()));
        let sub = registry.declare("Sub");
        registry.set_superclass(sub, TypeRef::Class(base));
        registry.add_field(sub, FieldDef::new("extra", TypeRef::string()));

        let model = ClassModel::build(&registry, &BindingConfig::new(), sub);
        let names: Vec<_> = model.properties.iter().map(|p| p.json_name.clone()).collect();
        assert_eq!(names, vec!["id", "extra"]);
    }

    #[test]
    fn test_nillable_precedence() {
        let mut registry = TypeRegistry::new();
        let person = registry.declare("Person");
        registry.set_nillable(person, true);
        registry.add_field(person, FieldDef::new("a", TypeRef::string()));
        registry.add_field(
            person,
            FieldDef::new("b", TypeRef::string()).with_nillable(false),
        );

        let model = ClassModel::build(&registry, &BindingConfig::new(), person);
        assert!(model.properties[0].nillable);
        assert!(!model.properties[1].nillable);
    }

    #[test]
    fn test_cache_returns_shared_model() {
        let (registry, person) = registry_with_person();
        let config = BindingConfig::new();
        let cache = ModelCache::new();
        let a = cache.get_or_build(&registry, &config, person);
        let b = cache.get_or_build(&registry, &config, person);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
