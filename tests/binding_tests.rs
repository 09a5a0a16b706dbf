//! End-to-end binding tests: registered classes, customization, handlers,
//! and traversal guards.

use jsonbind::{
    BindingConfig, CustomDeserializer, CustomSerializer, DeserializationContext, Error, FieldDef,
    Instance, JsonBinding, JsonGenerator, JsonValue, NamingStrategy, Obj, OrderStrategy,
    SerializationContext, TypeRef, TypeRegistry,
};

fn person_registry() -> (TypeRegistry, jsonbind::ClassId) {
    let mut registry = TypeRegistry::new();
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("name", TypeRef::string()));
    registry.add_field(person, FieldDef::new("age", TypeRef::i64()));
    (registry, person)
}

#[test]
fn test_struct_round_trip() {
    let (registry, person) = person_registry();
    let binding = JsonBinding::new(registry);

    let alice = Instance::new(person);
    alice.set("name", Obj::from("Alice"));
    alice.set("age", Obj::from(30));

    let json = binding.to_json(&Obj::Inst(alice.clone())).unwrap();
    assert_eq!(json, r#"{"name":"Alice","age":30}"#);

    let back = binding.from_json(&json, &TypeRef::Class(person)).unwrap();
    assert_eq!(back, Obj::Inst(alice));
}

#[test]
fn test_nested_class_field() {
    let mut registry = TypeRegistry::new();
    let address = registry.declare("Address");
    registry.add_field(address, FieldDef::new("city", TypeRef::string()));
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("name", TypeRef::string()));
    registry.add_field(person, FieldDef::new("address", TypeRef::Class(address)));
    let binding = JsonBinding::new(registry);

    let json = r#"{"name":"Alice","address":{"city":"Prague"}}"#;
    let back = binding.from_json(json, &TypeRef::Class(person)).unwrap();
    let inst = back.as_instance().unwrap();
    let addr = inst.get("address").unwrap();
    assert_eq!(
        addr.as_instance().unwrap().get("city"),
        Some(Obj::from("Prague"))
    );
    assert_eq!(binding.to_json(&back).unwrap(), json);
}

#[test]
fn test_naming_strategy_and_override() {
    let mut registry = TypeRegistry::new();
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("userName", TypeRef::string()));
    registry.add_field(
        person,
        FieldDef::new("age", TypeRef::i64()).with_json_name("years"),
    );
    let config =
        BindingConfig::new().with_naming_strategy(NamingStrategy::LowerCaseWithUnderscores);
    let binding = JsonBinding::with_config(registry, config);

    let inst = Instance::new(person);
    inst.set("userName", Obj::from("alice"));
    inst.set("age", Obj::from(30));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"user_name":"alice","years":30}"#
    );

    // The override and the strategy apply on reading too.
    let back = binding
        .from_json(
            r#"{"user_name":"bob","years":41}"#,
            &TypeRef::Class(person),
        )
        .unwrap();
    let inst = back.as_instance().unwrap();
    assert_eq!(inst.get("userName"), Some(Obj::from("bob")));
    assert_eq!(inst.get("age"), Some(Obj::Int(41)));
}

#[test]
fn test_null_handling_precedence() {
    let mut registry = TypeRegistry::new();
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("name", TypeRef::string()));
    registry.add_field(
        person,
        FieldDef::new("nickname", TypeRef::string()).with_nillable(true),
    );
    let binding = JsonBinding::new(registry.clone());

    let inst = Instance::new(person);
    inst.set("name", Obj::Null);
    inst.set("nickname", Obj::Null);
    // Default skips nulls; the per-field override forces emission.
    assert_eq!(
        binding.to_json(&Obj::Inst(inst.clone())).unwrap(),
        r#"{"nickname":null}"#
    );

    let binding =
        JsonBinding::with_config(registry, BindingConfig::new().with_serialize_nulls(true));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"name":null,"nickname":null}"#
    );
}

#[test]
fn test_unset_fields_are_treated_as_null() {
    let (registry, person) = person_registry();
    let binding = JsonBinding::new(registry);
    let inst = Instance::new(person);
    inst.set("name", Obj::from("Alice"));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"name":"Alice"}"#
    );
}

#[test]
fn test_property_ordering_strategies() {
    let (registry, person) = person_registry();
    let inst = Instance::new(person);
    inst.set("name", Obj::from("Alice"));
    inst.set("age", Obj::from(30));

    let binding = JsonBinding::with_config(
        registry.clone(),
        BindingConfig::new().with_order_strategy(OrderStrategy::Lexicographical),
    );
    assert_eq!(
        binding.to_json(&Obj::Inst(inst.clone())).unwrap(),
        r#"{"age":30,"name":"Alice"}"#
    );

    let binding = JsonBinding::with_config(
        registry,
        BindingConfig::new().with_order_strategy(OrderStrategy::Reverse),
    );
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"name":"Alice","age":30}"#
    );
}

#[test]
fn test_untyped_ordering_survives_round_trip() {
    let binding = JsonBinding::with_config(
        TypeRegistry::new(),
        BindingConfig::new().with_order_strategy(OrderStrategy::Lexicographical),
    );
    let value = binding
        .from_json(r#"{"z":1,"a":2,"m":3}"#, &TypeRef::Any)
        .unwrap();
    assert_eq!(binding.to_json(&value).unwrap(), r#"{"a":2,"m":3,"z":1}"#);

    let binding = JsonBinding::with_config(
        TypeRegistry::new(),
        BindingConfig::new().with_order_strategy(OrderStrategy::Reverse),
    );
    let value = binding
        .from_json(r#"{"z":1,"a":2,"m":3}"#, &TypeRef::Any)
        .unwrap();
    assert_eq!(binding.to_json(&value).unwrap(), r#"{"z":1,"m":3,"a":2}"#);
}

#[test]
fn test_unknown_properties_are_skipped() {
    let (registry, person) = person_registry();
    let binding = JsonBinding::new(registry);
    let back = binding
        .from_json(
            r#"{"name":"Alice","unknown":{"deep":[1,2]},"age":30}"#,
            &TypeRef::Class(person),
        )
        .unwrap();
    let inst = back.as_instance().unwrap();
    assert_eq!(inst.get("age"), Some(Obj::Int(30)));
    assert_eq!(inst.get("unknown"), None);
}

#[test]
fn test_structure_error_carries_path() {
    let mut registry = TypeRegistry::new();
    let address = registry.declare("Address");
    registry.add_field(address, FieldDef::new("city", TypeRef::string()));
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("address", TypeRef::Class(address)));
    let binding = JsonBinding::new(registry);

    let err = binding
        .from_json(
            r#"{"address":{"city":42}}"#,
            &TypeRef::Class(person),
        )
        .unwrap_err();
    match err {
        Error::Structure { path, expected, .. } => {
            assert_eq!(path, "$.address.city");
            assert_eq!(expected, "string");
        }
        other => panic!("expected structure error, got {other:?}"),
    }
}

#[test]
fn test_cycle_detection() {
    let mut registry = TypeRegistry::new();
    let node = registry.declare("Node");
    registry.add_field(node, FieldDef::new("next", TypeRef::Class(node)));
    let binding = JsonBinding::new(registry);

    let a = Instance::new(node);
    let b = Instance::new(node);
    a.set("next", Obj::Inst(b.clone()));
    b.set("next", Obj::Inst(a.clone()));

    let err = binding.to_json(&Obj::Inst(a)).unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }));
}

#[test]
fn test_shared_instance_is_not_a_cycle() {
    let mut registry = TypeRegistry::new();
    let node = registry.declare("Node");
    registry.add_field(node, FieldDef::new("left", TypeRef::Class(node)));
    registry.add_field(node, FieldDef::new("right", TypeRef::Class(node)));
    let binding = JsonBinding::new(registry);

    // A diamond: the same leaf reachable twice, but no back edge.
    let leaf = Instance::new(node);
    let root = Instance::new(node);
    root.set("left", Obj::Inst(leaf.clone()));
    root.set("right", Obj::Inst(leaf));
    assert_eq!(
        binding.to_json(&Obj::Inst(root)).unwrap(),
        r#"{"left":{},"right":{}}"#
    );
}

#[test]
fn test_recursion_limit_on_deep_input() {
    let binding = JsonBinding::with_config(
        TypeRegistry::new(),
        BindingConfig::new().with_recursion_limit(16),
    );
    let mut deep = Obj::Int(1);
    for _ in 0..32 {
        deep = Obj::List(vec![deep]);
    }
    let err = binding.to_json(&deep).unwrap_err();
    assert!(matches!(err, Error::RecursionLimit { limit: 16, .. }));

    let json = format!("{}1{}", "[".repeat(32), "]".repeat(32));
    let err = binding.from_json(&json, &TypeRef::Any).unwrap_err();
    assert!(matches!(err, Error::RecursionLimit { limit: 16, .. }));
}

struct UpperCaseNameSerializer;

impl CustomSerializer for UpperCaseNameSerializer {
    fn serialize(
        &self,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
        _ctx: &mut SerializationContext<'_>,
    ) -> jsonbind::Result<()> {
        let inst = obj
            .as_instance()
            .ok_or_else(|| Error::custom("expected an instance"))?;
        let name = inst
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        gen.write_start_object()?;
        gen.write_key("name")?;
        gen.write_string(&name.to_uppercase())?;
        gen.write_end_object()
    }
}

#[test]
fn test_custom_serializer_replaces_default_output() {
    let (registry, person) = person_registry();
    let config = BindingConfig::new().with_serializer(person, UpperCaseNameSerializer);
    let binding = JsonBinding::with_config(registry, config);

    let inst = Instance::new(person);
    inst.set("name", Obj::from("alice"));
    inst.set("age", Obj::from(30));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"name":"ALICE"}"#
    );
}

struct WrappingSerializer;

impl CustomSerializer for WrappingSerializer {
    fn serialize(
        &self,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
        ctx: &mut SerializationContext<'_>,
    ) -> jsonbind::Result<()> {
        gen.write_start_object()?;
        gen.write_key("payload")?;
        // Default dispatch for this level only; without it the handler
        // would recurse into itself.
        ctx.serialize_default(obj, gen)?;
        gen.write_end_object()
    }
}

#[test]
fn test_serialize_default_escape_hatch() {
    let (registry, person) = person_registry();
    let config = BindingConfig::new().with_serializer(person, WrappingSerializer);
    let binding = JsonBinding::with_config(registry, config);

    let inst = Instance::new(person);
    inst.set("name", Obj::from("Alice"));
    inst.set("age", Obj::from(30));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"payload":{"name":"Alice","age":30}}"#
    );
}

struct FailingSerializer;

impl CustomSerializer for FailingSerializer {
    fn serialize(
        &self,
        _obj: &Obj,
        _gen: &mut dyn JsonGenerator,
        _ctx: &mut SerializationContext<'_>,
    ) -> jsonbind::Result<()> {
        Err(Error::custom("boom"))
    }
}

#[test]
fn test_handler_failure_is_wrapped_with_path() {
    let (mut registry, person) = person_registry();
    let holder = registry.declare("Holder");
    registry.add_field(holder, FieldDef::new("person", TypeRef::Class(person)));
    let config = BindingConfig::new().with_serializer(person, FailingSerializer);
    let binding = JsonBinding::with_config(registry, config);

    let inst = Instance::new(holder);
    inst.set("person", Obj::Inst(Instance::new(person)));
    let err = binding.to_json(&Obj::Inst(inst)).unwrap_err();
    match err {
        Error::CustomHandler { path, message } => {
            assert_eq!(path, "$.person");
            assert_eq!(message, "boom");
        }
        other => panic!("expected custom handler error, got {other:?}"),
    }
}

#[test]
fn test_handler_applies_to_subclasses() {
    let mut registry = TypeRegistry::new();
    let base = registry.declare("Base");
    registry.add_field(base, FieldDef::new("name", TypeRef::string()));
    let sub = registry.declare("Sub");
    registry.set_superclass(sub, TypeRef::Class(base));
    let config = BindingConfig::new().with_serializer(base, UpperCaseNameSerializer);
    let binding = JsonBinding::with_config(registry, config);

    let inst = Instance::new(sub);
    inst.set("name", Obj::from("sub"));
    assert_eq!(
        binding.to_json(&Obj::Inst(inst)).unwrap(),
        r#"{"name":"SUB"}"#
    );
}

#[test]
fn test_custom_deserializer_with_default_escape_hatch() {
    struct EnvelopeDeserializer(jsonbind::ClassId);

    impl CustomDeserializer for EnvelopeDeserializer {
        fn deserialize(
            &self,
            value: &JsonValue,
            ctx: &mut DeserializationContext<'_>,
        ) -> jsonbind::Result<Obj> {
            let data = value
                .as_object()
                .and_then(|obj| obj.get("data"))
                .ok_or_else(|| Error::custom("missing data envelope"))?;
            ctx.deserialize_default(data, &TypeRef::Class(self.0))
        }
    }

    let (registry, person) = person_registry();
    let config = BindingConfig::new().with_deserializer(person, EnvelopeDeserializer(person));
    let binding = JsonBinding::with_config(registry, config);

    let back = binding
        .from_json(
            r#"{"v":1,"data":{"name":"Alice","age":30}}"#,
            &TypeRef::Class(person),
        )
        .unwrap();
    let inst = back.as_instance().unwrap();
    assert_eq!(inst.get("name"), Some(Obj::from("Alice")));
    assert_eq!(inst.get("age"), Some(Obj::Int(30)));
}

#[test]
fn test_date_field_formats() {
    use chrono::TimeZone;

    let mut registry = TypeRegistry::new();
    let event = registry.declare("Event");
    registry.add_field(event, FieldDef::new("at", TypeRef::date()));
    registry.add_field(
        event,
        FieldDef::new("day", TypeRef::date()).with_date_format("%Y-%m-%d %H:%M"),
    );
    let binding = JsonBinding::new(registry);

    let when = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let inst = Instance::new(event);
    inst.set("at", Obj::Date(when));
    inst.set("day", Obj::Date(when));

    let json = binding.to_json(&Obj::Inst(inst)).unwrap();
    assert_eq!(
        json,
        r#"{"at":"2024-03-01T12:30:00+00:00","day":"2024-03-01 12:30"}"#
    );

    let back = binding.from_json(&json, &TypeRef::Class(event)).unwrap();
    let inst = back.as_instance().unwrap();
    assert_eq!(inst.get("at"), Some(Obj::Date(when)));
    assert_eq!(inst.get("day"), Some(Obj::Date(when)));
}

#[test]
fn test_typed_list_and_map_targets() {
    let binding = JsonBinding::new(TypeRegistry::new());

    let list = binding
        .from_json("[1,2,3]", &TypeRef::list(TypeRef::i64()))
        .unwrap();
    assert_eq!(list, Obj::List(vec![Obj::Int(1), Obj::Int(2), Obj::Int(3)]));

    let map = binding
        .from_json(r#"{"a":true}"#, &TypeRef::map(TypeRef::boolean()))
        .unwrap();
    match map {
        Obj::Map(entries) => assert_eq!(entries.get("a"), Some(&Obj::Bool(true))),
        other => panic!("expected map, got {other:?}"),
    }

    let err = binding
        .from_json("[1,\"x\"]", &TypeRef::list(TypeRef::i64()))
        .unwrap_err();
    match err {
        Error::Structure { path, .. } => assert_eq!(path, "$[1]"),
        other => panic!("expected structure error, got {other:?}"),
    }
}

#[test]
fn test_non_numeric_string_for_numeric_target() {
    let (registry, person) = person_registry();
    let binding = JsonBinding::new(registry);

    // Quoted numerals are accepted; anything else is a shape mismatch
    // reported at the offending property.
    let err = binding
        .from_json(
            r#"{"name":"Alice","age":"thirty"}"#,
            &TypeRef::Class(person),
        )
        .unwrap_err();
    match err {
        Error::Structure { path, found, .. } => {
            assert_eq!(path, "$.age");
            assert_eq!(found, "string");
        }
        other => panic!("expected structure error, got {other:?}"),
    }

    let err = binding
        .from_json(r#"["1.5","nope"]"#, &TypeRef::list(TypeRef::decimal()))
        .unwrap_err();
    match err {
        Error::Structure { path, .. } => assert_eq!(path, "$[1]"),
        other => panic!("expected structure error, got {other:?}"),
    }
}

#[test]
fn test_pretty_output() {
    let binding = JsonBinding::new(TypeRegistry::new());
    let value = binding.from_json(r#"{"a":[1]}"#, &TypeRef::Any).unwrap();
    assert_eq!(
        binding.to_json_pretty(&value).unwrap(),
        "{\n  \"a\": [\n    1\n  ]\n}"
    );
}

#[test]
fn test_to_value_and_from_value() {
    let (registry, person) = person_registry();
    let binding = JsonBinding::new(registry);

    let inst = Instance::new(person);
    inst.set("name", Obj::from("Alice"));
    inst.set("age", Obj::from(30));

    let tree = binding.to_value(&Obj::Inst(inst.clone())).unwrap();
    let back = binding.from_value(&tree, &TypeRef::Class(person)).unwrap();
    assert_eq!(back, Obj::Inst(inst));
}
