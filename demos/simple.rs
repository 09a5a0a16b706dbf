//! Basic round trip: declare a class, serialize an instance, read it back.
//!
//! Run with: cargo run --example simple

use jsonbind::{FieldDef, Instance, JsonBinding, Obj, TypeRef, TypeRegistry};

fn main() -> jsonbind::Result<()> {
    let mut registry = TypeRegistry::new();
    let person = registry.declare("Person");
    registry.add_field(person, FieldDef::new("name", TypeRef::string()));
    registry.add_field(person, FieldDef::new("age", TypeRef::i64()));
    registry.add_field(
        person,
        FieldDef::new("tags", TypeRef::list(TypeRef::string())),
    );

    let binding = JsonBinding::new(registry);

    let alice = Instance::new(person);
    alice.set("name", Obj::from("Alice"));
    alice.set("age", Obj::from(30));
    alice.set(
        "tags",
        Obj::List(vec![Obj::from("admin"), Obj::from("ops")]),
    );

    let json = binding.to_json(&Obj::Inst(alice.clone()))?;
    println!("serialized: {json}");
    println!("pretty:\n{}", binding.to_json_pretty(&Obj::Inst(alice))?);

    let back = binding.from_json(&json, &TypeRef::Class(person))?;
    let inst = back.as_instance().expect("instance");
    println!("name back: {:?}", inst.get("name"));
    println!("age back:  {:?}", inst.get("age"));
    Ok(())
}
