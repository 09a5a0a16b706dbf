//! Custom handlers: replace the default output of one class and wrap the
//! default output of another.
//!
//! Run with: cargo run --example custom_serializer

use jsonbind::{
    BindingConfig, CustomSerializer, FieldDef, Instance, JsonBinding, JsonGenerator, Obj,
    SerializationContext, TypeRef, TypeRegistry,
};

/// Emits a money instance as a single "amount currency" string.
struct MoneyAsString;

impl CustomSerializer for MoneyAsString {
    fn serialize(
        &self,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
        _ctx: &mut SerializationContext<'_>,
    ) -> jsonbind::Result<()> {
        let inst = obj
            .as_instance()
            .ok_or_else(|| jsonbind::Error::custom("expected an instance"))?;
        let amount = inst.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
        let currency = inst
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        gen.write_string(&format!("{amount} {currency}"))
    }
}

/// Wraps the default object output in a metadata envelope.
struct Enveloped;

impl CustomSerializer for Enveloped {
    fn serialize(
        &self,
        obj: &Obj,
        gen: &mut dyn JsonGenerator,
        ctx: &mut SerializationContext<'_>,
    ) -> jsonbind::Result<()> {
        gen.write_start_object()?;
        gen.write_key("type")?;
        gen.write_string("invoice")?;
        gen.write_key("body")?;
        ctx.serialize_default(obj, gen)?;
        gen.write_end_object()
    }
}

fn main() -> jsonbind::Result<()> {
    let mut registry = TypeRegistry::new();
    let money = registry.declare("Money");
    registry.add_field(money, FieldDef::new("amount", TypeRef::i64()));
    registry.add_field(money, FieldDef::new("currency", TypeRef::string()));
    let invoice = registry.declare("Invoice");
    registry.add_field(invoice, FieldDef::new("id", TypeRef::string()));
    registry.add_field(invoice, FieldDef::new("total", TypeRef::Class(money)));

    let config = BindingConfig::new()
        .with_serializer(money, MoneyAsString)
        .with_serializer(invoice, Enveloped);
    let binding = JsonBinding::with_config(registry, config);

    let total = Instance::new(money);
    total.set("amount", Obj::from(1250));
    total.set("currency", Obj::from("CZK"));
    let inv = Instance::new(invoice);
    inv.set("id", Obj::from("2024-0001"));
    inv.set("total", Obj::Inst(total));

    println!("{}", binding.to_json(&Obj::Inst(inv))?);
    // {"type":"invoice","body":{"id":"2024-0001","total":"1250 CZK"}}
    Ok(())
}
