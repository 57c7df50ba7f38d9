//! JSON export of a resolved compilation unit, with sorted keys.
//!
//! The shape is described by `schema/aidl-unit-schema.json`.

use crate::ast::{
    Annotatable, Annotation, Argument, ConstantDeclaration, ConstantType, ConstantValue, DefinedType,
    Import, Method, TypeSpecifier, VariableDeclaration,
};
use crate::diagnostics::{Locatable, Reporter};
use crate::error::Fatal;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const FORMAT_NAME: &str = "aidl-unit";
pub const FORMAT_VERSION: &str = "1.0";

/// Serialize `defined` and its imports. Every type specifier must already
/// be resolved; an unresolved one is an internal error.
pub fn serialize_unit(
    defined: &DefinedType,
    imports: &[Import],
    reporter: &mut Reporter,
) -> Result<Value, Fatal> {
    let mut unit = Map::new();
    unit.insert("format".to_owned(), json!(FORMAT_NAME));
    unit.insert(
        "imports".to_owned(),
        Value::Array(imports.iter().map(serialize_import).collect()),
    );
    unit.insert("type".to_owned(), serialize_defined(defined, reporter)?);
    unit.insert("version".to_owned(), json!(FORMAT_VERSION));
    Ok(Value::Object(unit))
}

fn serialize_annotations(set: &BTreeSet<Annotation>) -> Value {
    Value::Array(set.iter().map(|a| json!(a.name())).collect())
}

fn serialize_defined(t: &DefinedType, reporter: &mut Reporter) -> Result<Value, Fatal> {
    let mut m = Map::new();
    m.insert("annotations".to_owned(), serialize_annotations(t.annotations()));
    m.insert("canonical_name".to_owned(), json!(t.canonical_name()));
    m.insert("comments".to_owned(), json!(t.comments()));
    m.insert("kind".to_owned(), json!(t.preprocess_declaration_name()));
    m.insert("name".to_owned(), json!(t.name()));
    m.insert("package".to_owned(), json!(t.package()));
    match t {
        DefinedType::Parcelable(p) => {
            m.insert("cpp_header".to_owned(), json!(p.cpp_header()));
        }
        DefinedType::StructuredParcelable(s) => {
            let fields = s
                .fields()
                .iter()
                .map(|f| serialize_field(f, reporter))
                .collect::<Result<Vec<_>, _>>()?;
            m.insert("fields".to_owned(), Value::Array(fields));
        }
        DefinedType::Interface(i) => {
            let constants = i
                .constants()
                .iter()
                .map(|c| serialize_constant(c, reporter))
                .collect::<Result<Vec<_>, _>>()?;
            let methods = i
                .methods()
                .iter()
                .map(|mth| serialize_method(mth, reporter))
                .collect::<Result<Vec<_>, _>>()?;
            m.insert("constants".to_owned(), Value::Array(constants));
            m.insert("methods".to_owned(), Value::Array(methods));
            m.insert("oneway".to_owned(), json!(i.is_oneway()));
        }
    }
    Ok(Value::Object(m))
}

fn serialize_type(spec: &TypeSpecifier, reporter: &mut Reporter) -> Result<Value, Fatal> {
    let name = match spec.resolved_name() {
        Some(n) => n,
        None => {
            return Err(reporter.fatal(
                spec.location(),
                format!("cannot serialize unresolved type '{}'", spec),
            ))
        }
    };
    let parameters = spec
        .type_parameters()
        .iter()
        .map(|p| serialize_type(p, reporter))
        .collect::<Result<Vec<_>, _>>()?;

    let mut m = Map::new();
    m.insert("annotations".to_owned(), serialize_annotations(spec.annotations()));
    m.insert("array".to_owned(), json!(spec.is_array()));
    m.insert("name".to_owned(), json!(name));
    if spec.is_generic() {
        m.insert("parameters".to_owned(), Value::Array(parameters));
    }
    Ok(Value::Object(m))
}

fn serialize_value(v: &ConstantValue) -> Value {
    match v.value_type() {
        ConstantType::Integer => json!({ "kind": "int", "value": v.as_integer() }),
        ConstantType::String => json!({ "kind": "string", "value": v.as_str() }),
        ConstantType::Error => json!({ "kind": "error" }),
    }
}

fn serialize_field(f: &VariableDeclaration, reporter: &mut Reporter) -> Result<Value, Fatal> {
    let mut m = Map::new();
    if let Some(v) = f.default_value() {
        m.insert("default".to_owned(), serialize_value(v));
    }
    m.insert("name".to_owned(), json!(f.name()));
    m.insert("type".to_owned(), serialize_type(f.type_spec(), reporter)?);
    Ok(Value::Object(m))
}

fn serialize_constant(c: &ConstantDeclaration, reporter: &mut Reporter) -> Result<Value, Fatal> {
    Ok(json!({
        "name": c.name(),
        "type": serialize_type(c.type_spec(), reporter)?,
        "value": serialize_value(c.value()),
    }))
}

fn serialize_argument(a: &Argument, reporter: &mut Reporter) -> Result<Value, Fatal> {
    Ok(json!({
        "direction": a.direction().keyword(),
        "name": a.name(),
        "type": serialize_type(a.type_spec(), reporter)?,
    }))
}

fn serialize_method(m: &Method, reporter: &mut Reporter) -> Result<Value, Fatal> {
    let arguments = m
        .arguments()
        .iter()
        .map(|a| serialize_argument(a, reporter))
        .collect::<Result<Vec<_>, _>>()?;
    let mut o = Map::new();
    o.insert("arguments".to_owned(), Value::Array(arguments));
    o.insert("comments".to_owned(), json!(m.comments()));
    if let Some(id) = m.id() {
        o.insert("id".to_owned(), json!(id));
    }
    o.insert("name".to_owned(), json!(m.name()));
    o.insert("oneway".to_owned(), json!(m.is_oneway()));
    o.insert("return_type".to_owned(), serialize_type(m.type_spec(), reporter)?);
    Ok(Value::Object(o))
}

fn serialize_import(i: &Import) -> Value {
    let types: Vec<String> = i
        .document()
        .map(|d| d.defined_types().iter().map(|t| t.canonical_name()).collect())
        .unwrap_or_default();
    json!({
        "filename": i.filename().map(|p| p.display().to_string()),
        "needed_class": i.needed_class(),
        "types": types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Context, Driver};
    use crate::source::InMemoryProvider;
    use std::path::Path;

    fn parse_only(src: &str, resolve: bool) -> (DefinedType, Context) {
        let mut p = InMemoryProvider::default();
        p.insert("IFoo.aidl", src);
        let mut ctx = Context::with_reporter(Reporter::silent());
        let mut d = Driver::new(&p);
        d.parse_file(Path::new("IFoo.aidl"), &mut ctx).unwrap();
        if resolve {
            d.resolve(&mut ctx).unwrap();
        }
        let t = d.take_document().unwrap().release_defined_type().unwrap();
        (t, ctx)
    }

    #[test]
    fn interface_shape() {
        let (t, mut ctx) = parse_only(
            "package a; interface IFoo { const int K = 0x10; @nullable List<String> f(inout int[] x) = 7; }",
            true,
        );
        let v = serialize_unit(&t, &[], &mut ctx.reporter).unwrap();
        assert_eq!(v["format"], "aidl-unit");
        assert_eq!(v["type"]["canonical_name"], "a.IFoo");
        assert_eq!(v["type"]["kind"], "interface");
        assert_eq!(v["type"]["constants"][0]["value"]["value"], 16);
        let m = &v["type"]["methods"][0];
        assert_eq!(m["id"], 7);
        assert_eq!(m["return_type"]["name"], "List");
        assert_eq!(m["return_type"]["annotations"][0], "nullable");
        assert_eq!(m["return_type"]["parameters"][0]["name"], "String");
        assert_eq!(m["arguments"][0]["direction"], "inout");
        assert_eq!(m["arguments"][0]["type"]["array"], true);
    }

    #[test]
    fn unresolved_type_is_fatal() {
        let (t, mut ctx) = parse_only("interface IFoo { void f(in Missing m); }", false);
        let err = serialize_unit(&t, &[], &mut ctx.reporter).unwrap_err();
        assert!(err.message.contains("unresolved type 'Missing'"));
    }
}
