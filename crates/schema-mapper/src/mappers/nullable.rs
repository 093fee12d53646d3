use serde_json::{Map, Value};

use crate::error::Result;
use crate::registry::{MapperArgs, MapperContext};

const COMPOSITIONS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

fn null_type() -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::from("null"));
    Value::Object(map)
}

/// Null as part of the type: `type: [t, "null"]`, or
/// `anyOf: [{type: null}, schema]` for references and compositions.
/// JSON Schema, OpenAPI 3.1 and AsyncAPI.
fn type_union(mut map: Map<String, Value>) -> Value {
    let wrap = map.contains_key("$ref")
        || COMPOSITIONS.iter().any(|key| map.contains_key(*key))
        || !map.contains_key("type");
    if wrap {
        let mut union = Map::new();
        union.insert(
            "anyOf".to_string(),
            Value::Array(vec![null_type(), Value::Object(map)]),
        );
        return Value::Object(union);
    }

    let null = Value::from("null");
    match map.get("type").cloned() {
        Some(Value::Array(mut types)) => {
            if !types.contains(&null) {
                types.push(null);
            }
            map.insert("type".to_string(), Value::Array(types));
        }
        Some(Value::String(name)) if name != "null" => {
            map.insert("type".to_string(), Value::Array(vec![Value::String(name), null]));
        }
        _ => {}
    }
    if let Some(Value::Array(values)) = map.get_mut("enum")
        && !values.contains(&Value::Null)
    {
        values.push(Value::Null);
    }
    Value::Object(map)
}

fn refine(args: MapperArgs<'_>, f: impl FnOnce(Map<String, Value>) -> Value) -> Result<Value> {
    let (value, node) = args.refine("nullable")?;
    match value {
        Value::Object(map) if node.is_nullable() => Ok(f(map)),
        other => Ok(other),
    }
}

pub(crate) fn type_union_mapper(args: MapperArgs<'_>, _: &mut MapperContext<'_>) -> Result<Value> {
    refine(args, type_union)
}

/// OpenAPI 3.0 has no null type: a `nullable: true` sidecar, with references
/// wrapped in `allOf` so the sidecar is not a `$ref` sibling. OpenAPI 3.1
/// follows JSON Schema.
pub(crate) fn openapi_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    if !ctx.options().is_openapi_30() {
        return refine(args, type_union);
    }
    refine(args, |mut map| {
        if map.contains_key("$ref") {
            let mut wrapper = Map::new();
            wrapper.insert("nullable".to_string(), Value::Bool(true));
            wrapper.insert("allOf".to_string(), Value::Array(vec![Value::Object(map)]));
            return Value::Object(wrapper);
        }
        map.insert("nullable".to_string(), Value::Bool(true));
        Value::Object(map)
    })
}

/// Swagger 2 only knows the `x-nullable` vendor extension.
pub(crate) fn swagger_mapper(args: MapperArgs<'_>, _: &mut MapperContext<'_>) -> Result<Value> {
    refine(args, |mut map| {
        map.insert("x-nullable".to_string(), Value::Bool(true));
        Value::Object(map)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::options::{JsonSchemaOptions, SpecType};
    use crate::schema::JsonSchema;
    use crate::store::EntityStore;

    fn map(schema: &JsonSchema, options: &JsonSchemaOptions) -> anyhow::Result<serde_json::Value> {
        Ok(EntityStore::new().freeze()?.get_json_schema_of(schema, options)?)
    }

    #[test]
    fn json_uses_type_union() -> anyhow::Result<()> {
        let schema = JsonSchema::string().nullable(true);
        assert_eq!(
            map(&schema, &JsonSchemaOptions::default())?,
            json!({"type": ["string", "null"]})
        );
        Ok(())
    }

    #[test]
    fn enums_accept_null() -> anyhow::Result<()> {
        let schema = JsonSchema::enumeration(["a", "b"]).nullable(true);
        assert_eq!(
            map(&schema, &JsonSchemaOptions::default())?,
            json!({"type": ["string", "null"], "enum": ["a", "b", null]})
        );
        Ok(())
    }

    #[test]
    fn untyped_nodes_are_wrapped() -> anyhow::Result<()> {
        let schema = JsonSchema::new()
            .one_of(vec![JsonSchema::string(), JsonSchema::number().minimum(1)])
            .nullable(true);
        assert_eq!(
            map(&schema, &JsonSchemaOptions::default())?,
            json!({"anyOf": [
                {"type": "null"},
                {"oneOf": [{"type": "string"}, {"type": "number", "minimum": 1}]}
            ]})
        );
        Ok(())
    }

    #[test]
    fn swagger_uses_vendor_extension() -> anyhow::Result<()> {
        let schema = JsonSchema::number().nullable(true);
        assert_eq!(
            map(&schema, &JsonSchemaOptions::new(SpecType::Swagger))?,
            json!({"type": "number", "x-nullable": true})
        );
        Ok(())
    }

    #[test]
    fn allow_null_is_nullable() -> anyhow::Result<()> {
        let schema = JsonSchema::string().allow([serde_json::Value::Null]);
        assert_eq!(
            map(&schema, &JsonSchemaOptions::new(SpecType::OpenApi))?,
            json!({"type": "string", "nullable": true})
        );
        Ok(())
    }
}
