use serde_json::{Map, Value};

use crate::error::Result;
use crate::refs::component_name;
use crate::registry::{MapperArgs, MapperContext};

fn referenced<'c>(schema: &Value, ctx: &'c MapperContext<'_>) -> Option<&'c Value> {
    let reference = schema.get("$ref").and_then(Value::as_str)?;
    let name = component_name(reference, ctx.options())?;
    ctx.components().get(name)
}

/// A property needs `deepObject` serialization when it refers to an object
/// component; enums are plain query values.
fn is_deep_object(schema: &Value, ctx: &MapperContext<'_>) -> bool {
    referenced(schema, ctx).is_some_and(|component| component.get("enum").is_none())
}

/// One query parameter per property of the component referenced by
/// `parameter`.
fn explode(parameter: &Map<String, Value>, component: &Value, ctx: &MapperContext<'_>) -> Vec<Value> {
    let Some(Value::Object(properties)) = component.get("properties") else {
        return vec![Value::Object(parameter.clone())];
    };
    let required: Vec<&str> = component
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, schema)| {
            let mut schema = schema.clone();
            let description = schema.as_object_mut().and_then(|map| map.remove("description"));

            let mut exploded = Map::new();
            exploded.insert("in".to_string(), Value::from("query"));
            exploded.insert("name".to_string(), Value::from(name.as_str()));
            exploded.insert(
                "required".to_string(),
                Value::Bool(required.contains(&name.as_str())),
            );
            if let Some(description) = description {
                exploded.insert("description".to_string(), description);
            }
            if is_deep_object(&schema, ctx) {
                exploded.insert("style".to_string(), Value::from("deepObject"));
            }
            exploded.insert("schema".to_string(), schema);
            Value::Object(exploded)
        })
        .collect()
}

fn query_parameters(args: MapperArgs<'_>, ctx: &MapperContext<'_>) -> Result<Vec<Value>> {
    let (value, parameter) = args.parameter("operationInQuery")?;
    let Value::Object(mut map) = value else {
        return Ok(vec![value]);
    };
    let Some(schema) = map.get("schema").cloned() else {
        return Ok(vec![Value::Object(map)]);
    };

    if parameter.expression().is_none()
        && let Some(component) = referenced(&schema, ctx)
    {
        return Ok(explode(&map, component, ctx));
    }
    if is_deep_object(&schema, ctx) {
        map.insert("style".to_string(), Value::from("deepObject"));
    }
    Ok(vec![Value::Object(map)])
}

/// Query parameters for OpenAPI: a model bound to the whole query string is
/// exploded into one parameter per property, object references use
/// `style: deepObject`.
pub(crate) fn in_query_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    Ok(Value::Array(query_parameters(args, ctx)?))
}

/// Swagger 2 query parameters carry their schema keywords inline.
pub(crate) fn swagger_in_query_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let parameters = query_parameters(args, ctx)?
        .into_iter()
        .map(flatten_schema)
        .collect();
    Ok(Value::Array(parameters))
}

/// Move the keywords of an inline `schema` onto the parameter itself.
pub(crate) fn flatten_schema(parameter: Value) -> Value {
    let Value::Object(mut map) = parameter else {
        return parameter;
    };
    if let Some(Value::Object(schema)) = map.get("schema")
        && !schema.contains_key("$ref")
    {
        let schema = schema.clone();
        map.remove("schema");
        for (key, value) in schema {
            map.entry(key).or_insert(value);
        }
    }
    Value::Object(map)
}
