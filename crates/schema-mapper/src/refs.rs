//! Component naming and `$ref` creation.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::generics::GenericsMap;
use crate::options::JsonSchemaOptions;
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::schema::{ClassId, JsonSchema};

fn pascal_case(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Component name of a class under the active groups: `User`,
/// `UserCreationSummary`, or `User` + `groups_name`. Without active groups
/// the class name is used as is.
pub fn ref_name(class_name: &str, options: &JsonSchemaOptions) -> String {
    let Some(groups) = options.active_groups() else {
        return class_name.to_string();
    };
    if let Some(suffix) = &options.groups_name {
        return format!("{class_name}{suffix}");
    }
    let suffix: String = groups.iter().map(|group| pascal_case(group)).collect();
    format!("{class_name}{suffix}")
}

/// `{"$ref": "<host>/<name>"}` for the active spec type.
pub fn create_ref(name: &str, options: &JsonSchemaOptions) -> Value {
    let mut map = Map::new();
    map.insert(
        "$ref".to_string(),
        Value::String(format!("{}/{name}", options.spec_type.ref_host())),
    );
    Value::Object(map)
}

/// Copy the `readOnly` / `writeOnly` flags of `node` next to a reference.
pub fn with_access_sidecars(mut reference: Value, node: &JsonSchema) -> Value {
    if let Value::Object(map) = &mut reference {
        if node.is_read_only() {
            map.insert("readOnly".to_string(), Value::Bool(true));
        }
        if node.is_write_only() {
            map.insert("writeOnly".to_string(), Value::Bool(true));
        }
    }
    reference
}

/// Register `body` under `name` and return a reference to it.
pub fn to_ref(name: &str, body: Value, ctx: &mut MapperContext<'_>) -> Value {
    ctx.components_mut().insert(name.to_string(), body);
    create_ref(name, ctx.options())
}

/// Strip the ref host of the target document from a `$ref` value.
pub(crate) fn component_name<'v>(reference: &'v str, options: &JsonSchemaOptions) -> Option<&'v str> {
    reference
        .strip_prefix(options.spec_type.ref_host())
        .and_then(|rest| rest.strip_prefix('/'))
}

/// Reference to the component of class `id`, registering its body first if
/// this call has not seen it yet.
///
/// An empty placeholder is inserted before the body is mapped, so a class
/// that refers to itself resolves to its own `$ref` instead of recursing.
/// The body is mapped without the caller's generic bindings.
pub(crate) fn register_class(id: ClassId, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let class = ctx.store().class(id)?;
    let name = ref_name(class.name(), ctx.options());
    if ctx.components().contains_key(&name) {
        return Ok(create_ref(&name, ctx.options()));
    }

    ctx.components_mut()
        .insert(name.clone(), Value::Object(Map::new()));
    tracing::debug!(component = %name, "registering component");
    let body = ctx.with_generics(GenericsMap::new(), |ctx| {
        ctx.nested(|ctx| exec_mapper("schema", MapperArgs::Schema(class.schema()), ctx))
    })?;
    Ok(to_ref(&name, body, ctx))
}
