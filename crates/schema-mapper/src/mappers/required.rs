use indexmap::IndexSet;
use serde_json::Value;

use super::property_key;
use crate::error::Result;
use crate::registry::{MapperArgs, MapperContext};

/// Add the `required` list: declared required names plus properties marked
/// required themselves, under their emitted names and restricted to the
/// properties actually emitted. Omitted when empty.
pub(crate) fn required_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let (mut value, node) = args.refine("required")?;
    let Some(map) = value.as_object_mut() else {
        return Ok(value);
    };
    let options = ctx.options();

    let mut names: IndexSet<String> = IndexSet::new();
    for name in node.required_names() {
        let key = match node.get_property(name) {
            Some(prop) => property_key(name, prop, options),
            None => name.clone(),
        };
        names.insert(key);
    }
    for (name, prop) in node.properties().into_iter().flatten() {
        if prop.is_required() && prop.matches_groups(options.active_groups()) {
            names.insert(property_key(name, prop, options));
        }
    }

    if let Some(Value::Object(emitted)) = map.get("properties") {
        names.retain(|name| emitted.contains_key(name));
    }
    if names.is_empty() {
        return Ok(value);
    }

    let mut required: Vec<Value> = match map.remove("required") {
        Some(Value::Array(existing)) => existing,
        _ => Vec::new(),
    };
    for name in names {
        let name = Value::String(name);
        if !required.contains(&name) {
            required.push(name);
        }
    }
    map.insert("required".to_string(), Value::Array(required));
    Ok(value)
}
