use serde_json::{Map, Value};

use crate::error::Result;
use crate::options::JsonSchemaOptions;
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::schema::{CollectionKind, JsonSchema, Keyword};

/// Emitted name of a property: its alias when aliases are enabled.
pub(crate) fn property_key(name: &str, prop: &JsonSchema, options: &JsonSchemaOptions) -> String {
    match prop.alias() {
        Some(alias) if options.use_alias => alias.to_string(),
        _ => name.to_string(),
    }
}

/// Map the keywords of `node`, except `skip`, recursing into nested schemas.
pub(crate) fn map_keywords(
    node: &JsonSchema,
    ctx: &mut MapperContext<'_>,
    skip: &[&str],
) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for (key, keyword) in node.keywords() {
        if skip.contains(&key.as_str()) {
            continue;
        }
        let value = match keyword {
            Keyword::Value(value) => value.clone(),
            Keyword::Schema(nested) => exec_mapper("item", MapperArgs::Schema(nested), ctx)?,
            Keyword::Schemas(list) => {
                let mut members = Vec::with_capacity(list.len());
                for member in list {
                    members.push(exec_mapper("item", MapperArgs::Schema(member), ctx)?);
                }
                Value::Array(members)
            }
            Keyword::Properties(_) => exec_mapper("properties", MapperArgs::Schema(node), ctx)?,
        };
        out.insert(key.clone(), value);
    }
    if ctx.options().custom_keys {
        for (key, value) in node.vendors() {
            out.insert(key.clone(), value.clone());
        }
    }
    Ok(out)
}

/// Inline body of a node: type, collection items, keywords, then the
/// `required`, `discriminatorMapping` and `nullable` refinements.
pub(crate) fn schema_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("schema")?;
    let mut out = Map::new();
    if let Some(json_type) = node.json_type() {
        out.insert("type".to_string(), json_type.clone());
    }
    if let (Some(kind), Some(item)) = (node.collection(), node.item_schema()) {
        let mapped = exec_mapper("item", MapperArgs::Schema(item), ctx)?;
        match kind {
            CollectionKind::Array => {
                out.insert("items".to_string(), mapped);
            }
            CollectionKind::Set => {
                out.insert("uniqueItems".to_string(), Value::Bool(true));
                out.insert("items".to_string(), mapped);
            }
            CollectionKind::Map => {
                out.insert("additionalProperties".to_string(), mapped);
            }
        }
    }
    out.extend(map_keywords(node, ctx, &["type"])?);

    let value = exec_mapper("required", MapperArgs::Refine(Value::Object(out), node), ctx)?;
    let value = exec_mapper("discriminatorMapping", MapperArgs::Refine(value, node), ctx)?;
    exec_mapper("nullable", MapperArgs::Refine(value, node), ctx)
}

/// The `properties` object of a node, filtered by the active groups.
pub(crate) fn properties_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("properties")?;
    let options = ctx.options();
    let mut out = Map::new();
    for (name, prop) in node.properties().into_iter().flatten() {
        if !prop.matches_groups(options.active_groups()) {
            continue;
        }
        let value = exec_mapper("item", MapperArgs::Schema(prop), ctx)?;
        out.insert(property_key(name, prop, options), value);
    }
    Ok(Value::Object(out))
}
