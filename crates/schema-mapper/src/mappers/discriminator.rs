use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::refs::{create_ref, ref_name, register_class};
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::schema::{ClassId, Discriminator, JsonSchema, Keyword};

/// A reference to a discriminator base: `oneOf` of the member components.
pub(crate) fn discriminator_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("discriminator")?;
    let id = node.target().ok_or(Error::UnexpectedArguments {
        mapper: "discriminator",
        expected: "a class-typed schema node",
    })?;
    let class = ctx.store().class(id)?;
    let Some(discriminator) = class.discriminator() else {
        return register_class(id, ctx);
    };

    let mut members = Vec::with_capacity(discriminator.mapping.len());
    for child in discriminator.mapping.values() {
        let reference = register_class(*child, ctx)?;
        if !members.contains(&reference) {
            members.push(reference);
        }
    }
    let mut union = Map::new();
    union.insert("oneOf".to_string(), Value::Array(members));
    exec_mapper(
        "discriminatorMapping",
        MapperArgs::Refine(Value::Object(union), node),
        ctx,
    )
}

/// The family behind a `oneOf`, and the members it lists when it was
/// spelled out rather than derived from a base class.
fn family<'s>(
    node: &'s JsonSchema,
    ctx: &MapperContext<'s>,
) -> Option<(&'s Discriminator, Option<Vec<ClassId>>)> {
    let store = ctx.store();
    if let Some(id) = node.target()
        && let Ok(class) = store.class(id)
        && let Some(discriminator) = class.discriminator()
    {
        return Some((discriminator, None));
    }
    if let Some(Keyword::Schemas(members)) = node.get("oneOf") {
        let ids: Option<Vec<ClassId>> = members.iter().map(JsonSchema::target).collect();
        if let Some(ids) = ids
            && let Some((first, rest)) = ids.split_first()
            && let Some(discriminator) = store.family_of(*first)
            && rest
                .iter()
                .all(|id| store.family_of(*id) == Some(discriminator))
        {
            return Some((discriminator, Some(ids)));
        }
    }
    node.get_discriminator().map(|discriminator| (discriminator, None))
}

fn refine(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>, with_mapping: bool) -> Result<Value> {
    let (mut value, node) = args.refine("discriminatorMapping")?;
    let Some(map) = value.as_object_mut() else {
        return Ok(value);
    };
    if !map.contains_key("oneOf") {
        return Ok(value);
    }
    let store = ctx.store();
    let options = ctx.options();
    let Some((discriminator, listed)) = family(node, ctx) else {
        return Ok(value);
    };

    let mut object = Map::new();
    object.insert(
        "propertyName".to_string(),
        Value::String(discriminator.property_name.clone()),
    );
    if with_mapping {
        let mut mapping = Map::new();
        for (tag, child) in &discriminator.mapping {
            if listed.as_ref().is_some_and(|ids| !ids.contains(child)) {
                continue;
            }
            let name = ref_name(store.class(*child)?.name(), options);
            if let Some(reference) = create_ref(&name, options).get("$ref") {
                mapping.insert(tag.clone(), reference.clone());
            }
        }
        object.insert("mapping".to_string(), Value::Object(mapping));
    }
    map.insert("discriminator".to_string(), Value::Object(object));

    let key = Value::String(discriminator.property_name.clone());
    let mut required = match map.remove("required") {
        Some(Value::Array(existing)) => existing,
        _ => Vec::new(),
    };
    if !required.contains(&key) {
        required.push(key);
    }
    map.insert("required".to_string(), Value::Array(required));
    Ok(value)
}

/// `discriminator: {propertyName}` (JSON Schema, Swagger).
pub(crate) fn property_name_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    refine(args, ctx, false)
}

/// `discriminator: {propertyName, mapping}` (OpenAPI, AsyncAPI).
pub(crate) fn mapping_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    refine(args, ctx, true)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::options::{JsonSchemaOptions, SpecType};
    use crate::schema::JsonSchema;
    use crate::store::EntityStore;

    fn events() -> anyhow::Result<(crate::SchemaStore, crate::ClassId)> {
        let mut store = EntityStore::new();
        let event = store.class("Event");
        let page_view = store.class("PageView");
        let action = store.class("Action");
        let tracker = store.class("Tracker");
        store
            .class_mut(event)?
            .discriminator_key("type")
            .property("type", JsonSchema::string())
            .property("url", JsonSchema::string());
        store
            .class_mut(page_view)?
            .extends(event)
            .discriminator_value("page_view");
        store
            .class_mut(action)?
            .extends(event)
            .discriminator_value("action")
            .property("event", JsonSchema::string());
        store
            .class_mut(tracker)?
            .property("events", JsonSchema::array_of(event));
        Ok((store.freeze()?, tracker))
    }

    #[test]
    fn json_emits_property_name_only() -> anyhow::Result<()> {
        let (store, tracker) = events()?;
        let schema = store.get_json_schema(tracker, &JsonSchemaOptions::default())?;
        assert_eq!(
            schema["properties"]["events"]["items"],
            json!({
                "oneOf": [{"$ref": "#/definitions/PageView"}, {"$ref": "#/definitions/Action"}],
                "discriminator": {"propertyName": "type"},
                "required": ["type"]
            })
        );
        assert_eq!(
            schema["definitions"]["PageView"],
            json!({
                "type": "object",
                "properties": {
                    "type": {"type": "string", "enum": ["page_view"]},
                    "url": {"type": "string"}
                },
                "required": ["type"]
            })
        );
        Ok(())
    }

    #[test]
    fn openapi_adds_mapping() -> anyhow::Result<()> {
        let (store, tracker) = events()?;
        let schema = store.get_json_schema(tracker, &JsonSchemaOptions::new(SpecType::OpenApi))?;
        assert_eq!(
            schema["properties"]["events"]["items"]["discriminator"],
            json!({
                "propertyName": "type",
                "mapping": {
                    "page_view": "#/components/schemas/PageView",
                    "action": "#/components/schemas/Action"
                }
            })
        );
        Ok(())
    }

    #[test]
    fn spelled_out_one_of_over_one_family() -> anyhow::Result<()> {
        let (store, _) = events()?;
        let page_view = store.find_class("PageView").expect("PageView");
        let action = store.find_class("Action").expect("Action");
        let options = JsonSchemaOptions::new(SpecType::OpenApi);

        let mixed = JsonSchema::new().one_of(vec![JsonSchema::class(page_view), JsonSchema::string()]);
        assert!(store.get_json_schema_of(&mixed, &options)?.get("discriminator").is_none());

        let family = JsonSchema::new().one_of(vec![JsonSchema::class(action), JsonSchema::class(page_view)]);
        let mapped = store.get_json_schema_of(&family, &options)?;
        assert_eq!(mapped["required"], json!(["type"]));
        assert_eq!(
            mapped["discriminator"]["mapping"],
            json!({
                "page_view": "#/components/schemas/PageView",
                "action": "#/components/schemas/Action"
            })
        );
        Ok(())
    }
}
