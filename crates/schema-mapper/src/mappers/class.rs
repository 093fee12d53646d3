use serde_json::Value;

use crate::error::{Error, Result};
use crate::generics::GenericsMap;
use crate::refs::register_class;
use crate::registry::{MapperArgs, MapperContext, exec_mapper};

/// Reference to the class a node points at.
///
/// Discriminator bases become a `oneOf` of their members, generic
/// instantiations an `allOf` of the base reference and the bound
/// properties, and every other class a plain `$ref`.
pub(crate) fn class_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("class")?;
    let id = node.target().ok_or(Error::UnexpectedArguments {
        mapper: "class",
        expected: "a class-typed schema node",
    })?;
    let class = ctx.store().class(id)?;

    if class.discriminator().is_some() {
        return exec_mapper("discriminator", MapperArgs::Schema(node), ctx);
    }
    if let Some(generic_of) = node.get_generic_of() {
        let bindings = GenericsMap::resolve(
            ctx.store(),
            class.generic_labels(),
            generic_of,
            ctx.generics(),
        )?;
        if bindings.only_placeholders() {
            return register_class(id, ctx);
        }
        return ctx.with_generics(bindings, |ctx| {
            exec_mapper("generics", MapperArgs::Schema(node), ctx)
        });
    }
    register_class(id, ctx)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::options::{JsonSchemaOptions, SpecType};
    use crate::schema::JsonSchema;
    use crate::store::EntityStore;

    #[test]
    fn self_reference_resolves_to_own_ref() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let category = store.class("Category");
        store
            .class_mut(category)?
            .property("name", JsonSchema::string())
            .property("parent", JsonSchema::class(category))
            .property("children", JsonSchema::array_of(category));
        let store = store.freeze()?;

        let schema =
            store.get_json_schema_of(&JsonSchema::class(category), &JsonSchemaOptions::default())?;
        assert_eq!(
            schema,
            json!({
                "$ref": "#/definitions/Category",
                "definitions": {
                    "Category": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "parent": {"$ref": "#/definitions/Category"},
                            "children": {"type": "array", "items": {"$ref": "#/definitions/Category"}}
                        }
                    }
                }
            })
        );
        Ok(())
    }

    #[test]
    fn local_keywords_wrap_the_reference() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let product = store.class("Product");
        let order = store.class("Order");
        store.class_mut(order)?.property(
            "product",
            JsonSchema::class(product).description("Ordered product").read_only(true),
        );
        let store = store.freeze()?;

        let schema = store.get_json_schema(order, &JsonSchemaOptions::new(SpecType::OpenApi))?;
        assert_eq!(
            schema["properties"]["product"],
            json!({
                "allOf": [
                    {"$ref": "#/components/schemas/Product"},
                    {"description": "Ordered product"}
                ],
                "readOnly": true
            })
        );
        Ok(())
    }

    #[test]
    fn nullable_reference_per_spec_version() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let product = store.class("Product");
        let order = store.class("Order");
        store
            .class_mut(order)?
            .property("product", JsonSchema::class(product).nullable(true));
        let store = store.freeze()?;

        let v30 = store.get_json_schema(order, &JsonSchemaOptions::new(SpecType::OpenApi))?;
        assert_eq!(
            v30["properties"]["product"],
            json!({"nullable": true, "allOf": [{"$ref": "#/components/schemas/Product"}]})
        );

        let v31 = store.get_json_schema(
            order,
            &JsonSchemaOptions::new(SpecType::OpenApi).with_spec_version("3.1.0"),
        )?;
        assert_eq!(
            v31["properties"]["product"],
            json!({"anyOf": [{"type": "null"}, {"$ref": "#/components/schemas/Product"}]})
        );
        Ok(())
    }

    #[test]
    fn group_specific_component_names() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let user = store.class("User");
        let team = store.class("Team");
        store
            .class_mut(user)?
            .property("id", JsonSchema::string())
            .property("password", JsonSchema::string().groups(["creation"]));
        store.class_mut(team)?.property("owner", JsonSchema::class(user));
        let store = store.freeze()?;

        let read =
            store.get_json_schema(team, &JsonSchemaOptions::default().with_groups(["read"]))?;
        assert_eq!(read["properties"]["owner"], json!({"$ref": "#/definitions/UserRead"}));
        assert_eq!(
            read["definitions"]["UserRead"],
            json!({"type": "object", "properties": {"id": {"type": "string"}}})
        );

        let creation =
            store.get_json_schema(team, &JsonSchemaOptions::default().with_groups(["creation"]))?;
        assert!(creation["definitions"]["UserCreation"]["properties"]
            .get("password")
            .is_some());
        Ok(())
    }
}
