use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use super::{ClassEntity, unknown_class};
use crate::error::Result;
use crate::options::{JsonSchemaOptions, SpecType};
use crate::registry::{MapperArgs, MapperContext, MapperRegistry, exec_mapper};
use crate::schema::{ClassId, Discriminator, JsonSchema};

type CacheKey = (ClassId, String);

/// The frozen model. Generates documents; never changes.
#[derive(Debug)]
pub struct SchemaStore {
    classes: Vec<ClassEntity>,
    registry: MapperRegistry,
    cache: Mutex<HashMap<CacheKey, Value>>,
}

impl SchemaStore {
    pub(super) fn new(classes: Vec<ClassEntity>, registry: MapperRegistry) -> Self {
        Self {
            classes,
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn class(&self, id: ClassId) -> Result<&ClassEntity> {
        self.classes.get(id.index()).ok_or_else(|| unknown_class(id))
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|class| class.name() == name)
            .map(ClassId)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassEntity)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, class)| (ClassId(index), class))
    }

    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    /// The discriminator family `id` is a tagged member of, if any.
    pub fn family_of(&self, id: ClassId) -> Option<&Discriminator> {
        let mut current = self.class(id).ok()?.parent();
        while let Some(parent) = current {
            let class = self.class(parent).ok()?;
            if let Some(discriminator) = class.discriminator()
                && discriminator.mapping.values().any(|member| *member == id)
            {
                return Some(discriminator);
            }
            current = class.parent();
        }
        None
    }

    /// JSON Schema of a class, with every referenced class collected under
    /// `definitions` (JSON, Swagger) or `components.schemas` (OpenAPI,
    /// AsyncAPI).
    ///
    /// Results are memoized per class and per serialized `options`.
    pub fn get_json_schema(&self, id: ClassId, options: &JsonSchemaOptions) -> Result<Value> {
        let key = (id, serde_json::to_string(options)?);
        if let Some(hit) = self.cache().get(&key) {
            tracing::debug!(class = id.index(), "json schema served from cache");
            return Ok(hit.clone());
        }

        let class = self.class(id)?;
        tracing::debug!(class = class.name(), spec = %options.spec_type, "generating json schema");
        let value = self.generate(class.schema(), options)?;
        self.cache().insert(key, value.clone());
        Ok(value)
    }

    /// JSON Schema of an arbitrary node, e.g. `array_of(Product)`. Not
    /// memoized.
    pub fn get_json_schema_of(&self, schema: &JsonSchema, options: &JsonSchemaOptions) -> Result<Value> {
        self.generate(schema, options)
    }

    fn generate(&self, schema: &JsonSchema, options: &JsonSchemaOptions) -> Result<Value> {
        let mut ctx = MapperContext::new(self, options);
        let body = exec_mapper("any", MapperArgs::Schema(schema), &mut ctx)?;
        let components = ctx.into_components();
        if components.is_empty() {
            return Ok(body);
        }

        let mut document = match body {
            Value::Object(map) => map,
            other => Map::from_iter([("allOf".to_string(), Value::Array(vec![other]))]),
        };
        let components: Map<String, Value> = components.into_iter().collect();
        if matches!(options.spec_type, SpecType::Json | SpecType::Swagger) {
            document.insert("definitions".to_string(), Value::Object(components));
        } else {
            let mut wrapper = Map::new();
            wrapper.insert("schemas".to_string(), Value::Object(components));
            document.insert("components".to_string(), Value::Object(wrapper));
        }
        Ok(Value::Object(document))
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, Value>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::options::{JsonSchemaOptions, SpecType};
    use crate::schema::JsonSchema;
    use crate::store::EntityStore;

    #[test]
    fn store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<super::SchemaStore>();
    }

    #[test]
    fn root_class_is_inlined_with_definitions() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let order = store.class("Order");
        let product = store.class("Product");
        store
            .class_mut(product)?
            .property("title", JsonSchema::string());
        store
            .class_mut(order)?
            .property("product", JsonSchema::class(product));
        let store = store.freeze()?;

        let schema = store.get_json_schema(order, &JsonSchemaOptions::default())?;
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {"product": {"$ref": "#/definitions/Product"}},
                "definitions": {
                    "Product": {"type": "object", "properties": {"title": {"type": "string"}}}
                }
            })
        );
        Ok(())
    }

    #[test]
    fn openapi_components_live_under_components() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let order = store.class("Order");
        let product = store.class("Product");
        store
            .class_mut(order)?
            .property("product", JsonSchema::class(product));
        let store = store.freeze()?;

        let schema = store.get_json_schema(order, &JsonSchemaOptions::new(SpecType::OpenApi))?;
        assert_eq!(
            schema["properties"]["product"],
            json!({"$ref": "#/components/schemas/Product"})
        );
        assert_eq!(
            schema["components"]["schemas"]["Product"],
            json!({"type": "object"})
        );
        Ok(())
    }

    #[test]
    fn family_lookup_walks_ancestors() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let event = store.class("Event");
        let click = store.class("Click");
        let other = store.class("Other");
        store.class_mut(event)?.discriminator_key("type");
        store.class_mut(click)?.extends(event).discriminator_value("click");
        let store = store.freeze()?;

        assert!(store.family_of(click).is_some());
        assert!(store.family_of(other).is_none());
        assert!(store.family_of(event).is_none());
        Ok(())
    }
}
