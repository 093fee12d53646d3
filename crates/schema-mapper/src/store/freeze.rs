use std::collections::HashSet;

use indexmap::IndexMap;

use super::{ClassEntity, unknown_class};
use crate::error::{Error, Result};
use crate::generics::{GenericArg, validate_generic_of};
use crate::schema::{ClassId, Discriminator, JsonSchema, Keyword, Type};

pub(super) fn freeze(mut classes: Vec<ClassEntity>) -> Result<Vec<ClassEntity>> {
    check_names(&classes)?;
    for class in &classes {
        for schema in class_schemas(class) {
            walk(schema, &mut |node| check_ids(node, classes.len()))?;
        }
        if let Some(parent) = class.parent()
            && parent.index() >= classes.len()
        {
            return Err(unknown_class(parent));
        }
    }

    let chains = (0..classes.len())
        .map(|index| ancestor_chain(&classes, ClassId(index)))
        .collect::<Result<Vec<_>>>()?;
    let flattened: Vec<JsonSchema> = chains
        .iter()
        .map(|chain| flatten(&classes, chain))
        .collect();
    for (class, schema) in classes.iter_mut().zip(flattened) {
        class.set_schema(schema);
    }

    build_families(&mut classes, &chains)?;

    for class in &classes {
        for schema in class_schemas(class) {
            walk(schema, &mut |node| check_binding(node, &classes))?;
        }
    }
    Ok(classes)
}

fn check_names(classes: &[ClassEntity]) -> Result<()> {
    let mut seen = HashSet::new();
    for class in classes {
        if !seen.insert(class.name()) {
            return Err(Error::decoration(
                "Class",
                format!("class `{}` is declared more than once", class.name()),
            ));
        }
    }
    Ok(())
}

fn class_schemas(class: &ClassEntity) -> impl Iterator<Item = &JsonSchema> {
    core::iter::once(class.schema()).chain(class.methods().iter().flat_map(|m| m.schemas()))
}

/// Visit `schema` and every nested node reachable from it.
fn walk(schema: &JsonSchema, f: &mut impl FnMut(&JsonSchema) -> Result<()>) -> Result<()> {
    f(schema)?;
    if let Some(item) = schema.item_schema() {
        walk(item, f)?;
    }
    for keyword in schema.keywords().values() {
        match keyword {
            Keyword::Schema(nested) => walk(nested, f)?,
            Keyword::Schemas(list) => {
                for nested in list {
                    walk(nested, f)?;
                }
            }
            Keyword::Properties(props) => {
                for nested in props.values() {
                    walk(nested, f)?;
                }
            }
            Keyword::Value(_) => {}
        }
    }
    if let Some(generic_of) = schema.get_generic_of() {
        for arg in generic_of.levels().iter().flatten() {
            if let GenericArg::Schema(nested) = arg {
                walk(nested, f)?;
            }
        }
    }
    Ok(())
}

fn check_ids(node: &JsonSchema, len: usize) -> Result<()> {
    if let Some(id) = node.target()
        && id.index() >= len
    {
        return Err(unknown_class(id));
    }
    if let Some(generic_of) = node.get_generic_of() {
        for arg in generic_of.levels().iter().flatten() {
            if let GenericArg::Type(Type::Class(id)) = arg
                && id.index() >= len
            {
                return Err(unknown_class(*id));
            }
        }
    }
    Ok(())
}

fn check_binding(node: &JsonSchema, classes: &[ClassEntity]) -> Result<()> {
    if let (Some(id), Some(generic_of)) = (node.target(), node.get_generic_of()) {
        let class = &classes[id.index()];
        validate_generic_of(class.name(), class.generic_labels(), generic_of)?;
    }
    Ok(())
}

/// Ancestors of `id`, root first, ending with `id` itself.
fn ancestor_chain(classes: &[ClassEntity], id: ClassId) -> Result<Vec<ClassId>> {
    let mut chain = vec![id];
    let mut current = classes[id.index()].parent();
    while let Some(parent) = current {
        if chain.contains(&parent) {
            return Err(Error::decoration(
                "Extends",
                format!(
                    "inheritance cycle through `{}`",
                    classes[parent.index()].name()
                ),
            ));
        }
        chain.push(parent);
        current = classes[parent.index()].parent();
    }
    chain.reverse();
    Ok(chain)
}

/// Combine the declared schemas of a chain. Properties keep the order in
/// which ancestors declared them; a redeclared property takes the child's
/// schema. `required` lists are unioned.
fn flatten(classes: &[ClassEntity], chain: &[ClassId]) -> JsonSchema {
    let mut resolved = JsonSchema::object();
    let mut props: IndexMap<String, JsonSchema> = IndexMap::new();
    for id in chain {
        let own = classes[id.index()].schema();
        if let Some(own_props) = own.properties() {
            for (name, prop) in own_props {
                props.insert(name.clone(), prop.clone());
            }
        }
        resolved.assign(own);
    }
    if !props.is_empty() {
        *resolved.properties_mut() = props;
    }
    resolved
}

fn build_families(classes: &mut [ClassEntity], chains: &[Vec<ClassId>]) -> Result<()> {
    let mut families: IndexMap<ClassId, Vec<(String, ClassId)>> = IndexMap::new();
    for (index, chain) in chains.iter().enumerate() {
        let class = &classes[index];
        let Some(value) = class.get_discriminator_value() else {
            continue;
        };
        let base = chain
            .iter()
            .rev()
            .skip(1)
            .find(|id| classes[id.index()].get_discriminator_key().is_some());
        let Some(base) = base else {
            return Err(Error::decoration(
                "DiscriminatorValue",
                format!(
                    "class `{}` declares discriminator value `{value}` but no ancestor declares a discriminator key",
                    class.name()
                ),
            ));
        };
        families
            .entry(*base)
            .or_default()
            .push((value.to_string(), ClassId(index)));
    }

    for (base, members) in families {
        let Some(key) = classes[base.index()]
            .get_discriminator_key()
            .map(String::from)
        else {
            continue;
        };
        let mut discriminator = Discriminator::new(key.clone());
        for (value, child) in members {
            let schema = classes[child.index()].schema_mut();
            let mut pinned = schema.get_property(&key).cloned().unwrap_or_default();
            pinned.remove_keyword("enum");
            let pinned = pinned.type_of(Type::String).enum_values([value.clone()]);
            schema.properties_mut().insert(key.clone(), pinned);
            schema.add_required([key.clone()]);
            discriminator.mapping.insert(value, child);
        }
        let schema = classes[base.index()].schema_mut();
        schema.add_required([key]);
        schema.set_discriminator(discriminator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::generics::GenericOf;
    use crate::schema::{JsonSchema, Type};
    use crate::store::EntityStore;

    #[test]
    fn inheritance_is_flattened_child_wins() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let base = store.class("Base");
        let child = store.class("Child");
        store
            .class_mut(base)?
            .property("id", JsonSchema::string())
            .property("label", JsonSchema::string())
            .required_fields(["id"]);
        store
            .class_mut(child)?
            .extends(base)
            .property("label", JsonSchema::string().min_length(3))
            .property("extra", JsonSchema::number())
            .required_fields(["extra"]);

        let store = store.freeze()?;
        let schema = store.class(child)?.schema();
        let names: Vec<&String> = schema.properties().expect("properties").keys().collect();
        assert_eq!(names, ["id", "label", "extra"]);
        assert_eq!(
            schema.get_property("label").and_then(|p| p.get_value("minLength")),
            Some(&json!(3))
        );
        assert_eq!(schema.required_names().len(), 2);
        Ok(())
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut store = EntityStore::new();
        store.class("Model");
        store.class("Model");
        let err = store.freeze().expect_err("duplicate names");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_inheritance_cycles() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let a = store.class("A");
        let b = store.class("B");
        store.class_mut(a)?.extends(b);
        store.class_mut(b)?.extends(a);
        let err = store.freeze().expect_err("cycle");
        assert!(err.to_string().contains("cycle"));
        Ok(())
    }

    #[test]
    fn rejects_binding_on_non_generic_class() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let plain = store.class("Plain");
        let holder = store.class("Holder");
        store.class_mut(holder)?.property(
            "value",
            JsonSchema::class(plain).generic_of(GenericOf::new([Type::Number])),
        );
        let err = store.freeze().expect_err("invalid binding");
        assert!(err.to_string().contains("declares no generic labels"));
        Ok(())
    }

    #[test]
    fn rejects_value_without_key() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let base = store.class("Event");
        let child = store.class("PageView");
        store.class_mut(child)?.extends(base).discriminator_value("page_view");
        let err = store.freeze().expect_err("missing key");
        assert!(err.to_string().contains("no ancestor declares a discriminator key"));
        Ok(())
    }

    #[test]
    fn rejects_unknown_ids_from_another_store() -> anyhow::Result<()> {
        let mut other = EntityStore::new();
        other.class("A");
        let foreign = other.class("B");

        let mut store = EntityStore::new();
        let model = store.class("Model");
        store
            .class_mut(model)?
            .property("other", JsonSchema::class(foreign));
        let err = store.freeze().expect_err("unknown id");
        assert!(err.to_string().contains("unknown class"));
        Ok(())
    }

    #[test]
    fn families_pin_the_key() -> anyhow::Result<()> {
        let mut store = EntityStore::new();
        let event = store.class("Event");
        let page_view = store.class("PageView");
        store
            .class_mut(event)?
            .discriminator_key("type")
            .property("type", JsonSchema::string());
        store
            .class_mut(page_view)?
            .extends(event)
            .discriminator_value("page_view");

        let store = store.freeze()?;
        let discriminator = store
            .class(event)?
            .discriminator()
            .expect("family on base");
        assert_eq!(discriminator.mapping.get("page_view"), Some(&page_view));

        let child = store.class(page_view)?.schema();
        let key = child.get_property("type").expect("pinned key");
        assert_eq!(key.get_value("enum"), Some(&json!(["page_view"])));
        assert!(child.required_names().contains("type"));
        assert!(store.class(page_view)?.discriminator().is_none());
        Ok(())
    }
}
