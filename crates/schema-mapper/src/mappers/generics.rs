use serde_json::{Map, Value};

use super::property_key;
use crate::error::{Error, Result};
use crate::refs::register_class;
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::store::ClassEntity;

/// Instantiate a generic class under the active bindings.
///
/// The class body is registered once with its placeholders unresolved; the
/// use site gets `allOf: [$ref, {properties}]` holding only the properties
/// that depend on a label. A property whose label has no binding is left to
/// the base definition and logged, or fails the call with `strict_generics`.
/// An instantiation that reaches itself again, as in `Tree<T>` holding
/// `Tree<T>[]`, refers back to the base definition.
pub(crate) fn generics_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("generics")?;
    let id = node.target().ok_or(Error::UnexpectedArguments {
        mapper: "generics",
        expected: "a class-typed schema node",
    })?;
    let class = ctx.store().class(id)?;
    let base = register_class(id, ctx)?;
    if ctx.is_instantiating(id) {
        tracing::debug!(class = class.name(), "recursive generic instantiation");
        return Ok(base);
    }
    ctx.instantiating(id, |ctx| instantiate(class, base, ctx))
}

fn instantiate(class: &ClassEntity, base: Value, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let options = ctx.options();

    let mut overrides = Map::new();
    for (name, prop) in class.schema().properties().into_iter().flatten() {
        if !prop.matches_groups(options.active_groups()) {
            continue;
        }
        let labels = prop.generic_labels_in_use();
        if labels.is_empty() {
            continue;
        }
        if let Some(unbound) = labels.iter().find(|label| !ctx.generics().contains(label)) {
            if options.strict_generics {
                return Err(Error::UnboundGeneric {
                    class: class.name().to_string(),
                    label: unbound.clone(),
                });
            }
            tracing::warn!(
                class = class.name(),
                property = %name,
                label = %unbound,
                "generic label has no binding; keeping the base definition"
            );
            continue;
        }

        match exec_mapper("item", MapperArgs::Schema(prop), ctx) {
            Ok(value) => {
                overrides.insert(property_key(name, prop, options), value);
            }
            Err(err) if !options.strict_generics => {
                tracing::warn!(
                    class = class.name(),
                    property = %name,
                    error = %err,
                    "failed to resolve generic property; keeping the base definition"
                );
            }
            Err(err) => return Err(err),
        }
    }

    if overrides.is_empty() {
        return Ok(base);
    }
    let mut fragment = Map::new();
    fragment.insert("properties".to_string(), Value::Object(overrides));
    let mut instance = Map::new();
    instance.insert(
        "allOf".to_string(),
        Value::Array(vec![base, Value::Object(fragment)]),
    );
    Ok(Value::Object(instance))
}
