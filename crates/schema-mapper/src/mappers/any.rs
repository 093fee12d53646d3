use serde_json::{Map, Value};

use super::schema::map_keywords;
use crate::error::Result;
use crate::merge::merge_schema;
use crate::refs::with_access_sidecars;
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::schema::JsonSchema;

/// Entry point for any node: generic placeholders resolve through the
/// active bindings, class-typed nodes become references, everything else is
/// mapped inline.
pub(crate) fn any_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("any")?;
    if let Some(label) = node.generic_type() {
        return map_placeholder(label, node, ctx);
    }
    if node.is_class() {
        let reference = exec_mapper("class", MapperArgs::Schema(node), ctx)?;
        return exec_mapper("next", MapperArgs::Refine(reference, node), ctx);
    }
    exec_mapper("schema", MapperArgs::Schema(node), ctx)
}

/// Map a nested node: items, properties, composition members.
pub(crate) fn item_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let node = args.schema("item")?;
    ctx.nested(|ctx| exec_mapper("any", MapperArgs::Schema(node), ctx))
}

/// Layer the local keywords of a class-typed node over its reference.
pub(crate) fn next_mapper(args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let (reference, node) = args.refine("next")?;
    let local = map_keywords(node, ctx, &["type", "readOnly", "writeOnly"])?;
    let merged = merge_schema(&reference, &Value::Object(local));
    let merged = with_access_sidecars(merged, node);
    exec_mapper("nullable", MapperArgs::Refine(merged, node), ctx)
}

/// Resolve a placeholder such as `T` against the active bindings.
///
/// An unbound label maps to `{}`: this is what a generic base definition
/// shows for its own placeholders.
fn map_placeholder(label: &str, node: &JsonSchema, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let Some(binding) = ctx.generics().get(label).cloned() else {
        tracing::trace!(label, "generic placeholder without binding");
        return Ok(Value::Object(Map::new()));
    };

    let schema = &binding.schema;
    let resolved = ctx.with_generics(binding.nested.clone(), |ctx| {
        if schema.is_class() && !ctx.generics().is_empty() {
            let reference = exec_mapper("generics", MapperArgs::Schema(schema), ctx)?;
            exec_mapper("next", MapperArgs::Refine(reference, schema), ctx)
        } else {
            exec_mapper("item", MapperArgs::Schema(schema), ctx)
        }
    })?;

    let local = map_keywords(node, ctx, &["type"])?;
    let merged = merge_schema(&resolved, &Value::Object(local));
    exec_mapper("nullable", MapperArgs::Refine(merged, node), ctx)
}
