//! Named, spec-scoped mappers and the context they share.
//!
//! Every concern of the output document (nullability, generics, required
//! lists, discriminators, query parameters) is a plain function registered
//! under a name. [`exec_mapper`] looks the name up for the active
//! [`SpecType`], falling back to the unscoped registration, so a target only
//! overrides what differs for it.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::generics::GenericsMap;
use crate::options::{JsonSchemaOptions, SpecType};
use crate::schema::{ClassId, JsonSchema};
use crate::store::{JsonParameter, SchemaStore};

/// A mapper turns one schema concern into plain JSON.
pub type Mapper = fn(MapperArgs<'_>, &mut MapperContext<'_>) -> Result<Value>;

/// Arguments a mapper can be invoked with.
#[derive(Debug, Clone)]
pub enum MapperArgs<'s> {
    /// Map a schema node from scratch.
    Schema(&'s JsonSchema),
    /// Refine already mapped output of the node.
    Refine(Value, &'s JsonSchema),
    /// Refine a mapped parameter object.
    Parameter(Value, &'s JsonParameter),
}

impl<'s> MapperArgs<'s> {
    pub fn schema(self, mapper: &'static str) -> Result<&'s JsonSchema> {
        match self {
            Self::Schema(schema) => Ok(schema),
            _ => Err(Error::UnexpectedArguments {
                mapper,
                expected: "a schema node",
            }),
        }
    }

    pub fn refine(self, mapper: &'static str) -> Result<(Value, &'s JsonSchema)> {
        match self {
            Self::Refine(value, schema) => Ok((value, schema)),
            _ => Err(Error::UnexpectedArguments {
                mapper,
                expected: "mapped output and its schema node",
            }),
        }
    }

    pub fn parameter(self, mapper: &'static str) -> Result<(Value, &'s JsonParameter)> {
        match self {
            Self::Parameter(value, parameter) => Ok((value, parameter)),
            _ => Err(Error::UnexpectedArguments {
                mapper,
                expected: "a mapped parameter and its declaration",
            }),
        }
    }
}

/// Mapper table keyed by name, then by spec type (`None` = any).
#[derive(Debug, Clone)]
pub struct MapperRegistry {
    mappers: HashMap<String, HashMap<Option<SpecType>, Mapper>>,
}

impl Default for MapperRegistry {
    /// The built-in mappers.
    fn default() -> Self {
        let mut registry = Self::empty();
        crate::mappers::register_defaults(&mut registry);
        registry
    }
}

impl MapperRegistry {
    pub fn empty() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Register `mapper` under `name`, replacing any previous registration
    /// for the same spec type.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mapper: Mapper,
        spec_type: Option<SpecType>,
    ) -> &mut Self {
        self.mappers
            .entry(name.into())
            .or_default()
            .insert(spec_type, mapper);
        self
    }

    /// The mapper for `name` under `spec_type`, or the unscoped one.
    pub fn get(&self, name: &str, spec_type: SpecType) -> Option<Mapper> {
        let scoped = self.mappers.get(name)?;
        scoped
            .get(&Some(spec_type))
            .or_else(|| scoped.get(&None))
            .copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappers.contains_key(name)
    }
}

/// State of one generation call.
///
/// Collects the named components as a side effect and carries the generic
/// bindings of the instantiation being mapped. A fresh context is created
/// per `get_json_schema` / `get_spec` call, so nothing here is shared.
#[derive(Debug)]
pub struct MapperContext<'a> {
    store: &'a SchemaStore,
    options: &'a JsonSchemaOptions,
    components: IndexMap<String, Value>,
    generics: GenericsMap,
    instantiating: Vec<(ClassId, GenericsMap)>,
    depth: usize,
}

impl<'a> MapperContext<'a> {
    pub fn new(store: &'a SchemaStore, options: &'a JsonSchemaOptions) -> Self {
        Self {
            store,
            options,
            components: IndexMap::new(),
            generics: GenericsMap::new(),
            instantiating: Vec::new(),
            depth: 0,
        }
    }

    pub fn store(&self) -> &'a SchemaStore {
        self.store
    }

    pub fn options(&self) -> &'a JsonSchemaOptions {
        self.options
    }

    pub fn components(&self) -> &IndexMap<String, Value> {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.components
    }

    pub fn into_components(self) -> IndexMap<String, Value> {
        self.components
    }

    pub fn generics(&self) -> &GenericsMap {
        &self.generics
    }

    /// Nesting depth of the node currently being mapped.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `f` with `generics` as the active bindings, restoring the
    /// previous ones afterwards.
    pub fn with_generics<T>(&mut self, generics: GenericsMap, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = core::mem::replace(&mut self.generics, generics);
        let result = f(self);
        self.generics = previous;
        result
    }

    /// Whether `id` is already being instantiated under the active bindings
    /// further up the stack.
    pub fn is_instantiating(&self, id: ClassId) -> bool {
        self.instantiating
            .iter()
            .any(|(class, generics)| *class == id && *generics == self.generics)
    }

    /// Run `f` with `id` marked as instantiated under the active bindings.
    pub fn instantiating<T>(&mut self, id: ClassId, f: impl FnOnce(&mut Self) -> T) -> T {
        self.instantiating.push((id, self.generics.clone()));
        let result = f(self);
        self.instantiating.pop();
        result
    }

    /// Run `f` one level deeper.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Run the mapper registered under `name` for the active spec type.
pub fn exec_mapper(name: &str, args: MapperArgs<'_>, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let spec_type = ctx.options().spec_type;
    let mapper = ctx
        .store()
        .registry()
        .get(name, spec_type)
        .ok_or_else(|| Error::UnknownMapper(name.to_string()))?;
    tracing::trace!(mapper = name, spec = %spec_type, depth = ctx.depth(), "exec mapper");
    mapper(args, ctx)
}
