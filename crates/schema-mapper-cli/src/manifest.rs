//! TOML model manifest.
//!
//! The manifest declares the same model a program would build through
//! [`EntityStore`]: named enums, classes with properties, inheritance,
//! generic labels, discriminator families and controller operations.
//! Loading runs in two passes so classes can refer to each other in any
//! order.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use schema_mapper::{
    ClassId, EntityStore, Error, GenericArg, GenericOf, HttpVerb, Info, JsonParameter,
    JsonSchema, JsonSchemaOptions, MethodEntity, ParamLocation, SchemaStore, Type,
};
use schemars::{JsonSchema as Schema, schema_for};
use serde::Deserialize;

/// Top-level manifest, usually `schema-mapper.toml`.
#[derive(Debug, Default, Deserialize, Schema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "schema-mapper manifest")]
pub struct Manifest {
    /// Document metadata used by `schema-mapper spec`.
    #[serde(default)]
    pub info: Info,

    /// Default generation options. Command-line flags override them.
    #[serde(default)]
    pub options: JsonSchemaOptions,

    /// Named enums. Properties typed with an enum name get its values inline.
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumDef>,

    /// Model and controller classes.
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Deserialize, Schema)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize, Schema)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ClassDef {
    pub name: String,

    /// Parent class; its properties are inherited, the child's win.
    pub extends: Option<String>,

    /// Generic labels (`T`, `S`, ...) usable as property types.
    #[serde(default)]
    pub generics: Vec<String>,

    pub description: Option<String>,

    /// Names added to the `required` list.
    #[serde(default)]
    pub required: Vec<String>,

    /// Property that tells the subclasses of this class apart.
    pub discriminator_key: Option<String>,

    /// Tag of this class within its parent's discriminator family.
    pub discriminator_value: Option<String>,

    /// Base path; makes the class a controller.
    pub controller: Option<String>,

    #[serde(default)]
    pub properties: IndexMap<String, PropertyDef>,

    #[serde(default)]
    pub operations: Vec<OperationDef>,
}

/// A typed schema node: a property, an item, a parameter or a return value.
#[derive(Debug, Clone, Default, Deserialize, Schema)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PropertyDef {
    /// A primitive (`string`, `number`, `integer`, `boolean`, `date`, `any`,
    /// `object`), a collection (`array`, `set`, `map`), a class, an enum, or
    /// a generic label of the owning class.
    #[serde(rename = "type")]
    pub ty: String,

    /// Item type of a collection.
    pub items: Option<String>,

    /// Bindings for the generic labels of the class in `type` (or `items`),
    /// one list per nesting level.
    #[serde(default)]
    pub generic_of: Vec<Vec<String>>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub nullable: bool,

    /// Values accepted outside the declared type.
    #[serde(default)]
    pub allow: Vec<serde_json::Value>,

    /// Accept `null`; TOML has no null literal to put in `allow`. The
    /// property becomes nullable but stays required.
    #[serde(default)]
    pub allow_null: bool,

    pub description: Option<String>,

    /// Emitted name when aliases are enabled.
    pub name: Option<String>,

    /// Serialization groups; `!group` excludes.
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub write_only: bool,

    /// Additional JSON Schema keywords (`minLength`, `format`, `x-*`, ...).
    #[serde(default)]
    pub keywords: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Schema)]
#[serde(deny_unknown_fields)]
pub struct OperationDef {
    pub name: String,
    pub verb: HttpVerb,
    #[serde(default = "root_path")]
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub returns: Option<PropertyDef>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize, Schema)]
#[serde(deny_unknown_fields)]
pub struct ParameterDef {
    #[serde(rename = "in")]
    pub location: ParamLocation,

    /// Parameter name. A query parameter without a name binds the whole
    /// query string to its schema.
    pub name: Option<String>,

    /// Defaults to true for path parameters, false otherwise.
    pub required: Option<bool>,

    pub description: Option<String>,

    pub schema: PropertyDef,
}

/// JSON Schema of the manifest format.
pub fn schema() -> serde_json::Value {
    serde_json::to_value(schema_for!(Manifest)).unwrap_or_default()
}

/// Read and parse a manifest file.
pub fn load(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: Manifest = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        classes = manifest.classes.len(),
        enums = manifest.enums.len(),
        "manifest loaded"
    );
    Ok(manifest)
}

fn decoration(decorator: &'static str, message: String) -> anyhow::Error {
    Error::Decoration { decorator, message }.into()
}

/// Name lookups for the second pass.
struct Names<'m> {
    classes: HashMap<&'m str, ClassId>,
    enums: HashMap<&'m str, &'m EnumDef>,
}

impl Names<'_> {
    fn generic_arg(&self, name: &str, labels: &[String]) -> Result<GenericArg> {
        if labels.iter().any(|label| label == name) {
            return Ok(Type::Generic(name.to_string()).into());
        }
        Ok(self.type_schema(name, labels)?.into())
    }

    fn type_schema(&self, name: &str, labels: &[String]) -> Result<JsonSchema> {
        if labels.iter().any(|label| label == name) {
            return Ok(JsonSchema::generic(name));
        }
        if let Some(id) = self.classes.get(name) {
            return Ok(JsonSchema::class(*id));
        }
        if let Some(def) = self.enums.get(name) {
            return Ok(JsonSchema::enumeration(def.values.iter().cloned()));
        }
        match Type::parse(name) {
            Type::Generic(_) => Err(decoration(
                "Property",
                format!("unknown type `{name}`"),
            )),
            ty => Ok(JsonSchema::of(ty)),
        }
    }

    fn generic_of(&self, levels: &[Vec<String>], labels: &[String]) -> Result<Option<GenericOf>> {
        let mut generic_of: Option<GenericOf> = None;
        for level in levels {
            let args = level
                .iter()
                .map(|name| self.generic_arg(name, labels))
                .collect::<Result<Vec<_>>>()?;
            generic_of = Some(match generic_of {
                None => GenericOf::new(args),
                Some(outer) => outer.nested(args),
            });
        }
        Ok(generic_of)
    }

    fn schema(&self, owner: &str, field: &str, def: &PropertyDef, labels: &[String]) -> Result<JsonSchema> {
        let generic_of = self.generic_of(&def.generic_of, labels)?;
        let mut schema = self.type_schema(&def.ty, labels)?;
        match (schema.is_collection(), &def.items) {
            (true, Some(items)) => {
                let mut item = self.type_schema(items, labels)?;
                if let Some(generic_of) = generic_of {
                    item = item.generic_of(generic_of);
                }
                schema = schema.items(item);
            }
            (true, None) => {
                return Err(decoration(
                    "CollectionOf",
                    format!(
                        "`{owner}.{field}` has collection type `{}` but declares no item type",
                        def.ty
                    ),
                ));
            }
            (false, Some(_)) => {
                return Err(decoration(
                    "CollectionOf",
                    format!("`{owner}.{field}`: `items` requires an array, set or map type"),
                ));
            }
            (false, None) => {
                if let Some(generic_of) = generic_of {
                    schema = schema.generic_of(generic_of);
                }
            }
        }

        if let Some(description) = &def.description {
            schema = schema.description(description);
        }
        if let Some(alias) = &def.name {
            schema = schema.name(alias);
        }
        if !def.groups.is_empty() {
            schema = schema.groups(def.groups.iter().cloned());
        }
        if !def.allow.is_empty() {
            schema = schema.allow(def.allow.iter().cloned());
        }
        if def.allow_null {
            schema = schema.allow([serde_json::Value::Null]);
        }
        if def.read_only {
            schema = schema.read_only(true);
        }
        if def.write_only {
            schema = schema.write_only(true);
        }
        for (key, value) in &def.keywords {
            schema = schema
                .with(key, value.clone())
                .with_context(|| format!("`{owner}.{field}`"))?;
        }
        Ok(schema.nullable(def.nullable).required(def.required))
    }

    fn method(&self, owner: &ClassDef, def: &OperationDef) -> Result<MethodEntity> {
        let labels = &owner.generics;
        let mut method = MethodEntity::new(&def.name).route(def.verb, &def.path);
        if let Some(summary) = &def.summary {
            method = method.summary(summary);
        }
        if let Some(description) = &def.description {
            method = method.description(description);
        }
        if let Some(returns) = &def.returns {
            let field = format!("{}()", def.name);
            method = method.returns(self.schema(&owner.name, &field, returns, labels)?);
        }
        for param in &def.parameters {
            let label = param
                .name
                .clone()
                .unwrap_or_else(|| param.location.to_string());
            let field = format!("{}({label})", def.name);
            let schema = self.schema(&owner.name, &field, &param.schema, labels)?;
            let mut parameter = JsonParameter::new(param.location, param.name.clone(), schema);
            if let Some(required) = param.required {
                parameter = parameter.required(required);
            }
            if let Some(description) = &param.description {
                parameter = parameter.description(description);
            }
            method = method.parameter(parameter);
        }
        Ok(method)
    }
}

impl Manifest {
    /// Declare every class on a fresh [`EntityStore`] and freeze it.
    pub fn build(&self) -> Result<SchemaStore> {
        let mut store = EntityStore::new();
        let ids: Vec<ClassId> = self
            .classes
            .iter()
            .map(|class| store.class(&class.name))
            .collect();
        let names = Names {
            classes: self
                .classes
                .iter()
                .zip(&ids)
                .map(|(class, id)| (class.name.as_str(), *id))
                .collect(),
            enums: self
                .enums
                .iter()
                .map(|def| (def.name.as_str(), def))
                .collect(),
        };

        for (def, id) in self.classes.iter().zip(ids) {
            declare(&mut store, id, def, &names)?;
        }
        Ok(store.freeze()?)
    }
}

fn declare(store: &mut EntityStore, id: ClassId, def: &ClassDef, names: &Names<'_>) -> Result<()> {
    let parent = match &def.extends {
        Some(parent) => Some(*names.classes.get(parent.as_str()).ok_or_else(|| {
            decoration(
                "Extends",
                format!("`{}` extends unknown class `{parent}`", def.name),
            )
        })?),
        None => None,
    };

    let mut properties = Vec::with_capacity(def.properties.len());
    for (field, prop) in &def.properties {
        properties.push((field, names.schema(&def.name, field, prop, &def.generics)?));
    }
    let mut methods = Vec::with_capacity(def.operations.len());
    for operation in &def.operations {
        methods.push(names.method(def, operation)?);
    }

    let entity = store.class_mut(id)?;
    if let Some(parent) = parent {
        entity.extends(parent);
    }
    if !def.generics.is_empty() {
        entity.generics(def.generics.iter().cloned());
    }
    if let Some(description) = &def.description {
        entity.configure(|schema| schema.description(description));
    }
    for (field, schema) in properties {
        entity.property(field.as_str(), schema);
    }
    if !def.required.is_empty() {
        entity.required_fields(def.required.iter().cloned());
    }
    if let Some(key) = &def.discriminator_key {
        entity.discriminator_key(key.as_str());
    }
    if let Some(value) = &def.discriminator_value {
        entity.discriminator_value(value.as_str());
    }
    if let Some(path) = &def.controller {
        entity.controller(path.as_str());
    }
    for method in methods {
        entity.method(method);
    }
    Ok(())
}
