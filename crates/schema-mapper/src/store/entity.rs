use serde::{Deserialize, Serialize};

use crate::schema::{ClassId, Discriminator, JsonSchema};

/// HTTP method of an operation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// Where a parameter is read from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

/// A method parameter and its schema.
///
/// `expression` is the parameter name in its location. A query parameter
/// without one binds the whole query object, and its referenced model is
/// exploded into one parameter per property.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonParameter {
    location: ParamLocation,
    expression: Option<String>,
    schema: JsonSchema,
    required: bool,
    description: Option<String>,
}

impl JsonParameter {
    pub fn new(location: ParamLocation, expression: Option<String>, schema: JsonSchema) -> Self {
        Self {
            location,
            expression,
            schema,
            required: location == ParamLocation::Path,
            description: None,
        }
    }

    pub fn path(name: impl Into<String>, schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Path, Some(name.into()), schema.into())
    }

    pub fn query(name: impl Into<String>, schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Query, Some(name.into()), schema.into())
    }

    /// A query parameter bound to the whole query string.
    pub fn query_object(schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Query, None, schema.into())
    }

    pub fn header(name: impl Into<String>, schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Header, Some(name.into()), schema.into())
    }

    pub fn cookie(name: impl Into<String>, schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Cookie, Some(name.into()), schema.into())
    }

    pub fn body(schema: impl Into<JsonSchema>) -> Self {
        Self::new(ParamLocation::Body, None, schema.into())
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(&self) -> ParamLocation {
        self.location
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Verb and path of an operation, relative to the controller path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub verb: HttpVerb,
    pub path: String,
}

/// A controller method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodEntity {
    name: String,
    route: Option<Route>,
    parameters: Vec<JsonParameter>,
    returns: Option<JsonSchema>,
    summary: Option<String>,
    description: Option<String>,
}

impl MethodEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: None,
            parameters: Vec::new(),
            returns: None,
            summary: None,
            description: None,
        }
    }

    #[must_use]
    pub fn route(mut self, verb: HttpVerb, path: impl Into<String>) -> Self {
        self.route = Some(Route {
            verb,
            path: path.into(),
        });
        self
    }

    #[must_use]
    pub fn parameter(mut self, parameter: JsonParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn returns(mut self, schema: impl Into<JsonSchema>) -> Self {
        self.returns = Some(schema.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn parameters(&self) -> &[JsonParameter] {
        &self.parameters
    }

    pub fn get_returns(&self) -> Option<&JsonSchema> {
        self.returns.as_ref()
    }

    pub fn get_summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn schemas(&self) -> impl Iterator<Item = &JsonSchema> {
        self.parameters
            .iter()
            .map(JsonParameter::schema)
            .chain(self.returns.as_ref())
    }
}

/// A model or controller class.
///
/// While the store is being built, `schema` holds only what the class itself
/// declares. [`EntityStore::freeze`](crate::EntityStore::freeze) replaces it
/// with the flattened schema including every ancestor.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntity {
    name: String,
    parent: Option<ClassId>,
    schema: JsonSchema,
    discriminator_key: Option<String>,
    discriminator_value: Option<String>,
    path: Option<String>,
    methods: Vec<MethodEntity>,
}

impl ClassEntity {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            schema: JsonSchema::object(),
            discriminator_key: None,
            discriminator_value: None,
            path: None,
            methods: Vec::new(),
        }
    }

    pub fn extends(&mut self, parent: ClassId) -> &mut Self {
        self.parent = Some(parent);
        self
    }

    pub fn property(&mut self, name: impl Into<String>, schema: impl Into<JsonSchema>) -> &mut Self {
        self.schema.properties_mut().insert(name.into(), schema.into());
        self
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut JsonSchema> {
        self.schema.properties_mut().get_mut(name)
    }

    /// Declare the generic labels of this class.
    pub fn generics<I, S>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.configure(|schema| schema.generics(labels))
    }

    /// Apply a builder chain to the class-level schema.
    pub fn configure(&mut self, f: impl FnOnce(JsonSchema) -> JsonSchema) -> &mut Self {
        let schema = core::mem::take(&mut self.schema);
        self.schema = f(schema);
        self
    }

    pub fn required_fields<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.add_required(names);
        self
    }

    /// Declare the discriminator property of a polymorphic base class.
    pub fn discriminator_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.discriminator_key = Some(key.into());
        self
    }

    /// Declare the tag this subclass is selected by.
    pub fn discriminator_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Mark this class as a controller mounted at `path`.
    pub fn controller(&mut self, path: impl Into<String>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    pub fn method(&mut self, method: MethodEntity) -> &mut Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    pub fn generic_labels(&self) -> &[String] {
        self.schema.generic_labels()
    }

    pub fn get_discriminator_key(&self) -> Option<&str> {
        self.discriminator_key.as_deref()
    }

    pub fn get_discriminator_value(&self) -> Option<&str> {
        self.discriminator_value.as_deref()
    }

    /// The discriminator family rooted at this class, once frozen.
    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.schema
            .get_discriminator()
            .filter(|d| !d.mapping.is_empty() && self.discriminator_key.is_some())
    }

    pub fn controller_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn methods(&self) -> &[MethodEntity] {
        &self.methods
    }

    pub(crate) fn schema_mut(&mut self) -> &mut JsonSchema {
        &mut self.schema
    }

    pub(crate) fn set_schema(&mut self, schema: JsonSchema) {
        self.schema = schema;
    }
}
