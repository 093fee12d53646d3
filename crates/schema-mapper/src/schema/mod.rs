//! The in-memory schema node.
//!
//! A [`JsonSchema`] carries the standard JSON Schema keywords in insertion
//! order plus the bookkeeping the mappers need: the originating class, the
//! collection item schema, generic labels and bindings, groups, nullability
//! and the discriminator.

mod composition;
mod set;
mod types;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::generics::{GenericArg, GenericOf};

pub use types::{ClassId, CollectionKind, Type};
pub(crate) use types::json_type_of;

/// A keyword value: a plain JSON value or nested schema nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Value(Value),
    Schema(Box<JsonSchema>),
    Schemas(Vec<JsonSchema>),
    Properties(IndexMap<String, JsonSchema>),
}

/// Property name plus tag → subclass mapping for polymorphic unions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, ClassId>,
}

impl Discriminator {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_mapping(mut self, tag: impl Into<String>, class: ClassId) -> Self {
        self.mapping.insert(tag.into(), class);
        self
    }
}

/// One schema node of a class, property, parameter or collection item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonSchema {
    keywords: IndexMap<String, Keyword>,
    required: IndexSet<String>,
    self_required: bool,
    ty: Option<Type>,
    target: Option<ClassId>,
    collection: Option<CollectionKind>,
    item_schema: Option<Box<JsonSchema>>,
    generic_type: Option<String>,
    generic_labels: Vec<String>,
    generic_of: Option<GenericOf>,
    discriminator: Option<Discriminator>,
    nullable: bool,
    alias: Option<String>,
    groups: Vec<String>,
    allow: Vec<Value>,
    vendors: IndexMap<String, Value>,
}

macro_rules! keyword_builders {
    ($($(#[$meta:meta])* $fn_name:ident($arg:ident: $ty:ty) => $key:literal;)*) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $fn_name(mut self, $arg: $ty) -> Self {
                self.insert_value($key, $arg.into());
                self
            }
        )*
    };
}

impl JsonSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(ty: impl Into<Type>) -> Self {
        Self::new().type_of(ty)
    }

    pub fn string() -> Self {
        Self::of(Type::String)
    }

    pub fn number() -> Self {
        Self::of(Type::Number)
    }

    pub fn integer() -> Self {
        Self::of(Type::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(Type::Boolean)
    }

    pub fn date() -> Self {
        Self::of(Type::Date)
    }

    pub fn any() -> Self {
        Self::of(Type::Any)
    }

    pub fn object() -> Self {
        Self::of(Type::Object)
    }

    pub fn class(id: ClassId) -> Self {
        Self::of(Type::Class(id))
    }

    /// An unresolved generic placeholder such as `T`.
    pub fn generic(label: impl Into<String>) -> Self {
        Self::of(Type::Generic(label.into()))
    }

    pub fn array_of(item: impl Into<JsonSchema>) -> Self {
        Self::new().collection_of(CollectionKind::Array, item)
    }

    pub fn set_of(item: impl Into<JsonSchema>) -> Self {
        Self::new().collection_of(CollectionKind::Set, item)
    }

    pub fn map_of(item: impl Into<JsonSchema>) -> Self {
        Self::new().collection_of(CollectionKind::Map, item)
    }

    /// An inline enumeration; the JSON type is deduced from the values.
    pub fn enumeration<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new().enum_values(values)
    }

    /// Set the declared type.
    ///
    /// Collections seed an empty item schema when none exists yet, classes
    /// record the target, and generic labels drop the JSON `type`.
    #[must_use]
    pub fn type_of(mut self, ty: impl Into<Type>) -> Self {
        self.apply_type(ty.into());
        self
    }

    pub(crate) fn apply_type(&mut self, ty: Type) {
        self.target = None;
        self.generic_type = None;
        match &ty {
            Type::Generic(label) => {
                self.keywords.shift_remove("type");
                self.generic_type = Some(label.clone());
            }
            Type::Class(id) => {
                self.target = Some(*id);
            }
            _ => {}
        }
        match ty.collection_kind() {
            Some(kind) => {
                self.collection = Some(kind);
                if self.item_schema.is_none() {
                    self.item_schema = Some(Box::default());
                }
            }
            None => {
                self.collection = None;
                self.item_schema = None;
            }
        }
        if let Some(json_type) = ty.json_type() {
            self.insert_value("type", json_type);
        }
        if ty == Type::Date {
            self.insert_value("format", Value::from("date-time"));
        }
        self.ty = Some(ty);
    }

    /// Turn this node into a collection of `item`.
    #[must_use]
    pub fn collection_of(mut self, kind: CollectionKind, item: impl Into<JsonSchema>) -> Self {
        self.apply_type(kind.into());
        self.item_schema = Some(Box::new(item.into()));
        self
    }

    /// Replace the item schema of a collection. Non-collections become arrays.
    #[must_use]
    pub fn items(mut self, item: impl Into<JsonSchema>) -> Self {
        if self.collection.is_none() {
            self.apply_type(Type::Array);
        }
        self.item_schema = Some(Box::new(item.into()));
        self
    }

    keyword_builders! {
        title(title: &str) => "title";
        description(description: &str) => "description";
        format(format: &str) => "format";
        pattern(pattern: &str) => "pattern";
        min_length(min: u64) => "minLength";
        max_length(max: u64) => "maxLength";
        minimum(min: impl Into<Value>) => "minimum";
        maximum(max: impl Into<Value>) => "maximum";
        exclusive_minimum(min: impl Into<Value>) => "exclusiveMinimum";
        exclusive_maximum(max: impl Into<Value>) => "exclusiveMaximum";
        multiple_of(value: impl Into<Value>) => "multipleOf";
        min_items(min: u64) => "minItems";
        max_items(max: u64) => "maxItems";
        min_properties(min: u64) => "minProperties";
        max_properties(max: u64) => "maxProperties";
        read_only(flag: bool) => "readOnly";
        write_only(flag: bool) => "writeOnly";
        unique_items(flag: bool) => "uniqueItems";
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.insert_value("default", value.into());
        self
    }

    #[must_use]
    pub fn examples<I, V>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = examples.into_iter().map(Into::into).collect();
        self.insert_value("examples", Value::Array(list));
        self
    }

    /// Store any keyword verbatim.
    #[must_use]
    pub fn keyword(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords
            .insert(key.into(), Keyword::Value(value.into()));
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<JsonSchema>) -> Self {
        self.properties_mut().insert(name.into(), schema.into());
        self
    }

    #[must_use]
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.insert_value("additionalProperties", Value::Bool(allowed));
        self
    }

    #[must_use]
    pub fn additional_properties_schema(mut self, schema: impl Into<JsonSchema>) -> Self {
        self.keywords.insert(
            "additionalProperties".to_string(),
            Keyword::Schema(Box::new(schema.into())),
        );
        self
    }

    /// Mark this node as a required property.
    ///
    /// Consumes the node, so a schema shared elsewhere is never flagged
    /// behind its owner's back; see [`JsonSchema::as_required`] for the
    /// borrowing form.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.self_required = required;
        self
    }

    /// A clone of this node with the self-required marker set. The
    /// original is left untouched.
    pub fn as_required(&self, required: bool) -> Self {
        self.clone().required(required)
    }

    /// Add names to the object-level `required` list, in place.
    pub fn add_required<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn required_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_required(names);
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Emitted property name when aliases are enabled.
    #[must_use]
    pub fn name(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Serialization groups. A `!` prefix excludes the node from that group.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Values accepted even though they fall outside the declared type.
    /// Allowing `null` makes a required property nullable.
    #[must_use]
    pub fn allow<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for value in values {
            let value = value.into();
            if !self.allow.contains(&value) {
                self.allow.push(value);
            }
        }
        self
    }

    /// Custom vendor key, emitted only when `custom_keys` is enabled.
    #[must_use]
    pub fn vendor(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vendors.insert(key.into(), value.into());
        self
    }

    /// Declare the generic labels of a class schema (`T`, `S`, ...).
    #[must_use]
    pub fn generics<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generic_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Bind the generic labels of the target class at this use site.
    #[must_use]
    pub fn generic_of(mut self, generic_of: GenericOf) -> Self {
        self.generic_of = Some(generic_of);
        self
    }

    #[must_use]
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub(crate) fn insert_value(&mut self, key: &str, value: Value) {
        self.keywords.insert(key.to_string(), Keyword::Value(value));
    }

    pub(crate) fn properties_mut(&mut self) -> &mut IndexMap<String, JsonSchema> {
        let entry = self
            .keywords
            .entry("properties".to_string())
            .or_insert_with(|| Keyword::Properties(IndexMap::new()));
        if !matches!(entry, Keyword::Properties(_)) {
            *entry = Keyword::Properties(IndexMap::new());
        }
        match entry {
            Keyword::Properties(map) => map,
            _ => unreachable!("properties keyword was just normalized"),
        }
    }

    pub(crate) fn remove_keyword(&mut self, key: &str) -> Option<Keyword> {
        self.keywords.shift_remove(key)
    }

    pub(crate) fn set_discriminator(&mut self, discriminator: Discriminator) {
        self.discriminator = Some(discriminator);
    }

    pub(crate) fn set_self_required(&mut self, required: bool) {
        self.self_required = required;
    }

    // Accessors

    pub fn keywords(&self) -> &IndexMap<String, Keyword> {
        &self.keywords
    }

    pub fn get(&self, key: &str) -> Option<&Keyword> {
        self.keywords.get(key)
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        match self.keywords.get(key) {
            Some(Keyword::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&IndexMap<String, JsonSchema>> {
        match self.keywords.get("properties") {
            Some(Keyword::Properties(map)) => Some(map),
            _ => None,
        }
    }

    pub fn get_property(&self, name: &str) -> Option<&JsonSchema> {
        self.properties().and_then(|props| props.get(name))
    }

    pub fn required_names(&self) -> &IndexSet<String> {
        &self.required
    }

    pub fn is_required(&self) -> bool {
        self.self_required
    }

    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn target(&self) -> Option<ClassId> {
        self.target
    }

    /// Class-typed nodes are emitted as shared `$ref` components.
    pub fn is_class(&self) -> bool {
        self.target.is_some()
    }

    pub fn collection(&self) -> Option<CollectionKind> {
        self.collection
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    pub fn item_schema(&self) -> Option<&JsonSchema> {
        self.item_schema.as_deref()
    }

    pub fn generic_type(&self) -> Option<&str> {
        self.generic_type.as_deref()
    }

    pub fn generic_labels(&self) -> &[String] {
        &self.generic_labels
    }

    pub fn get_generic_of(&self) -> Option<&GenericOf> {
        self.generic_of.as_ref()
    }

    pub fn get_discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable || self.allow.contains(&Value::Null)
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    pub fn allowed_values(&self) -> &[Value] {
        &self.allow
    }

    pub fn vendors(&self) -> &IndexMap<String, Value> {
        &self.vendors
    }

    pub fn is_read_only(&self) -> bool {
        self.get_value("readOnly") == Some(&Value::Bool(true))
    }

    pub fn is_write_only(&self) -> bool {
        self.get_value("writeOnly") == Some(&Value::Bool(true))
    }

    /// The JSON `type` value, if any.
    pub fn json_type(&self) -> Option<&Value> {
        self.get_value("type")
    }

    /// Whether this node belongs to the active serialization groups.
    ///
    /// `None` disables filtering. A `!group` entry excludes the node when
    /// that group is active; positive entries require at least one match.
    pub fn matches_groups(&self, active: Option<&[String]>) -> bool {
        let Some(active) = active else {
            return true;
        };
        let mut positive = self.groups.iter().filter(|g| !g.starts_with('!')).peekable();
        let excluded = self
            .groups
            .iter()
            .filter_map(|g| g.strip_prefix('!'))
            .any(|g| active.iter().any(|a| a == g));
        if excluded {
            return false;
        }
        if positive.peek().is_none() {
            return true;
        }
        positive.any(|g| active.contains(g))
    }

    /// Generic labels this node depends on: its own placeholder, the
    /// placeholders of its item schema, nested schema keywords and inline
    /// properties, and labels forwarded through its own bindings.
    pub fn generic_labels_in_use(&self) -> Vec<String> {
        let mut labels = IndexSet::new();
        self.collect_generic_labels(&mut labels);
        labels.into_iter().collect()
    }

    fn collect_generic_labels(&self, labels: &mut IndexSet<String>) {
        if let Some(label) = &self.generic_type {
            labels.insert(label.clone());
        }
        if let Some(item) = &self.item_schema {
            item.collect_generic_labels(labels);
        }
        for keyword in self.keywords.values() {
            match keyword {
                Keyword::Schema(schema) => schema.collect_generic_labels(labels),
                Keyword::Schemas(list) => {
                    for schema in list {
                        schema.collect_generic_labels(labels);
                    }
                }
                Keyword::Properties(props) => {
                    for schema in props.values() {
                        schema.collect_generic_labels(labels);
                    }
                }
                Keyword::Value(_) => {}
            }
        }
        if let Some(generic_of) = &self.generic_of {
            for arg in generic_of.levels().iter().flatten() {
                match arg {
                    GenericArg::Type(Type::Generic(label)) => {
                        labels.insert(label.clone());
                    }
                    GenericArg::Schema(schema) => schema.collect_generic_labels(labels),
                    GenericArg::Type(_) => {}
                }
            }
        }
    }
}

impl From<Type> for JsonSchema {
    fn from(ty: Type) -> Self {
        Self::of(ty)
    }
}

impl From<ClassId> for JsonSchema {
    fn from(id: ClassId) -> Self {
        Self::class(id)
    }
}
