//! Generic bindings.
//!
//! A class declares labels with [`JsonSchema::generics`]; a use site binds
//! them with a [`GenericOf`], one level per nesting depth:
//! `Paginated<Submission<Product>>` is
//! `GenericOf::new([submission]).nested([product])`. At mapping time the
//! levels are resolved against the store into a [`GenericsMap`], which lives
//! only in the mapper context of one generation call.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::{JsonSchema, Type};
use crate::store::SchemaStore;

/// One bound type: a declared type (primitive, class, label) or a ready
/// schema builder such as an inline enum.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericArg {
    Type(Type),
    Schema(JsonSchema),
}

impl GenericArg {
    pub fn to_schema(&self) -> JsonSchema {
        match self {
            Self::Type(ty) => JsonSchema::of(ty.clone()),
            Self::Schema(schema) => schema.clone(),
        }
    }
}

impl From<Type> for GenericArg {
    fn from(ty: Type) -> Self {
        Self::Type(ty)
    }
}

impl From<crate::schema::ClassId> for GenericArg {
    fn from(id: crate::schema::ClassId) -> Self {
        Self::Type(Type::Class(id))
    }
}

impl From<JsonSchema> for GenericArg {
    fn from(schema: JsonSchema) -> Self {
        Self::Schema(schema)
    }
}

/// Use-site bindings for the generic labels of a class, level by level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericOf {
    levels: Vec<Vec<GenericArg>>,
}

impl GenericOf {
    pub fn new<I, A>(args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<GenericArg>,
    {
        Self {
            levels: vec![args.into_iter().map(Into::into).collect()],
        }
    }

    /// Bind the labels of the types bound at the previous level.
    #[must_use]
    pub fn nested<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<GenericArg>,
    {
        self.levels.push(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn levels(&self) -> &[Vec<GenericArg>] {
        &self.levels
    }
}

/// A resolved label: the bound schema plus the bindings for that schema's
/// own generic labels.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericBinding {
    pub schema: JsonSchema,
    pub nested: GenericsMap,
}

/// Label → binding map for one generic instantiation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericsMap(IndexMap<String, GenericBinding>);

impl GenericsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&GenericBinding> {
        self.0.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, label: impl Into<String>, binding: GenericBinding) {
        self.0.insert(label.into(), binding);
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether every label is bound to another unresolved placeholder, as
    /// happens for labels forwarded inside a generic class body.
    pub fn only_placeholders(&self) -> bool {
        self.0
            .values()
            .all(|binding| binding.schema.generic_type().is_some())
    }

    /// Resolve `generic_of` against the labels declared by `labels`.
    ///
    /// The first level binds `labels` positionally. Each bound class that
    /// declares labels of its own receives the remaining levels, unless the
    /// bound schema carries its own [`GenericOf`]. Arguments that are
    /// themselves labels (`Wrapper<T>` inside a generic class) are looked up
    /// in `outer`, the bindings active at the use site.
    pub fn resolve(
        store: &SchemaStore,
        labels: &[String],
        generic_of: &GenericOf,
        outer: &GenericsMap,
    ) -> Result<Self> {
        Self::resolve_levels(store, labels, generic_of.levels(), outer)
    }

    fn resolve_levels(
        store: &SchemaStore,
        labels: &[String],
        levels: &[Vec<GenericArg>],
        outer: &GenericsMap,
    ) -> Result<Self> {
        let mut map = Self::new();
        let Some((first, rest)) = levels.split_first() else {
            return Ok(map);
        };
        for (label, arg) in labels.iter().zip(first) {
            if let GenericArg::Type(Type::Generic(forwarded)) = arg
                && let Some(binding) = outer.get(forwarded)
            {
                map.insert(label.clone(), binding.clone());
                continue;
            }
            let schema = arg.to_schema();
            let nested = match schema.target() {
                Some(id) => {
                    let own_labels = store.class(id)?.generic_labels();
                    match schema.get_generic_of() {
                        Some(own) => Self::resolve(store, own_labels, own, outer)?,
                        None if own_labels.is_empty() => Self::new(),
                        None => Self::resolve_levels(store, own_labels, rest, outer)?,
                    }
                }
                None => Self::new(),
            };
            map.insert(label.clone(), GenericBinding { schema, nested });
        }
        Ok(map)
    }
}

/// Check a use-site binding against the labels of its class.
pub(crate) fn validate_generic_of(
    class_name: &str,
    labels: &[String],
    generic_of: &GenericOf,
) -> Result<()> {
    let Some(first) = generic_of.levels().first() else {
        return Err(Error::decoration(
            "GenericOf",
            format!("binding for `{class_name}` declares no types"),
        ));
    };
    if labels.is_empty() {
        return Err(Error::decoration(
            "GenericOf",
            format!("class `{class_name}` declares no generic labels"),
        ));
    }
    if first.len() > labels.len() {
        return Err(Error::decoration(
            "GenericOf",
            format!(
                "class `{class_name}` declares {} generic label(s) but {} type(s) were bound",
                labels.len(),
                first.len()
            ),
        ));
    }
    Ok(())
}
