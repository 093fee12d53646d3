use indexmap::IndexSet;
use serde_json::Value;

use super::{JsonSchema, Keyword, Type, json_type_of};

impl JsonSchema {
    /// Merge `values` into the `enum` list and deduce the JSON type from the
    /// union of value kinds (`"string"`, or `["string", "number"]` for mixed
    /// lists).
    #[must_use]
    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut list = match self.get_value("enum") {
            Some(Value::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        for value in values {
            let value = value.into();
            if !list.contains(&value) {
                list.push(value);
            }
        }

        let kinds: IndexSet<&'static str> = list.iter().map(json_type_of).collect();
        let json_type = match kinds.len() {
            0 => None,
            1 => kinds.first().map(|k| Value::from(*k)),
            _ => Some(Value::Array(kinds.iter().map(|k| Value::from(*k)).collect())),
        };
        if let Some(json_type) = json_type {
            self.insert_value("type", json_type);
        }
        self.insert_value("enum", Value::Array(list));
        self
    }

    /// Reuse the values of a previously declared enum schema.
    #[must_use]
    pub fn enum_schema(self, other: &JsonSchema) -> Self {
        match other.get_value("enum") {
            Some(Value::Array(values)) => self.enum_values(values.iter().cloned()),
            _ => self,
        }
    }

    #[must_use]
    pub fn all_of(self, schemas: Vec<JsonSchema>) -> Self {
        self.composition("allOf", schemas)
    }

    #[must_use]
    pub fn any_of(self, schemas: Vec<JsonSchema>) -> Self {
        self.composition("anyOf", schemas)
    }

    #[must_use]
    pub fn one_of(self, schemas: Vec<JsonSchema>) -> Self {
        self.composition("oneOf", schemas)
    }

    /// Shared implementation of `allOf`/`anyOf`/`oneOf`.
    ///
    /// Members pointing at the same class under the same bindings are
    /// deduplicated, a member's
    /// discriminator is carried over to this node, and a union reduced to a
    /// single bare type collapses into a plain [`JsonSchema::type_of`].
    fn composition(mut self, keyword: &str, schemas: Vec<JsonSchema>) -> Self {
        let mut members: Vec<JsonSchema> = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let duplicate = members.iter().any(|m| {
                (m.target().is_some()
                    && m.target() == schema.target()
                    && m.get_generic_of() == schema.get_generic_of())
                    || *m == schema
            });
            if !duplicate {
                members.push(schema);
            }
        }

        if let Some(discriminator) = members.iter().find_map(JsonSchema::get_discriminator) {
            self.set_discriminator(discriminator.clone());
        }

        if keyword != "allOf"
            && let [single] = members.as_slice()
            && let Some(ty) = single.bare_type()
        {
            self.apply_type(ty);
            return self;
        }

        self.keywords
            .insert(keyword.to_string(), Keyword::Schemas(members));
        self
    }

    /// The declared type when this node carries nothing else, i.e. when it
    /// can be folded into a parent's `type` without losing information.
    fn bare_type(&self) -> Option<Type> {
        let ty = self.ty()?;
        let only_type = self
            .keywords()
            .keys()
            .all(|k| k == "type" || (k == "format" && *ty == Type::Date));
        let plain = only_type
            && !self.is_collection()
            && !self.is_nullable()
            && self.get_generic_of().is_none()
            && self.get_discriminator().is_none();
        plain.then(|| ty.clone())
    }

    /// Copy every keyword and the bookkeeping of `other` onto this node.
    ///
    /// Keywords present on both sides take `other`'s value; the required
    /// list and vendor keys are unioned. Used to copy ancestor schemas into
    /// descendants, not to clone.
    pub fn assign(&mut self, other: &JsonSchema) -> &mut Self {
        for (key, keyword) in other.keywords() {
            self.keywords.insert(key.clone(), keyword.clone());
        }
        self.required.extend(other.required.iter().cloned());
        self.self_required |= other.self_required;
        for (key, value) in other.vendors() {
            self.vendors.insert(key.clone(), value.clone());
        }
        if let Some(ty) = &other.ty {
            self.ty = Some(ty.clone());
            self.target = other.target;
            self.generic_type.clone_from(&other.generic_type);
        }
        if other.collection.is_some() {
            self.collection = other.collection;
            self.item_schema.clone_from(&other.item_schema);
        }
        if !other.generic_labels.is_empty() {
            self.generic_labels.clone_from(&other.generic_labels);
        }
        if other.generic_of.is_some() {
            self.generic_of.clone_from(&other.generic_of);
        }
        if other.discriminator.is_some() {
            self.discriminator.clone_from(&other.discriminator);
        }
        if other.alias.is_some() {
            self.alias.clone_from(&other.alias);
        }
        if !other.groups.is_empty() {
            self.groups.clone_from(&other.groups);
        }
        for value in &other.allow {
            if !self.allow.contains(value) {
                self.allow.push(value.clone());
            }
        }
        self.nullable |= other.nullable;
        self
    }
}
