use indexmap::IndexMap;
use serde_json::Value;

use super::{JsonSchema, Keyword, Type};
use crate::error::{Error, Result};

/// Keywords whose value is a single nested schema.
const SCHEMA_KEYWORDS: &[&str] = &["not", "if", "then", "else", "contains", "propertyNames"];

fn invalid(key: &str, expected: &str) -> Error {
    Error::decoration("set", format!("invalid value for `{key}`: expected {expected}"))
}

fn string_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(invalid(key, "an array of strings"));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| invalid(key, "an array of strings"))
        })
        .collect()
}

fn schema_list(key: &str, value: Value) -> Result<Vec<JsonSchema>> {
    let Value::Array(items) = value else {
        return Err(invalid(key, "an array of schemas"));
    };
    items.into_iter().map(JsonSchema::try_from).collect()
}

impl JsonSchema {
    /// Set a keyword by name.
    ///
    /// Keys with builder semantics (`type`, `items`, `properties`, `enum`,
    /// `required`, compositions, ...) are routed to the typed builder so that
    /// `set("type", "array")` seeds an item schema exactly like
    /// [`JsonSchema::type_of`]. Other keys are stored verbatim; `x-*` keys
    /// become vendor keys.
    pub fn set(&mut self, key: &str, value: Value) -> Result<&mut Self> {
        let this = core::mem::take(self);
        *self = this.with(key, value)?;
        Ok(self)
    }

    /// Consuming form of [`JsonSchema::set`].
    pub fn with(mut self, key: &str, value: Value) -> Result<Self> {
        match key {
            "type" => match value {
                Value::String(name) => self.apply_type(Type::parse(&name)),
                Value::Array(_) => {
                    string_list(key, &value)?;
                    self.insert_value("type", value);
                }
                _ => return Err(invalid(key, "a type name or an array of type names")),
            },
            "items" => {
                let item = JsonSchema::try_from(value)?;
                self = self.items(item);
            }
            "properties" => {
                let Value::Object(map) = value else {
                    return Err(invalid(key, "an object of schemas"));
                };
                let props = self.properties_mut();
                for (name, prop) in map {
                    props.insert(name, JsonSchema::try_from(prop)?);
                }
            }
            "additionalProperties" => match value {
                Value::Bool(allowed) => self = self.additional_properties(allowed),
                Value::Object(_) => {
                    self = self.additional_properties_schema(JsonSchema::try_from(value)?);
                }
                _ => return Err(invalid(key, "a boolean or a schema")),
            },
            "enum" => {
                let Value::Array(values) = value else {
                    return Err(invalid(key, "an array"));
                };
                self = self.enum_values(values);
            }
            "required" => match value {
                Value::Bool(required) => self.set_self_required(required),
                Value::Array(_) => {
                    self.add_required(string_list(key, &value)?);
                }
                _ => return Err(invalid(key, "a boolean or an array of names")),
            },
            "allOf" => self = self.all_of(schema_list(key, value)?),
            "anyOf" => self = self.any_of(schema_list(key, value)?),
            "oneOf" => self = self.one_of(schema_list(key, value)?),
            "nullable" => {
                let nullable = value.as_bool().ok_or_else(|| invalid(key, "a boolean"))?;
                self = self.nullable(nullable);
            }
            "readOnly" | "writeOnly" | "uniqueItems" => {
                if !value.is_boolean() {
                    return Err(invalid(key, "a boolean"));
                }
                self.insert_value(key, value);
            }
            "groups" => self = self.groups(string_list(key, &value)?),
            "name" => {
                let alias = value.as_str().ok_or_else(|| invalid(key, "a string"))?;
                self = self.name(alias);
            }
            "allow" => match value {
                Value::Array(values) => self = self.allow(values),
                other => self = self.allow([other]),
            },
            _ if SCHEMA_KEYWORDS.contains(&key) => {
                let nested = JsonSchema::try_from(value)?;
                self.keywords
                    .insert(key.to_string(), Keyword::Schema(Box::new(nested)));
            }
            _ if key.starts_with("x-") => self = self.vendor(key, value),
            _ => self.insert_value(key, value),
        }
        Ok(self)
    }
}

impl TryFrom<Value> for JsonSchema {
    type Error = Error;

    /// Build a schema node from a plain JSON Schema object, routing every
    /// key through [`JsonSchema::set`].
    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(invalid("schema", "an object"));
        };
        map.into_iter()
            .try_fold(JsonSchema::new(), |schema, (key, value)| schema.with(&key, value))
    }
}

impl TryFrom<IndexMap<String, Value>> for JsonSchema {
    type Error = Error;

    fn try_from(map: IndexMap<String, Value>) -> Result<Self> {
        map.into_iter()
            .try_fold(JsonSchema::new(), |schema, (key, value)| schema.with(&key, value))
    }
}
