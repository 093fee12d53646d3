use serde_json::{Value, json};

/// Index of a class in an [`EntityStore`](crate::EntityStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Collection shapes that seed a nested item schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// `{"type": "array", "items": ...}`
    Array,
    /// `{"type": "array", "uniqueItems": true, "items": ...}`
    Set,
    /// `{"type": "object", "additionalProperties": ...}`
    Map,
}

/// Declared type of a schema node.
///
/// A node either has a concrete type or is an unresolved generic placeholder
/// ([`Type::Generic`]); the two are never combined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Object,
    Any,
    /// Serialized as an RFC 3339 `date-time` string.
    Date,
    Array,
    Set,
    Map,
    Class(ClassId),
    /// Generic label such as `T`, bound at the use site.
    Generic(String),
}

impl Type {
    /// Parse a type name. Names that are not a known primitive or
    /// collection are treated as generic labels.
    pub fn parse(name: &str) -> Self {
        match name {
            "string" | "String" => Self::String,
            "number" | "Number" => Self::Number,
            "integer" | "Integer" => Self::Integer,
            "boolean" | "Boolean" => Self::Boolean,
            "null" => Self::Null,
            "object" | "Object" => Self::Object,
            "any" | "Any" => Self::Any,
            "date" | "Date" => Self::Date,
            "array" | "Array" => Self::Array,
            "set" | "Set" => Self::Set,
            "map" | "Map" => Self::Map,
            label => Self::Generic(label.to_string()),
        }
    }

    /// The JSON Schema `type` value for this declared type, if it has one.
    pub fn json_type(&self) -> Option<Value> {
        let ty = match self {
            Self::String | Self::Date => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Object | Self::Map | Self::Class(_) => "object",
            Self::Array | Self::Set => "array",
            Self::Any => {
                return Some(json!([
                    "integer", "number", "string", "boolean", "array", "object", "null"
                ]));
            }
            Self::Generic(_) => return None,
        };
        Some(Value::String(ty.to_string()))
    }

    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            Self::Array => Some(CollectionKind::Array),
            Self::Set => Some(CollectionKind::Set),
            Self::Map => Some(CollectionKind::Map),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::Number
                | Self::Integer
                | Self::Boolean
                | Self::Null
                | Self::Date
                | Self::Any
        )
    }
}

impl From<&str> for Type {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<ClassId> for Type {
    fn from(id: ClassId) -> Self {
        Self::Class(id)
    }
}

impl From<CollectionKind> for Type {
    fn from(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::Array => Self::Array,
            CollectionKind::Set => Self::Set,
            CollectionKind::Map => Self::Map,
        }
    }
}

/// JSON type name of a literal value, used to deduce the `type` of an enum.
pub(crate) fn json_type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
