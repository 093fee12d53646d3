use serde::{Deserialize, Serialize};

/// Output document family. Selects which mapper variant runs for the
/// concerns that differ between targets (nullable, discriminator, query
/// parameters) and where named components live.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum SpecType {
    /// Plain JSON Schema (draft-07), components under `definitions`.
    #[default]
    Json,
    /// OpenAPI 3.x, components under `components.schemas`.
    OpenApi,
    /// Swagger 2.0, components under `definitions`.
    Swagger,
    /// AsyncAPI 2.x, components under `components.schemas`.
    AsyncApi,
}

impl SpecType {
    /// JSON pointer prefix used by `$ref` values for this target.
    pub fn ref_host(self) -> &'static str {
        match self {
            Self::Json | Self::Swagger => "#/definitions",
            Self::OpenApi | Self::AsyncApi => "#/components/schemas",
        }
    }

    /// Default `specVersion` when none is configured.
    pub fn default_version(self) -> &'static str {
        match self {
            Self::Json => "draft-07",
            Self::OpenApi => "3.0.1",
            Self::Swagger => "2.0",
            Self::AsyncApi => "2.6.0",
        }
    }
}

/// Options threaded through every mapper call.
///
/// Serialized with `serde_json` to build the memoization key, so two
/// structurally equal option values always share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[schemars(title = "Schema Options")]
pub struct JsonSchemaOptions {
    /// Output document family.
    pub spec_type: SpecType,

    /// Target version, e.g. `3.0.1` or `3.1.0` for OpenAPI. Drives the
    /// nullable rendering.
    pub spec_version: Option<String>,

    /// Active serialization groups. `None` disables group filtering.
    pub groups: Option<Vec<String>>,

    /// Suffix used instead of the PascalCase group names when naming
    /// components.
    pub groups_name: Option<String>,

    /// Emit property aliases instead of declared names.
    pub use_alias: bool,

    /// Emit custom `x-*` vendor keys.
    pub custom_keys: bool,

    /// Fail on unbound generic labels instead of dropping the property.
    pub strict_generics: bool,
}

impl Default for JsonSchemaOptions {
    fn default() -> Self {
        Self {
            spec_type: SpecType::Json,
            spec_version: None,
            groups: None,
            groups_name: None,
            use_alias: true,
            custom_keys: false,
            strict_generics: false,
        }
    }
}

impl JsonSchemaOptions {
    pub fn new(spec_type: SpecType) -> Self {
        Self {
            spec_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_spec_version(mut self, version: impl Into<String>) -> Self {
        self.spec_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict_generics = true;
        self
    }

    /// Effective spec version, falling back to the target's default.
    pub fn spec_version(&self) -> &str {
        self.spec_version
            .as_deref()
            .unwrap_or_else(|| self.spec_type.default_version())
    }

    /// OpenAPI 3.0.x renders nullability as a `nullable: true` sidecar.
    pub fn is_openapi_30(&self) -> bool {
        self.spec_type == SpecType::OpenApi && self.spec_version().starts_with("3.0")
    }

    pub fn active_groups(&self) -> Option<&[String]> {
        self.groups.as_deref()
    }
}

/// Document metadata for [`SchemaStore::get_spec`](crate::SchemaStore::get_spec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Api documentation".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

/// Options for a full OpenAPI / Swagger document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecOptions {
    pub info: Info,
    #[serde(flatten)]
    pub schema: JsonSchemaOptions,
}
