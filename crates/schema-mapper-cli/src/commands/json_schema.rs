use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use schema_mapper::SpecType;

use crate::manifest;

/// Arguments for the `json-schema` subcommand.
#[derive(Debug, Clone, Bpaf)]
pub struct JsonSchemaArgs {
    /// Path to the model manifest
    #[bpaf(
        long("manifest"),
        argument("PATH"),
        fallback(PathBuf::from("schema-mapper.toml"))
    )]
    pub manifest: PathBuf,

    /// Class to generate the schema for
    #[bpaf(long("model"), argument("NAME"))]
    pub model: String,

    /// Output flavour: json, openapi, swagger or asyncapi
    #[bpaf(long("spec-type"), argument("TYPE"))]
    pub spec_type: Option<SpecType>,

    /// Version of the output flavour, e.g. 3.1.0
    #[bpaf(long("spec-version"), argument("VERSION"))]
    pub spec_version: Option<String>,

    /// Comma-separated serialization groups
    #[bpaf(long("groups"), argument("GROUPS"))]
    pub groups: Option<String>,

    /// Fail on generic labels without a binding
    #[bpaf(long("strict"), switch)]
    pub strict: bool,
}

impl JsonSchemaArgs {
    pub fn run(self) -> Result<()> {
        let manifest = manifest::load(&self.manifest)?;
        let store = manifest.build()?;
        let id = store
            .find_class(&self.model)
            .with_context(|| format!("model `{}` is not declared in the manifest", self.model))?;

        let mut options =
            super::override_options(manifest.options, self.spec_type, self.spec_version);
        if let Some(groups) = &self.groups {
            options = options.with_groups(
                groups
                    .split(',')
                    .map(str::trim)
                    .filter(|group| !group.is_empty()),
            );
        }
        if self.strict {
            options = options.strict();
        }

        let _span = tracing::info_span!("json_schema", model = %self.model).entered();
        let schema = store.get_json_schema(id, &options)?;
        super::print_json(&schema)
    }
}
