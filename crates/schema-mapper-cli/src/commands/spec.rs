use std::path::PathBuf;

use anyhow::Result;
use bpaf::Bpaf;
use schema_mapper::{SpecOptions, SpecType};

use crate::manifest;

/// Arguments for the `spec` subcommand.
#[derive(Debug, Clone, Bpaf)]
pub struct SpecArgs {
    /// Path to the model manifest
    #[bpaf(
        long("manifest"),
        argument("PATH"),
        fallback(PathBuf::from("schema-mapper.toml"))
    )]
    pub manifest: PathBuf,

    /// Document flavour: openapi or swagger
    #[bpaf(long("spec-type"), argument("TYPE"))]
    pub spec_type: Option<SpecType>,

    /// Version of the document flavour, e.g. 3.1.0
    #[bpaf(long("spec-version"), argument("VERSION"))]
    pub spec_version: Option<String>,
}

impl SpecArgs {
    pub fn run(self) -> Result<()> {
        let manifest = manifest::load(&self.manifest)?;
        let store = manifest.build()?;
        let mut options = super::override_options(manifest.options, self.spec_type, self.spec_version);
        if self.spec_type.is_none() && options.spec_type == SpecType::Json {
            options.spec_type = SpecType::OpenApi;
        }

        let document = store.get_spec(&SpecOptions {
            info: manifest.info,
            schema: options,
        })?;
        super::print_json(&document)
    }
}
