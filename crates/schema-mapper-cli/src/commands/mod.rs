pub mod json_schema;
pub mod spec;

use schema_mapper::{JsonSchemaOptions, SpecType};

/// Print a JSON document to stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Layer command-line overrides over the manifest's `[options]`.
pub(crate) fn override_options(
    mut options: JsonSchemaOptions,
    spec_type: Option<SpecType>,
    spec_version: Option<String>,
) -> JsonSchemaOptions {
    if let Some(spec_type) = spec_type {
        if spec_type != options.spec_type {
            options.spec_version = None;
        }
        options.spec_type = spec_type;
    }
    if let Some(version) = spec_version {
        options = options.with_spec_version(version);
    }
    options
}
