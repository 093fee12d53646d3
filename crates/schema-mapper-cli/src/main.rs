#![doc = include_str!("../README.md")]

use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

mod commands;
mod manifest;

use commands::json_schema::{JsonSchemaArgs, json_schema_args};
use commands::spec::{SpecArgs, spec_args};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
#[allow(clippy::upper_case_acronyms)]
/// Generate JSON Schema and OpenAPI documents from a TOML model manifest
struct CLI {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    /// Print the JSON Schema of one model
    #[bpaf(command("json-schema"))]
    JsonSchema(#[bpaf(external(json_schema_args))] JsonSchemaArgs),

    /// Print the OpenAPI or Swagger document of every controller
    #[bpaf(command("spec"))]
    Spec(#[bpaf(external(spec_args))] SpecArgs),

    /// Print the JSON Schema of the manifest format
    #[bpaf(command("manifest-schema"))]
    ManifestSchema,

    /// Print version information
    #[bpaf(command("version"))]
    Version,
}

fn main() -> ExitCode {
    // SCHEMA_MAPPER_LOG overrides the default `warn` filter and turns on
    // verbose span entry/exit.
    let (filter, explicit) = match tracing_subscriber::EnvFilter::try_from_env("SCHEMA_MAPPER_LOG")
    {
        Ok(f) => (f, true),
        Err(_) => (tracing_subscriber::EnvFilter::new("warn"), false),
    };
    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_indent_lines(true)
                .with_verbose_exit(explicit)
                .with_verbose_entry(explicit)
                .with_timer(tracing_tree::time::Uptime::default())
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    let cli = cli().run();

    let result = match cli.command {
        Commands::JsonSchema(args) => args.run(),
        Commands::Spec(args) => args.run(),
        Commands::ManifestSchema => commands::print_json(&manifest::schema()),
        Commands::Version => {
            println!("schema-mapper {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
