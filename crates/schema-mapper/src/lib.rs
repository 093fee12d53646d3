#![doc = include_str!("../README.md")]

mod error;
mod generics;
mod mappers;
mod merge;
mod options;
mod refs;
mod registry;
mod schema;
mod spec;
mod store;

pub use error::{Error, Result};
pub use generics::{GenericArg, GenericBinding, GenericOf, GenericsMap};
pub use merge::merge_schema;
pub use options::{Info, JsonSchemaOptions, SpecOptions, SpecType};
pub use refs::{create_ref, ref_name, to_ref, with_access_sidecars};
pub use registry::{Mapper, MapperArgs, MapperContext, MapperRegistry, exec_mapper};
pub use schema::{ClassId, CollectionKind, Discriminator, JsonSchema, Keyword, Type};
pub use spec::to_openapi_path;
pub use store::{
    ClassEntity, EntityStore, HttpVerb, JsonParameter, MethodEntity, ParamLocation, Route,
    SchemaStore,
};
