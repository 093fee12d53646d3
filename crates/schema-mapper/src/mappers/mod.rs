//! Built-in mappers.
//!
//! | name                   | arguments   | produces                                  |
//! |------------------------|-------------|-------------------------------------------|
//! | `any`                  | `Schema`    | dispatch: placeholder, class or schema    |
//! | `item`                 | `Schema`    | `any`, one level deeper                   |
//! | `next`                 | `Refine`    | reference merged with local keywords      |
//! | `schema`               | `Schema`    | inline body of a node                     |
//! | `properties`           | `Schema`    | the `properties` object                   |
//! | `class`                | `Schema`    | `$ref`, generic instantiation or union    |
//! | `generics`             | `Schema`    | `allOf: [$ref, {properties}]` overrides   |
//! | `required`             | `Refine`    | adds the `required` list                  |
//! | `nullable`             | `Refine`    | null handling, per spec type              |
//! | `discriminator`        | `Schema`    | `oneOf` of a family's members             |
//! | `discriminatorMapping` | `Refine`    | the `discriminator` object, per spec type |
//! | `operationInQuery`     | `Parameter` | query parameter list, per spec type       |

mod any;
mod class;
mod discriminator;
mod generics;
mod nullable;
mod operation;
mod required;
mod schema;

use crate::options::SpecType;
use crate::registry::MapperRegistry;

pub(crate) use operation::flatten_schema;
pub(crate) use schema::property_key;

pub(crate) fn register_defaults(registry: &mut MapperRegistry) {
    registry
        .register("any", any::any_mapper, None)
        .register("item", any::item_mapper, None)
        .register("next", any::next_mapper, None)
        .register("schema", schema::schema_mapper, None)
        .register("properties", schema::properties_mapper, None)
        .register("class", class::class_mapper, None)
        .register("generics", generics::generics_mapper, None)
        .register("required", required::required_mapper, None)
        .register("nullable", nullable::type_union_mapper, None)
        .register(
            "nullable",
            nullable::openapi_mapper,
            Some(SpecType::OpenApi),
        )
        .register(
            "nullable",
            nullable::swagger_mapper,
            Some(SpecType::Swagger),
        )
        .register("discriminator", discriminator::discriminator_mapper, None)
        .register(
            "discriminatorMapping",
            discriminator::property_name_mapper,
            None,
        )
        .register(
            "discriminatorMapping",
            discriminator::mapping_mapper,
            Some(SpecType::OpenApi),
        )
        .register(
            "discriminatorMapping",
            discriminator::mapping_mapper,
            Some(SpecType::AsyncApi),
        )
        .register("operationInQuery", operation::in_query_mapper, None)
        .register(
            "operationInQuery",
            operation::swagger_in_query_mapper,
            Some(SpecType::Swagger),
        );
}
