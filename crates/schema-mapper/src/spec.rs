//! OpenAPI 3 and Swagger 2 documents for controller classes.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::mappers::flatten_schema;
use crate::options::{SpecOptions, SpecType};
use crate::registry::{MapperArgs, MapperContext, exec_mapper};
use crate::store::{ClassEntity, JsonParameter, MethodEntity, ParamLocation, SchemaStore};

/// `/users/:id` → `/users/{id}`; also joins the controller and method paths.
pub fn to_openapi_path(base: &str, path: &str) -> String {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let segments: Vec<String> = joined
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name.trim_end_matches('?')),
            None => segment.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

fn object(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

impl SchemaStore {
    /// Build the OpenAPI 3 or Swagger 2 document of every controller class.
    ///
    /// JSON Schema and AsyncAPI targets are rejected with
    /// [`Error::UnsupportedSpec`].
    pub fn get_spec(&self, options: &SpecOptions) -> Result<Value> {
        let spec_type = options.schema.spec_type;
        if matches!(spec_type, SpecType::Json | SpecType::AsyncApi) {
            return Err(Error::UnsupportedSpec(spec_type));
        }
        let _span = tracing::info_span!("get_spec", spec = %spec_type).entered();

        let mut ctx = MapperContext::new(self, &options.schema);
        let mut paths = Map::new();
        let mut tags = Vec::new();
        for (_, class) in self.classes() {
            let Some(base) = class.controller_path() else {
                continue;
            };
            tags.push(object([("name", Value::from(class.name()))]));
            for method in class.methods() {
                let Some(route) = method.get_route() else {
                    continue;
                };
                let path = to_openapi_path(base, &route.path);
                tracing::debug!(%path, verb = %route.verb, "adding operation");
                let operation = operation(class, method, &mut ctx)?;
                if let Value::Object(item) = paths
                    .entry(path)
                    .or_insert_with(|| Value::Object(Map::new()))
                {
                    item.insert(route.verb.to_string(), operation);
                }
            }
        }

        let info = serde_json::to_value(&options.info)?;
        let schemas: Map<String, Value> = ctx.into_components().into_iter().collect();
        let mut document = Map::new();
        if spec_type == SpecType::Swagger {
            document.insert("swagger".to_string(), Value::from("2.0"));
            document.insert("info".to_string(), info);
            document.insert("paths".to_string(), Value::Object(paths));
            if !schemas.is_empty() {
                document.insert("definitions".to_string(), Value::Object(schemas));
            }
        } else {
            document.insert(
                "openapi".to_string(),
                Value::from(options.schema.spec_version()),
            );
            document.insert("info".to_string(), info);
            document.insert("paths".to_string(), Value::Object(paths));
            if !schemas.is_empty() {
                document.insert(
                    "components".to_string(),
                    object([("schemas", Value::Object(schemas))]),
                );
            }
        }
        if !tags.is_empty() {
            document.insert("tags".to_string(), Value::Array(tags));
        }
        Ok(Value::Object(document))
    }
}

fn operation(class: &ClassEntity, method: &MethodEntity, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let mut op = Map::new();
    op.insert(
        "operationId".to_string(),
        Value::String(format!("{}.{}", lower_first(class.name()), method.name())),
    );
    if let Some(summary) = method.get_summary() {
        op.insert("summary".to_string(), Value::from(summary));
    }
    if let Some(description) = method.get_description() {
        op.insert("description".to_string(), Value::from(description));
    }

    let mut parameters = Vec::new();
    for parameter in method.parameters() {
        if let Some(body) = parameter_of(parameter, &mut parameters, ctx)? {
            op.insert("requestBody".to_string(), body);
        }
    }
    if !parameters.is_empty() {
        op.insert("parameters".to_string(), Value::Array(parameters));
    }

    op.insert("responses".to_string(), responses(method, ctx)?);
    op.insert(
        "tags".to_string(),
        Value::Array(vec![Value::from(class.name())]),
    );
    Ok(Value::Object(op))
}

/// Push the mapped form of `parameter` onto `parameters`, or return it as an
/// OpenAPI `requestBody`.
fn parameter_of(
    parameter: &JsonParameter,
    parameters: &mut Vec<Value>,
    ctx: &mut MapperContext<'_>,
) -> Result<Option<Value>> {
    let swagger = ctx.options().spec_type == SpecType::Swagger;
    let schema = exec_mapper("item", MapperArgs::Schema(parameter.schema()), ctx)?;
    match parameter.location() {
        ParamLocation::Body if swagger => {
            let mut body = base_parameter(parameter, "body");
            body.insert("name".to_string(), Value::from("body"));
            body.insert("schema".to_string(), schema);
            parameters.push(Value::Object(body));
        }
        ParamLocation::Body => {
            let mut body = Map::new();
            body.insert("required".to_string(), Value::Bool(parameter.is_required()));
            if let Some(description) = parameter.get_description() {
                body.insert("description".to_string(), Value::from(description));
            }
            body.insert(
                "content".to_string(),
                object([("application/json", object([("schema", schema)]))]),
            );
            return Ok(Some(Value::Object(body)));
        }
        ParamLocation::Query => {
            let mut query = base_parameter(parameter, "query");
            query.insert("schema".to_string(), schema);
            let mapped = exec_mapper(
                "operationInQuery",
                MapperArgs::Parameter(Value::Object(query), parameter),
                ctx,
            )?;
            match mapped {
                Value::Array(list) => parameters.extend(list),
                other => parameters.push(other),
            }
        }
        location @ (ParamLocation::Path | ParamLocation::Header | ParamLocation::Cookie) => {
            let mut param = base_parameter(parameter, &location.to_string());
            param.insert("schema".to_string(), schema);
            let param = Value::Object(param);
            parameters.push(if swagger { flatten_schema(param) } else { param });
        }
    }
    Ok(None)
}

fn responses(method: &MethodEntity, ctx: &mut MapperContext<'_>) -> Result<Value> {
    let mut success = Map::new();
    success.insert("description".to_string(), Value::from("Success"));
    if let Some(returns) = method.get_returns() {
        let schema = exec_mapper("item", MapperArgs::Schema(returns), ctx)?;
        if ctx.options().spec_type == SpecType::Swagger {
            success.insert("schema".to_string(), schema);
        } else {
            success.insert(
                "content".to_string(),
                object([("application/json", object([("schema", schema)]))]),
            );
        }
    }
    Ok(object([("200", Value::Object(success))]))
}

fn base_parameter(parameter: &JsonParameter, location: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("in".to_string(), Value::from(location));
    if let Some(name) = parameter.expression() {
        map.insert("name".to_string(), Value::from(name));
    }
    map.insert("required".to_string(), Value::Bool(parameter.is_required()));
    if let Some(description) = parameter.get_description() {
        map.insert("description".to_string(), Value::from(description));
    }
    map
}
