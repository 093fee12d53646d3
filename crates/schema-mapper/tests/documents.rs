use schema_mapper::{
    EntityStore, Error, HttpVerb, Info, JsonParameter, JsonSchema, JsonSchemaOptions,
    MethodEntity, SchemaStore, SpecOptions, SpecType,
};
use serde_json::json;

/// A `UserController` mounted at `/users` with read, search and create
/// operations.
fn users() -> anyhow::Result<SchemaStore> {
    let mut store = EntityStore::new();
    let user = store.class("User");
    let filter = store.class("UserFilter");
    let sort = store.class("Sort");
    let controller = store.class("UserController");

    store
        .class_mut(user)?
        .property("id", JsonSchema::string().read_only(true).required(true))
        .property("name", JsonSchema::string().min_length(1))
        .property("nickname", JsonSchema::string().nullable(true));
    store
        .class_mut(sort)?
        .property("by", JsonSchema::string())
        .property("order", JsonSchema::enumeration(["asc", "desc"]));
    store
        .class_mut(filter)?
        .property(
            "name",
            JsonSchema::string().description("Prefix match").required(true),
        )
        .property("sort", JsonSchema::class(sort));
    store
        .class_mut(controller)?
        .controller("/users")
        .method(
            MethodEntity::new("get")
                .route(HttpVerb::Get, "/:id")
                .parameter(JsonParameter::path("id", JsonSchema::string()))
                .returns(user)
                .summary("Fetch one user"),
        )
        .method(
            MethodEntity::new("search")
                .route(HttpVerb::Get, "/")
                .parameter(JsonParameter::query_object(filter))
                .parameter(JsonParameter::query("page", JsonSchema::integer().minimum(1)))
                .returns(JsonSchema::array_of(user)),
        )
        .method(
            MethodEntity::new("create")
                .route(HttpVerb::Post, "/")
                .parameter(JsonParameter::body(user).required(true))
                .returns(user),
        )
        .method(MethodEntity::new("helper"));

    Ok(store.freeze()?)
}

fn spec_options(spec_type: SpecType) -> SpecOptions {
    SpecOptions {
        info: Info {
            title: "Users".to_string(),
            version: "2.1.0".to_string(),
            description: None,
        },
        schema: JsonSchemaOptions::new(spec_type),
    }
}

#[test]
fn openapi_document_layout() -> anyhow::Result<()> {
    let spec = users()?.get_spec(&spec_options(SpecType::OpenApi))?;

    assert_eq!(spec["openapi"], json!("3.0.1"));
    assert_eq!(spec["info"], json!({"title": "Users", "version": "2.1.0"}));
    assert_eq!(spec["tags"], json!([{"name": "UserController"}]));

    let paths = spec["paths"]
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("paths missing"))?;
    assert_eq!(
        paths.keys().collect::<Vec<_>>(),
        ["/users/{id}", "/users"]
    );

    let get = &spec["paths"]["/users/{id}"]["get"];
    assert_eq!(get["operationId"], json!("userController.get"));
    assert_eq!(get["summary"], json!("Fetch one user"));
    assert_eq!(get["tags"], json!(["UserController"]));
    assert_eq!(
        get["parameters"],
        json!([{"in": "path", "name": "id", "required": true, "schema": {"type": "string"}}])
    );
    assert_eq!(
        get["responses"],
        json!({
            "200": {
                "description": "Success",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
            }
        })
    );
    Ok(())
}

#[test]
fn openapi_request_body_and_components() -> anyhow::Result<()> {
    let spec = users()?.get_spec(&spec_options(SpecType::OpenApi))?;

    let create = &spec["paths"]["/users"]["post"];
    assert_eq!(
        create["requestBody"],
        json!({
            "required": true,
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}
        })
    );
    assert!(create.get("parameters").is_none());

    assert_eq!(
        spec["components"]["schemas"]["User"],
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "readOnly": true},
                "name": {"type": "string", "minLength": 1},
                "nickname": {"type": "string", "nullable": true}
            },
            "required": ["id"]
        })
    );
    Ok(())
}

#[test]
fn query_models_are_exploded() -> anyhow::Result<()> {
    let spec = users()?.get_spec(&spec_options(SpecType::OpenApi))?;
    assert_eq!(
        spec["paths"]["/users"]["get"]["parameters"],
        json!([
            {
                "in": "query",
                "name": "name",
                "required": true,
                "description": "Prefix match",
                "schema": {"type": "string"}
            },
            {
                "in": "query",
                "name": "sort",
                "required": false,
                "style": "deepObject",
                "schema": {"$ref": "#/components/schemas/Sort"}
            },
            {
                "in": "query",
                "name": "page",
                "required": false,
                "schema": {"type": "integer", "minimum": 1}
            }
        ])
    );
    Ok(())
}

#[test]
fn swagger_document_layout() -> anyhow::Result<()> {
    let spec = users()?.get_spec(&spec_options(SpecType::Swagger))?;

    assert_eq!(spec["swagger"], json!("2.0"));
    assert!(spec.get("components").is_none());
    assert_eq!(
        spec["definitions"]["User"]["properties"]["nickname"],
        json!({"type": "string", "x-nullable": true})
    );

    let get = &spec["paths"]["/users/{id}"]["get"];
    assert_eq!(
        get["parameters"],
        json!([{"in": "path", "name": "id", "required": true, "type": "string"}])
    );
    assert_eq!(
        get["responses"]["200"],
        json!({"description": "Success", "schema": {"$ref": "#/definitions/User"}})
    );

    let create = &spec["paths"]["/users"]["post"];
    assert!(create.get("requestBody").is_none());
    assert_eq!(
        create["parameters"],
        json!([{
            "in": "body",
            "name": "body",
            "required": true,
            "schema": {"$ref": "#/definitions/User"}
        }])
    );

    let search = &spec["paths"]["/users"]["get"]["parameters"];
    assert_eq!(
        search[0],
        json!({
            "in": "query",
            "name": "name",
            "required": true,
            "description": "Prefix match",
            "type": "string"
        })
    );
    assert_eq!(search[1]["schema"], json!({"$ref": "#/definitions/Sort"}));
    Ok(())
}

#[test]
fn schema_only_targets_are_rejected() -> anyhow::Result<()> {
    let store = users()?;
    for spec_type in [SpecType::Json, SpecType::AsyncApi] {
        let err = store
            .get_spec(&spec_options(spec_type))
            .err()
            .ok_or_else(|| anyhow::anyhow!("{spec_type} should be rejected"))?;
        assert!(matches!(err, Error::UnsupportedSpec(rejected) if rejected == spec_type));
    }
    Ok(())
}

#[test]
fn stores_without_controllers_give_empty_documents() -> anyhow::Result<()> {
    let store = EntityStore::new().freeze()?;
    let spec = store.get_spec(&SpecOptions {
        schema: JsonSchemaOptions::new(SpecType::OpenApi),
        ..SpecOptions::default()
    })?;
    assert_eq!(
        spec,
        json!({
            "openapi": "3.0.1",
            "info": {"title": "Api documentation", "version": "1.0.0"},
            "paths": {}
        })
    );
    Ok(())
}

#[test]
fn repeated_calls_are_memoized() -> anyhow::Result<()> {
    let store = users()?;
    let user = store
        .find_class("User")
        .ok_or_else(|| anyhow::anyhow!("User missing"))?;
    let options = JsonSchemaOptions::new(SpecType::OpenApi);

    let first = store.get_json_schema(user, &options)?;
    let second = store.get_json_schema(user, &options)?;
    assert_eq!(first, second);

    let swagger = store.get_json_schema(user, &JsonSchemaOptions::new(SpecType::Swagger))?;
    assert_eq!(swagger["properties"]["nickname"]["x-nullable"], json!(true));
    Ok(())
}
