use schema_mapper::{
    EntityStore, Error, GenericOf, JsonSchema, JsonSchemaOptions, SchemaStore, SpecType, Type,
};
use serde_json::json;

struct Model {
    store: SchemaStore,
    catalog: schema_mapper::ClassId,
}

/// `Paginated<T>`, `Submission<T>`, `Product`, and a `Catalog` holding a
/// `Paginated<Submission<Product>>`.
fn catalog() -> anyhow::Result<Model> {
    let mut store = EntityStore::new();
    let paginated = store.class("Paginated");
    let submission = store.class("Submission");
    let product = store.class("Product");
    let catalog = store.class("Catalog");

    store
        .class_mut(paginated)?
        .generics(["T"])
        .property("data", JsonSchema::array_of(JsonSchema::generic("T")))
        .property("totalCount", JsonSchema::number());
    store
        .class_mut(submission)?
        .generics(["T"])
        .property("_id", JsonSchema::string())
        .property("data", JsonSchema::generic("T"));
    store
        .class_mut(product)?
        .property("title", JsonSchema::string());
    store.class_mut(catalog)?.property(
        "products",
        JsonSchema::class(paginated)
            .generic_of(GenericOf::new([submission]).nested([product])),
    );

    Ok(Model {
        store: store.freeze()?,
        catalog,
    })
}

#[test]
fn single_binding_overrides_the_placeholder() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let user_property = store.class("UserProperty");
    let adjustment = store.class("Adjustment");
    store
        .class_mut(user_property)?
        .generics(["T"])
        .property("value", JsonSchema::generic("T"));
    store.class_mut(adjustment)?.property(
        "value",
        JsonSchema::class(user_property).generic_of(GenericOf::new([Type::Number])),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(adjustment, &JsonSchemaOptions::new(SpecType::OpenApi))?;
    assert_eq!(
        schema["properties"]["value"],
        json!({
            "allOf": [
                {"$ref": "#/components/schemas/UserProperty"},
                {"properties": {"value": {"type": "number"}}}
            ]
        })
    );
    assert_eq!(
        schema["components"]["schemas"]["UserProperty"],
        json!({"type": "object", "properties": {"value": {}}})
    );
    Ok(())
}

#[test]
fn multi_level_bindings() -> anyhow::Result<()> {
    let model = catalog()?;
    let schema = model
        .store
        .get_json_schema(model.catalog, &JsonSchemaOptions::default())?;

    insta::assert_snapshot!(serde_json::to_string_pretty(&schema)?, @r##"
    {
      "type": "object",
      "properties": {
        "products": {
          "allOf": [
            {
              "$ref": "#/definitions/Paginated"
            },
            {
              "properties": {
                "data": {
                  "type": "array",
                  "items": {
                    "allOf": [
                      {
                        "$ref": "#/definitions/Submission"
                      },
                      {
                        "properties": {
                          "data": {
                            "$ref": "#/definitions/Product"
                          }
                        }
                      }
                    ]
                  }
                }
              }
            }
          ]
        }
      },
      "definitions": {
        "Paginated": {
          "type": "object",
          "properties": {
            "data": {
              "type": "array",
              "items": {}
            },
            "totalCount": {
              "type": "number"
            }
          }
        },
        "Submission": {
          "type": "object",
          "properties": {
            "_id": {
              "type": "string"
            },
            "data": {}
          }
        },
        "Product": {
          "type": "object",
          "properties": {
            "title": {
              "type": "string"
            }
          }
        }
      }
    }
    "##);
    Ok(())
}

#[test]
fn enum_bindings_stay_inline() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let user_property = store.class("UserProperty");
    let settings = store.class("Settings");
    store
        .class_mut(user_property)?
        .generics(["T"])
        .property("value", JsonSchema::generic("T"));
    store.class_mut(settings)?.property(
        "theme",
        JsonSchema::class(user_property)
            .generic_of(GenericOf::new([JsonSchema::enumeration(["light", "dark"])])),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(settings, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema["properties"]["theme"]["allOf"][1],
        json!({"properties": {"value": {"type": "string", "enum": ["light", "dark"]}}})
    );
    let definitions = schema["definitions"]
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("definitions missing"))?;
    assert_eq!(definitions.len(), 1);
    Ok(())
}

#[test]
fn labels_forward_through_generic_classes() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let paginated = store.class("Paginated");
    let envelope = store.class("Envelope");
    let product = store.class("Product");
    let response = store.class("Response");
    store
        .class_mut(paginated)?
        .generics(["T"])
        .property("data", JsonSchema::array_of(JsonSchema::generic("T")));
    store.class_mut(envelope)?.generics(["T"]).property(
        "payload",
        JsonSchema::class(paginated).generic_of(GenericOf::new([Type::Generic("T".into())])),
    );
    store
        .class_mut(product)?
        .property("title", JsonSchema::string());
    store.class_mut(response)?.property(
        "body",
        JsonSchema::class(envelope).generic_of(GenericOf::new([product])),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(response, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema["properties"]["body"]["allOf"][1]["properties"]["payload"],
        json!({
            "allOf": [
                {"$ref": "#/definitions/Paginated"},
                {"properties": {"data": {"type": "array", "items": {"$ref": "#/definitions/Product"}}}}
            ]
        })
    );
    Ok(())
}

fn pair() -> anyhow::Result<(SchemaStore, schema_mapper::ClassId)> {
    let mut store = EntityStore::new();
    let pair = store.class("Pair");
    let entry = store.class("Entry");
    store
        .class_mut(pair)?
        .generics(["K", "V"])
        .property("key", JsonSchema::generic("K"))
        .property("value", JsonSchema::generic("V"));
    store.class_mut(entry)?.property(
        "pair",
        JsonSchema::class(pair).generic_of(GenericOf::new([Type::String])),
    );
    Ok((store.freeze()?, entry))
}

#[test]
fn unbound_labels_keep_the_base_definition() -> anyhow::Result<()> {
    let (store, entry) = pair()?;
    let schema = store.get_json_schema(entry, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema["properties"]["pair"],
        json!({
            "allOf": [
                {"$ref": "#/definitions/Pair"},
                {"properties": {"key": {"type": "string"}}}
            ]
        })
    );
    Ok(())
}

#[test]
fn unbound_labels_fail_in_strict_mode() -> anyhow::Result<()> {
    let (store, entry) = pair()?;
    let err = store
        .get_json_schema(entry, &JsonSchemaOptions::default().strict())
        .err()
        .ok_or_else(|| anyhow::anyhow!("strict mapping should fail"))?;
    assert!(
        matches!(&err, Error::UnboundGeneric { class, label } if class == "Pair" && label == "V"),
        "unexpected error: {err}"
    );
    Ok(())
}

#[test]
fn binding_more_types_than_labels_is_rejected() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let wrapper = store.class("Wrapper");
    let holder = store.class("Holder");
    store
        .class_mut(wrapper)?
        .generics(["T"])
        .property("value", JsonSchema::generic("T"));
    store.class_mut(holder)?.property(
        "wrapped",
        JsonSchema::class(wrapper).generic_of(GenericOf::new([Type::String, Type::Number])),
    );
    let err = store
        .freeze()
        .err()
        .ok_or_else(|| anyhow::anyhow!("freeze should fail"))?;
    assert!(matches!(err, Error::Decoration { decorator: "GenericOf", .. }));
    Ok(())
}

#[test]
fn recursive_instantiations_refer_back_to_the_base() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let tree = store.class("Tree");
    let product = store.class("Product");
    let holder = store.class("Holder");
    store
        .class_mut(tree)?
        .generics(["T"])
        .property("value", JsonSchema::generic("T"))
        .property(
            "children",
            JsonSchema::array_of(
                JsonSchema::class(tree).generic_of(GenericOf::new([Type::Generic("T".into())])),
            ),
        );
    store
        .class_mut(product)?
        .property("title", JsonSchema::string());
    store.class_mut(holder)?.property(
        "root",
        JsonSchema::class(tree).generic_of(GenericOf::new([product])),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(holder, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema,
        json!({
            "type": "object",
            "properties": {
                "root": {
                    "allOf": [
                        {"$ref": "#/definitions/Tree"},
                        {"properties": {
                            "value": {"$ref": "#/definitions/Product"},
                            "children": {"type": "array", "items": {"$ref": "#/definitions/Tree"}}
                        }}
                    ]
                }
            },
            "definitions": {
                "Tree": {
                    "type": "object",
                    "properties": {
                        "value": {},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/Tree"}}
                    }
                },
                "Product": {"type": "object", "properties": {"title": {"type": "string"}}}
            }
        })
    );
    Ok(())
}

#[test]
fn unions_keep_each_instantiation() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let page = store.class("Page");
    let article = store.class("Article");
    let video = store.class("Video");
    let feed = store.class("Feed");
    store
        .class_mut(page)?
        .generics(["T"])
        .property("data", JsonSchema::generic("T"));
    store
        .class_mut(article)?
        .property("body", JsonSchema::string());
    store
        .class_mut(video)?
        .property("url", JsonSchema::string());
    store.class_mut(feed)?.property(
        "latest",
        JsonSchema::new().one_of(vec![
            JsonSchema::class(page).generic_of(GenericOf::new([article])),
            JsonSchema::class(page).generic_of(GenericOf::new([video])),
        ]),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(feed, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema["properties"]["latest"],
        json!({
            "oneOf": [
                {"allOf": [
                    {"$ref": "#/definitions/Page"},
                    {"properties": {"data": {"$ref": "#/definitions/Article"}}}
                ]},
                {"allOf": [
                    {"$ref": "#/definitions/Page"},
                    {"properties": {"data": {"$ref": "#/definitions/Video"}}}
                ]}
            ]
        })
    );
    Ok(())
}

#[test]
fn labels_inside_inline_objects_are_bound() -> anyhow::Result<()> {
    let mut store = EntityStore::new();
    let tagged = store.class("Tagged");
    let reading = store.class("Reading");
    store.class_mut(tagged)?.generics(["T"]).property(
        "meta",
        JsonSchema::object()
            .property("v", JsonSchema::generic("T"))
            .property("note", JsonSchema::string()),
    );
    store.class_mut(reading)?.property(
        "sample",
        JsonSchema::class(tagged).generic_of(GenericOf::new([Type::Number])),
    );
    let store = store.freeze()?;

    let schema = store.get_json_schema(reading, &JsonSchemaOptions::default())?;
    assert_eq!(
        schema["properties"]["sample"]["allOf"][1],
        json!({"properties": {"meta": {
            "type": "object",
            "properties": {"v": {"type": "number"}, "note": {"type": "string"}}
        }}})
    );
    Ok(())
}
