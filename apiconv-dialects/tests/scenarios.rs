//! End-to-end behavior of the conversion pipeline on small documents
//!
//! Each test converts a native tree through the public API and checks the exact shape of the
//! output, since the fallbacks and precedence rules are part of the contract.

mod common;

use apiconv::ir::{InternalType, TypeKind, Verb};
use apiconv::DialectKind;
use apiconv_dialects::{convert, parse, ConvertOptions, ExportOptions};
use serde_json::{json, Value};

fn options(from: DialectKind, to: DialectKind) -> ConvertOptions {
    ConvertOptions {
        from,
        to,
        validate: true,
        ..ConvertOptions::default()
    }
}

fn parameters_named<'a>(operation: &'a Value, name: &str) -> Vec<&'a Value> {
    operation["parameters"]
        .as_array()
        .map(|items| items.iter().filter(|p| p["name"] == json!(name)).collect())
        .unwrap_or_default()
}

#[test]
fn template_parameter_lands_on_the_method() {
    let raml = json!({
        "title": "Items",
        "resourceTypes": {
            "collection": {"get": {"queryParameters": {"page": "integer"}}}
        },
        "/items": {"type": "collection"}
    });
    let tree = convert(&raml, &options(DialectKind::Raml10, DialectKind::Oas20))
        .unwrap()
        .tree;

    let item = &tree["paths"]["/items"];
    let page = parameters_named(&item["get"], "page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["in"], json!("query"));
    assert_eq!(page[0]["type"], json!("integer"));
    assert!(item.get("parameters").is_none());
}

#[test]
fn datetime_survives_the_trip_through_raml() {
    let oas = json!({
        "swagger": "2.0",
        "info": {"title": "Events", "version": "1"},
        "paths": {},
        "definitions": {
            "Event": {
                "type": "object",
                "required": ["created"],
                "properties": {"created": {"type": "string", "format": "date-time"}}
            }
        }
    });
    let raml = convert(&oas, &options(DialectKind::Oas20, DialectKind::Raml10))
        .unwrap()
        .tree;

    let doc = parse(&raml, DialectKind::Raml10).unwrap().document;
    let TypeKind::Object(event) = &doc.find_type("Event").unwrap().kind else {
        panic!("expected an object");
    };
    assert_eq!(event.properties[0].schema.tag(), Some(InternalType::DateTime));

    let back = convert(&raml, &options(DialectKind::Raml10, DialectKind::Oas20))
        .unwrap()
        .tree;
    assert_eq!(
        back["definitions"]["Event"]["properties"]["created"],
        json!({"type": "string", "format": "date-time"})
    );
}

#[test]
fn raml_only_date_types_travel_as_string_plus_annotation() {
    let raml = json!({
        "title": "Events",
        "types": {"Event": {"properties": {"at": "datetime-only"}}}
    });
    let oas = convert(&raml, &options(DialectKind::Raml10, DialectKind::Oas20))
        .unwrap()
        .tree;
    assert_eq!(
        oas["definitions"]["Event"]["properties"]["at"],
        json!({"type": "string", "x-raml-type": "datetime-only"})
    );

    let doc = parse(&oas, DialectKind::Oas20).unwrap().document;
    let TypeKind::Object(event) = &doc.find_type("Event").unwrap().kind else {
        panic!("expected an object");
    };
    assert_eq!(
        event.properties[0].schema.tag(),
        Some(InternalType::DateTimeOnly)
    );
}

#[test]
fn path_parameter_moves_to_the_segment_that_mentions_it() {
    let raml = json!({
        "title": "Nested",
        "/a/{id}": {
            "get": null,
            "/b": {
                "uriParameters": {"id": "integer"},
                "get": null
            }
        }
    });
    let tree = convert(&raml, &options(DialectKind::Raml10, DialectKind::Raml10))
        .unwrap()
        .tree;

    assert_eq!(tree["/a/{id}"]["uriParameters"], json!({"id": "integer"}));
    assert!(tree["/a/{id}"]["/b"].get("uriParameters").is_none());

    let doc = parse(&tree, DialectKind::Raml10).unwrap().document;
    let a = doc.find_resource("/a/{id}").unwrap();
    assert_eq!(a.parameters.len(), 1);
    assert!(doc.find_resource("/a/{id}/b").unwrap().parameters.is_empty());
}

#[test]
fn first_applied_trait_wins_a_header() {
    let raml = json!({
        "title": "Flags",
        "traits": {
            "t1": {"responses": {"200": {"headers": {"X-Flag": "string"}}}},
            "t2": {"responses": {"200": {"headers": {"X-Flag": "integer"}}}}
        },
        "/flags": {"get": {"is": ["t1", "t2"]}}
    });
    let mut options = options(DialectKind::Raml10, DialectKind::Oas20);
    options.export = ExportOptions {
        trait_catalog: false,
        ..ExportOptions::default()
    };
    let tree = convert(&raml, &options).unwrap().tree;

    let headers = &tree["paths"]["/flags"]["get"]["responses"]["200"]["headers"];
    assert_eq!(headers.as_object().unwrap().len(), 1);
    assert_eq!(headers["X-Flag"]["type"], json!("string"));
}

#[test]
fn info_block_survives_oas_to_raml_and_back() {
    let original = common::fixture("pets.oas20.yaml");
    let raml = convert(&original, &options(DialectKind::Oas20, DialectKind::Raml10))
        .unwrap()
        .tree;
    assert_eq!(raml["(oas-info)"]["license"]["name"], json!("MIT"));

    let back = convert(&raml, &options(DialectKind::Raml10, DialectKind::Oas20))
        .unwrap()
        .tree;
    assert_eq!(back["info"], original["info"]);
}

#[test]
fn resource_type_methods_exist_after_flattening() {
    let raml = common::fixture("pets.raml10.yaml");
    let tree = convert(&raml, &options(DialectKind::Raml10, DialectKind::Oas30))
        .unwrap()
        .tree;
    assert_eq!(
        tree["paths"]["/pets"]["get"]["description"],
        json!("List every pets")
    );

    let doc = parse(&raml, DialectKind::Raml10).unwrap().document;
    let pets = doc.find_resource("/pets").unwrap();
    assert!(pets.method(Verb::Get).unwrap().description.is_none());
}

#[test]
fn trait_parameters_fill_numeric_facets() {
    let raml = json!({
        "title": "Items",
        "traits": {
            "paged": {
                "queryParameters": {
                    "limit": {"type": "integer", "maximum": "<<max>>"}
                }
            }
        },
        "/items": {"get": {"is": [{"paged": {"max": "10"}}]}}
    });
    let mut forward = options(DialectKind::Raml10, DialectKind::Oas20);
    forward.export = ExportOptions {
        trait_catalog: false,
        ..ExportOptions::default()
    };
    let tree = convert(&raml, &forward).unwrap().tree;

    let limit = parameters_named(&tree["paths"]["/items"]["get"], "limit");
    assert_eq!(limit.len(), 1);
    assert_eq!(limit[0]["type"], json!("integer"));
    assert_eq!(limit[0]["maximum"], json!(10));

    let back = convert(&tree, &options(DialectKind::Oas20, DialectKind::Raml10))
        .unwrap()
        .tree;
    assert_eq!(
        back["traits"]["paged"]["queryParameters"]["limit"]["maximum"],
        json!("<<max>>")
    );
}
