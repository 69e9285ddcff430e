//! Round-trip properties
//!
//! Importing, exporting back to the same dialect and importing again yields the same IR;
//! a detour through the other dialect keeps everything the side channel can carry.

mod common;

use apiconv::ir::{Document, Verb};
use apiconv::DialectKind;
use apiconv_dialects::{convert, parse, ConvertOptions};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

fn through(tree: &Value, from: DialectKind, to: DialectKind) -> Value {
    let options = ConvertOptions {
        from,
        to,
        validate: true,
        ..ConvertOptions::default()
    };
    convert(tree, &options).unwrap().tree
}

fn import(tree: &Value, dialect: DialectKind) -> Document {
    parse(tree, dialect).unwrap().document
}

#[rstest(
    fixture,
    dialect,
    case("pets.raml10.yaml", DialectKind::Raml10),
    case("pets.oas20.yaml", DialectKind::Oas20)
)]
fn same_dialect_round_trip_is_stable(fixture: &str, dialect: DialectKind) {
    let tree = common::fixture(fixture);
    let first = import(&tree, dialect);
    let second = import(&through(&tree, dialect, dialect), dialect);
    assert_eq!(first, second);
}

#[test]
fn raml_survives_a_detour_through_oas() {
    let tree = common::fixture("pets.raml10.yaml");
    let original = import(&tree, DialectKind::Raml10);

    let oas = through(&tree, DialectKind::Raml10, DialectKind::Oas20);
    let back = import(
        &through(&oas, DialectKind::Oas20, DialectKind::Raml10),
        DialectKind::Raml10,
    );

    assert_eq!(back.title, original.title);
    assert_eq!(back.version, original.version);
    assert_eq!(back.base_uri, original.base_uri);
    assert_eq!(back.types, original.types);
    assert_eq!(back.traits, original.traits);
    assert_eq!(back.resource_templates, original.resource_templates);

    let pets = back.find_resource("/pets").unwrap();
    let get = pets.method(Verb::Get).unwrap();
    let names: Vec<&str> = get.traits.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["paged"]);
    assert!(get.parameters.is_empty());
}

#[test]
fn oas_survives_a_detour_through_raml() {
    let original = common::fixture("pets.oas20.yaml");
    let raml = through(&original, DialectKind::Oas20, DialectKind::Raml10);
    assert_eq!(
        raml["/pets"]["post"]["body"]["application/json"]["(oas-body-required)"],
        json!(true)
    );

    let back = through(&raml, DialectKind::Raml10, DialectKind::Oas20);
    assert_eq!(back, original);
}

fn segment() -> impl Strategy<Value = (String, bool)> {
    ("[a-z]{1,6}", any::<bool>())
}

fn path() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..4).prop_map(|segments| {
        segments
            .into_iter()
            .enumerate()
            .map(|(depth, (word, placeholder))| match placeholder {
                true => format!("/{{p{depth}}}"),
                false => format!("/{word}"),
            })
            .collect()
    })
}

fn swagger(paths: &BTreeSet<String>) -> Value {
    let items: Map<String, Value> = paths
        .iter()
        .map(|path| {
            let operation = json!({"get": {"responses": {"200": {"description": "ok"}}}});
            (path.clone(), operation)
        })
        .collect();
    json!({
        "swagger": "2.0",
        "info": {"title": "Generated", "version": "1"},
        "paths": items
    })
}

proptest! {
    #[test]
    fn path_set_survives_nesting(paths in proptest::collection::btree_set(path(), 1..6)) {
        let raml = through(&swagger(&paths), DialectKind::Oas20, DialectKind::Raml10);
        let back = through(&raml, DialectKind::Raml10, DialectKind::Oas20);
        let keys: BTreeSet<String> = back["paths"]
            .as_object()
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default();
        prop_assert_eq!(keys, paths);
    }
}
