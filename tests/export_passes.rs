//! The export passes run in sequence: flattening, then path-parameter propagation
//!
//! These tests drive the public passes the way an exporter does and check the combined
//! result, independent of any dialect.

use apiconv::ir::{
    InternalType, Location, Method, Parameter, Resource, ResourceTemplate, TemplateMethod,
    TemplateRef, Type, Verb,
};
use apiconv::{flatten, propagate, Document, FlattenOptions};
use rstest::rstest;

fn id_template() -> ResourceTemplate {
    let mut template = ResourceTemplate::new("member");
    template.parameters.push(Parameter::new(
        "id",
        Location::Path,
        Type::scalar(InternalType::Integer),
    ));
    template.methods.push(TemplateMethod {
        method: Method::new(Verb::Get),
        optional: false,
    });
    template
}

/// `/a/{id}` with a child `/b` that applies the `member` template.
fn nested() -> Document {
    let mut doc = Document::new("Nested");
    doc.resource_templates.push(id_template());
    let mut a = Resource::new("", "/a/{id}");
    let mut b = Resource::new("/a/{id}", "/b");
    b.template = Some(TemplateRef::new("member"));
    a.resources.push(b);
    doc.resources.push(a);
    doc
}

fn export_passes(doc: &Document, options: FlattenOptions) -> Document {
    propagate(flatten(doc, options).unwrap())
}

#[rstest(
    preserve_templates,
    case(false),
    case(true)
)]
fn template_uri_parameter_lands_on_the_mentioning_segment(preserve_templates: bool) {
    let options = FlattenOptions {
        trait_catalog: false,
        preserve_templates,
    };
    let doc = export_passes(&nested(), options);

    let a = doc.find_resource("/a/{id}").unwrap();
    let names: Vec<&str> = a.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id"]);

    let b = doc.find_resource("/a/{id}/b").unwrap();
    assert!(b.parameters.is_empty());
    assert!(b.method(Verb::Get).is_some());
    assert!(doc.base_uri_parameters.is_empty());
}

#[test]
fn export_passes_are_idempotent() {
    let options = FlattenOptions {
        trait_catalog: false,
        preserve_templates: false,
    };
    let once = export_passes(&nested(), options);
    let twice = export_passes(&once, options);
    assert_eq!(once, twice);
}

#[test]
fn unmentioned_template_parameter_is_kept_at_the_root() {
    let mut doc = nested();
    doc.resource_templates[0].parameters[0].name = "tenant".to_string();
    let options = FlattenOptions {
        trait_catalog: false,
        preserve_templates: false,
    };
    let doc = export_passes(&doc, options);
    let names: Vec<&str> = doc
        .base_uri_parameters
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["tenant"]);
}
