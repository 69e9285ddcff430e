//! Inheritance Resolver
//!
//!     RAML reuses request and response shape through named fragments: traits mixed into
//!     methods with `is:`, resource types instantiated with `type:`. OAS has neither, only
//!     global parameter and response catalogs. The resolver moves between the two.
//!
//! The Algorithm
//!
//!     Export (flatten) is a two-phase sweep:
//!
//!     1. Collect: every contribution of every trait and template is listed, keyed by
//!        (resource path, method or the resource itself, item kind, item name), with template
//!        parameters already substituted. Nothing is modified.
//!     2. Reconcile: contributions are applied to a copy of the document in order. An item the
//!        target already declares wins and the contribution is dropped, so local declarations
//!        override fragments and, between two fragments, the first one applied wins.
//!
//!     Then references are removed (or kept as `type`/`is` annotations when templates are
//!     preserved) and, optionally, unchanged trait items are moved into the shared catalogs.
//!
//!     Import (reconstruct) runs the other way: catalog references become trait
//!     applications again, and items identical to what a referenced fragment contributes are
//!     removed from the concrete node, so a later flatten brings them back unchanged.
//!
//!     Flattening a document without references is a no-op.

mod catalog;
mod collect;
mod reconcile;
pub mod template;

pub use catalog::{parse_trait_key, trait_key};
pub use collect::{collect, Item, ItemKind, Pending, PendingKey, Source};
pub use reconcile::{reconcile, Reconciled};

use crate::error::{ConvertError, RefKind};
use crate::ir::{
    set_annotation, take_annotation, Annotation, AnnotationValue, Document, Method, Resource,
    SecurityRequirement, TemplateRef,
};
use collect::{header_key, response_shell};
use std::collections::HashSet;
use template::has_placeholder;

/// Annotation holding a resource's template application once references are removed.
pub const TYPE_ANNOTATION: &str = "type";
/// Annotation holding trait applications once references are removed.
pub const IS_ANNOTATION: &str = "is";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Move unchanged trait items into the shared catalogs as `trait:<trait>:<name>`.
    pub trait_catalog: bool,
    /// Keep template and trait applications as `type`/`is` annotations.
    pub preserve_templates: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            trait_catalog: true,
            preserve_templates: true,
        }
    }
}

/// Apply every trait and template to the resources and methods that use them.
pub fn flatten(doc: &Document, options: FlattenOptions) -> Result<Document, ConvertError> {
    check_references(doc)?;
    let pending = collect(doc)?;
    let Reconciled {
        mut document,
        applied,
    } = reconcile(doc, pending);
    if options.trait_catalog {
        catalog::catalog_trait_items(&mut document, &applied);
    }
    document.walk_resources_mut(&mut |resource| {
        strip_references(resource, options.preserve_templates)
    });
    Ok(document)
}

/// Turn inline duplication back into named references.
pub fn reconstruct(doc: Document) -> Result<Document, ConvertError> {
    let mut doc = doc;
    doc.walk_resources_mut(&mut restore_references);
    catalog::apply_catalog_references(&mut doc)?;
    check_references(&doc)?;
    let pending = collect(&doc)?;
    strip_contributed(&mut doc, &pending);
    Ok(doc)
}

/// Every trait, template and security scheme named anywhere must be declared.
pub fn check_references(doc: &Document) -> Result<(), ConvertError> {
    let check = |kind: RefKind, name: &str, at: &str| -> Result<(), ConvertError> {
        if has_placeholder(name) {
            return Ok(());
        }
        let declared = match kind {
            RefKind::Trait => doc.find_trait(name).is_some(),
            RefKind::ResourceTemplate => doc.find_template(name).is_some(),
            RefKind::SecurityScheme => name == "null" || doc.find_security_scheme(name).is_some(),
            _ => true,
        };
        if declared {
            Ok(())
        } else {
            Err(ConvertError::reference(kind, name, at))
        }
    };
    let check_security = |requirements: &Option<Vec<SecurityRequirement>>, at: &str| {
        requirements
            .iter()
            .flatten()
            .try_for_each(|r| check(RefKind::SecurityScheme, &r.scheme, at))
    };
    let check_method = |method: &Method, at: &str| -> Result<(), ConvertError> {
        for reference in &method.traits {
            check(RefKind::Trait, &reference.name, at)?;
        }
        check_security(&method.security, at)
    };

    check_security(&doc.security, "/securedBy")?;
    for template in &doc.resource_templates {
        let at = format!("/resourceTypes/{}", template.name);
        if let Some(parent) = &template.template {
            check(RefKind::ResourceTemplate, &parent.name, &at)?;
        }
        for reference in &template.traits {
            check(RefKind::Trait, &reference.name, &at)?;
        }
        for template_method in &template.methods {
            check_method(&template_method.method, &at)?;
        }
    }

    let mut result: Result<(), ConvertError> = Ok(());
    doc.walk_resources(&mut |resource: &Resource| {
        if result.is_err() {
            return;
        }
        result = (|| -> Result<(), ConvertError> {
            if let Some(reference) = &resource.template {
                check(RefKind::ResourceTemplate, &reference.name, &resource.path)?;
            }
            for reference in &resource.traits {
                check(RefKind::Trait, &reference.name, &resource.path)?;
            }
            check_security(&resource.security, &resource.path)?;
            for method in &resource.methods {
                check_method(method, &format!("{}/{}", resource.path, method.verb))?;
            }
            Ok(())
        })();
    });
    result
}

fn references_json(references: &[TemplateRef]) -> AnnotationValue {
    AnnotationValue::Sequence(
        references
            .iter()
            .map(|reference| AnnotationValue::from_json(&reference.to_json()))
            .collect(),
    )
}

fn references_from(value: &AnnotationValue) -> Vec<TemplateRef> {
    match value {
        AnnotationValue::Sequence(items) => items
            .iter()
            .filter_map(|item| TemplateRef::from_json(&item.to_json()))
            .collect(),
        single => TemplateRef::from_json(&single.to_json()).into_iter().collect(),
    }
}

fn strip_references(resource: &mut Resource, preserve: bool) {
    if let Some(reference) = resource.template.take() {
        if preserve {
            set_annotation(
                &mut resource.annotations,
                Annotation::new(
                    TYPE_ANNOTATION,
                    AnnotationValue::from_json(&reference.to_json()),
                ),
            );
        }
    }
    let traits = std::mem::take(&mut resource.traits);
    if preserve && !traits.is_empty() {
        set_annotation(
            &mut resource.annotations,
            Annotation::new(IS_ANNOTATION, references_json(&traits)),
        );
    }
    for method in &mut resource.methods {
        let traits = std::mem::take(&mut method.traits);
        if preserve && !traits.is_empty() {
            set_annotation(
                &mut method.annotations,
                Annotation::new(IS_ANNOTATION, references_json(&traits)),
            );
        }
    }
}

fn restore_references(resource: &mut Resource) {
    if let Some(value) = take_annotation(&mut resource.annotations, TYPE_ANNOTATION) {
        if resource.template.is_none() {
            resource.template = TemplateRef::from_json(&value.to_json());
        }
    }
    if let Some(value) = take_annotation(&mut resource.annotations, IS_ANNOTATION) {
        if resource.traits.is_empty() {
            resource.traits = references_from(&value);
        }
    }
    for method in &mut resource.methods {
        if let Some(value) = take_annotation(&mut method.annotations, IS_ANNOTATION) {
            if method.traits.is_empty() {
                method.traits = references_from(&value);
            }
        }
    }
}

/// Remove concrete items that equal the contribution a flatten would apply for their key.
fn strip_contributed(doc: &mut Document, pending: &[Pending]) {
    let mut seen = HashSet::new();
    let winners: Vec<&Pending> = pending
        .iter()
        .filter(|p| seen.insert(p.key.clone()))
        .collect();

    // A shell can only go once everything inside it has gone.
    let pass_of = |kind: ItemKind| match kind {
        ItemKind::Response => 1,
        ItemKind::Method => 2,
        _ => 0,
    };
    for pass in 0..3 {
        for contribution in winners.iter().filter(|p| pass_of(p.key.kind) == pass) {
            if let Some(resource) = doc.find_resource_mut(&contribution.key.path) {
                remove_identical(resource, contribution);
            }
        }
    }
}

fn remove_identical(resource: &mut Resource, contribution: &Pending) {
    let key = &contribution.key;
    let Some(verb) = key.method else {
        if let Item::Parameter(parameter) = &contribution.item {
            resource.parameters.retain(|p| p != parameter);
        }
        return;
    };
    if let Item::Method(shell) = &contribution.item {
        resource
            .methods
            .retain(|method| method.verb != verb || method != shell);
        if let Some(method) = resource.method_mut(verb) {
            clear_inherited(method, shell);
        }
        return;
    }
    let Some(method) = resource.method_mut(verb) else {
        return;
    };
    match &contribution.item {
        Item::Parameter(parameter) if key.kind == ItemKind::Header => {
            method.headers.retain(|h| h != parameter);
        }
        Item::Parameter(parameter) => method.parameters.retain(|p| p != parameter),
        Item::Body(body) => method.bodies.retain(|b| b != body),
        Item::Response(full) => {
            let shell = response_shell(full);
            method.responses.retain(|r| *r != shell);
        }
        Item::ResponseHeader { code, header } => {
            if let Some(response) = method.responses.iter_mut().find(|r| &r.code == code) {
                let name = header_key(&header.name);
                response
                    .headers
                    .retain(|h| header_key(&h.name) != name || h != header);
            }
        }
        Item::ResponseBody { code, body } => {
            if let Some(response) = method.responses.iter_mut().find(|r| &r.code == code) {
                response.bodies.retain(|b| b != body);
            }
        }
        Item::Method(_) => {}
    }
}

/// Drop the fields of a kept method that a flatten would fill from `shell` anyway.
fn clear_inherited(method: &mut Method, shell: &Method) {
    if method.display_name.is_some() && method.display_name == shell.display_name {
        method.display_name = None;
    }
    if method.description.is_some() && method.description == shell.description {
        method.description = None;
    }
    if method.security.is_some() && method.security == shell.security {
        method.security = None;
    }
    if !method.protocols.is_empty() && method.protocols == shell.protocols {
        method.protocols.clear();
    }
    method
        .annotations
        .retain(|a| !shell.annotations.contains(a));
}
