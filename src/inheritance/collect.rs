//! Collect phase: what every trait and template would contribute, and where

use super::template::{substitute, Params};
use crate::error::{ConvertError, RefKind};
use crate::ir::{
    Body, Document, Header, Method, Parameter, Resource, ResourceTemplate, Response, TemplateRef,
    Trait, Verb,
};
use crate::MAX_DEPTH;
use std::collections::HashSet;
use tracing::warn;

/// The kinds of item a fragment can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    UriParameter,
    QueryParameter,
    Header,
    Body,
    Response,
    ResponseHeader,
    ResponseBody,
    Method,
}

/// Where a contribution lands and under which name it competes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingKey {
    pub path: String,
    /// `None` targets the resource itself.
    pub method: Option<Verb>,
    pub kind: ItemKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Parameter(Parameter),
    Body(Body),
    /// The whole response as contributed; reconcile inserts it without headers and bodies,
    /// which arrive as their own items.
    Response(Response),
    ResponseHeader { code: String, header: Header },
    ResponseBody { code: String, body: Body },
    /// A method the template declares, without its items.
    Method(Method),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Trait(String),
    Template(String),
}

impl Source {
    pub fn name(&self) -> &str {
        match self {
            Source::Trait(name) | Source::Template(name) => name,
        }
    }
}

/// One contributed item, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub key: PendingKey,
    pub item: Item,
    pub source: Source,
}

pub(crate) fn header_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

pub(crate) fn response_item_key(code: &str, name: &str) -> String {
    format!("{code} {name}")
}

/// Sweep the resource tree and list every contribution in application order.
///
/// Per method the order is: the method's own traits, the resource's traits, then for each
/// template in the chain its method, that method's traits and the template's traits. Within
/// a list, declaration order is kept, so the first applied contribution wins later.
pub fn collect(doc: &Document) -> Result<Vec<Pending>, ConvertError> {
    let mut pending = Vec::new();
    for resource in &doc.resources {
        collect_resource(doc, resource, &mut pending)?;
    }
    Ok(pending)
}

fn collect_resource(
    doc: &Document,
    resource: &Resource,
    pending: &mut Vec<Pending>,
) -> Result<(), ConvertError> {
    let chain = template_chain(doc, resource)?;

    // Template methods first, so every item below has a method to land on.
    let mut verbs: Vec<Verb> = resource.methods.iter().map(|m| m.verb).collect();
    for (name, template) in &chain {
        for template_method in &template.methods {
            let verb = template_method.method.verb;
            let declared = resource.method(verb).is_some();
            if template_method.optional && !declared {
                continue;
            }
            if !verbs.contains(&verb) {
                verbs.push(verb);
            }
            let params = method_params(resource, verb, &Params::new());
            let method = substitute(&template_method.method, &params, &resource.path)?;
            pending.push(Pending {
                key: key(resource, Some(verb), ItemKind::Method, verb.as_str()),
                item: Item::Method(method_shell(&method)),
                source: Source::Template(name.clone()),
            });
        }
    }

    for verb in verbs {
        if let Some(method) = resource.method(verb) {
            for reference in &method.traits {
                apply_trait(doc, resource, verb, reference, pending)?;
            }
        }
        for reference in &resource.traits {
            apply_trait(doc, resource, verb, reference, pending)?;
        }
        for (name, template) in &chain {
            let declared = resource.method(verb).is_some();
            let template_method = template
                .methods
                .iter()
                .find(|tm| tm.method.verb == verb && (declared || !tm.optional));
            if let Some(template_method) = template_method {
                let params = method_params(resource, verb, &Params::new());
                let method = substitute(&template_method.method, &params, &resource.path)?;
                let source = Source::Template(name.clone());
                push_method_items(resource, verb, &method, &source, pending);
                for reference in &method.traits {
                    apply_trait(doc, resource, verb, reference, pending)?;
                }
            }
            for reference in &template.traits {
                apply_trait(doc, resource, verb, reference, pending)?;
            }
        }
    }

    for (name, template) in &chain {
        for parameter in &template.parameters {
            pending.push(Pending {
                key: key(resource, None, ItemKind::UriParameter, &parameter.name),
                item: Item::Parameter(parameter.clone()),
                source: Source::Template(name.clone()),
            });
        }
    }

    for child in &resource.resources {
        collect_resource(doc, child, pending)?;
    }
    Ok(())
}

fn key(resource: &Resource, method: Option<Verb>, kind: ItemKind, name: &str) -> PendingKey {
    PendingKey {
        path: resource.path.clone(),
        method,
        kind,
        name: name.to_string(),
    }
}

fn resource_params(resource: &Resource, user: &Params) -> Params {
    let mut params = user.clone();
    params.insert("resourcePath".to_string(), resource.path.clone());
    params.insert("resourcePathName".to_string(), resource.path_name());
    params
}

fn method_params(resource: &Resource, verb: Verb, user: &Params) -> Params {
    let mut params = resource_params(resource, user);
    params.insert("methodName".to_string(), verb.as_str().to_string());
    params
}

/// The resource's template and every template it inherits from, substituted, nearest first.
fn template_chain(
    doc: &Document,
    resource: &Resource,
) -> Result<Vec<(String, ResourceTemplate)>, ConvertError> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut next = resource.template.clone();
    while let Some(reference) = next.take() {
        if !visited.insert(reference.name.clone()) || chain.len() >= MAX_DEPTH {
            warn!(
                resource = %resource.path,
                template = %reference.name,
                "resource type chain loops, stopping"
            );
            break;
        }
        let template = doc.find_template(&reference.name).ok_or_else(|| {
            ConvertError::reference(RefKind::ResourceTemplate, &reference.name, &resource.path)
        })?;
        let params = resource_params(resource, &reference.parameters);
        let template = substitute(template, &params, &resource.path)?;
        next = template.template.clone();
        chain.push((reference.name, template));
    }
    Ok(chain)
}

fn apply_trait(
    doc: &Document,
    resource: &Resource,
    verb: Verb,
    reference: &TemplateRef,
    pending: &mut Vec<Pending>,
) -> Result<(), ConvertError> {
    let declared = doc
        .find_trait(&reference.name)
        .ok_or_else(|| ConvertError::reference(RefKind::Trait, &reference.name, &resource.path))?;
    let params = method_params(resource, verb, &reference.parameters);
    let fragment: Trait = substitute(declared, &params, &resource.path)?;
    let source = Source::Trait(reference.name.clone());
    push_items(
        resource,
        verb,
        &fragment.parameters,
        &fragment.headers,
        &fragment.bodies,
        &fragment.responses,
        &source,
        pending,
    );
    Ok(())
}

fn push_method_items(
    resource: &Resource,
    verb: Verb,
    method: &Method,
    source: &Source,
    pending: &mut Vec<Pending>,
) {
    push_items(
        resource,
        verb,
        &method.parameters,
        &method.headers,
        &method.bodies,
        &method.responses,
        source,
        pending,
    );
}

#[allow(clippy::too_many_arguments)]
fn push_items(
    resource: &Resource,
    verb: Verb,
    parameters: &[Parameter],
    headers: &[Header],
    bodies: &[Body],
    responses: &[Response],
    source: &Source,
    pending: &mut Vec<Pending>,
) {
    let mut push = |kind: ItemKind, name: &str, item: Item| {
        pending.push(Pending {
            key: key(resource, Some(verb), kind, name),
            item,
            source: source.clone(),
        })
    };
    for parameter in parameters {
        push(
            ItemKind::QueryParameter,
            &parameter.name,
            Item::Parameter(parameter.clone()),
        );
    }
    for header in headers {
        push(
            ItemKind::Header,
            &header_key(&header.name),
            Item::Parameter(header.clone()),
        );
    }
    for body in bodies {
        push(ItemKind::Body, &body.media_type, Item::Body(body.clone()));
    }
    for response in responses {
        push(
            ItemKind::Response,
            &response.code,
            Item::Response(response.clone()),
        );
        for header in &response.headers {
            push(
                ItemKind::ResponseHeader,
                &response_item_key(&response.code, &header_key(&header.name)),
                Item::ResponseHeader {
                    code: response.code.clone(),
                    header: header.clone(),
                },
            );
        }
        for body in &response.bodies {
            push(
                ItemKind::ResponseBody,
                &response_item_key(&response.code, &body.media_type),
                Item::ResponseBody {
                    code: response.code.clone(),
                    body: body.clone(),
                },
            );
        }
    }
}

/// A template method stripped of everything that is contributed item by item.
pub(crate) fn method_shell(method: &Method) -> Method {
    Method {
        parameters: Vec::new(),
        headers: Vec::new(),
        bodies: Vec::new(),
        responses: Vec::new(),
        traits: Vec::new(),
        ..method.clone()
    }
}

/// A response without its headers and bodies.
pub(crate) fn response_shell(response: &Response) -> Response {
    Response {
        headers: Vec::new(),
        bodies: Vec::new(),
        ..response.clone()
    }
}
