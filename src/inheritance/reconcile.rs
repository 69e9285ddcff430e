//! Reconcile phase: apply contributions with override-by-presence

use super::collect::{header_key, response_shell, Item, ItemKind, Pending};
use crate::ir::{Document, Method, Resource};
use tracing::debug;

/// The reconciled document and the contributions that actually landed.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub document: Document,
    pub applied: Vec<Pending>,
}

/// Apply pending contributions to a copy of the document, in order.
///
/// An item the target already holds (declared locally, or contributed earlier) wins and the
/// pending copy is discarded. Method shells are the exception: a declared method keeps its own
/// fields and takes the shell's only where it has none.
pub fn reconcile(doc: &Document, pending: Vec<Pending>) -> Reconciled {
    let mut document = doc.clone();
    let mut applied = Vec::new();
    for contribution in pending {
        let landed = document
            .find_resource_mut(&contribution.key.path)
            .map(|resource| apply(resource, &contribution))
            .unwrap_or(false);
        if landed {
            applied.push(contribution);
        } else {
            debug!(
                path = %contribution.key.path,
                method = ?contribution.key.method,
                kind = ?contribution.key.kind,
                name = %contribution.key.name,
                source = contribution.source.name(),
                "contribution discarded, target already declares it"
            );
        }
    }
    Reconciled { document, applied }
}

fn apply(resource: &mut Resource, contribution: &Pending) -> bool {
    let key = &contribution.key;
    let Some(verb) = key.method else {
        return match &contribution.item {
            Item::Parameter(parameter) if key.kind == ItemKind::UriParameter => {
                if resource.parameters.iter().any(|p| p.name == parameter.name) {
                    false
                } else {
                    resource.parameters.push(parameter.clone());
                    true
                }
            }
            _ => false,
        };
    };

    if let Item::Method(shell) = &contribution.item {
        return match resource.method_mut(verb) {
            Some(method) => fill_absent(method, shell),
            None => {
                resource.methods.push(shell.clone());
                true
            }
        };
    }

    let Some(method) = resource.method_mut(verb) else {
        return false;
    };

    match &contribution.item {
        Item::Parameter(parameter) if key.kind == ItemKind::Header => {
            let name = header_key(&parameter.name);
            if method.headers.iter().any(|h| header_key(&h.name) == name) {
                return false;
            }
            method.headers.push(parameter.clone());
        }
        Item::Parameter(parameter) => {
            if method.parameters.iter().any(|p| p.name == parameter.name) {
                return false;
            }
            method.parameters.push(parameter.clone());
        }
        Item::Body(body) => {
            if method.bodies.iter().any(|b| b.media_type == body.media_type) {
                return false;
            }
            method.bodies.push(body.clone());
        }
        Item::Response(response) => {
            if method.response(&response.code).is_some() {
                return false;
            }
            method.responses.push(response_shell(response));
        }
        Item::ResponseHeader { code, header } => {
            let Some(response) = method.responses.iter_mut().find(|r| &r.code == code) else {
                return false;
            };
            let name = header_key(&header.name);
            if response.headers.iter().any(|h| header_key(&h.name) == name) {
                return false;
            }
            response.headers.push(header.clone());
        }
        Item::ResponseBody { code, body } => {
            let Some(response) = method.responses.iter_mut().find(|r| &r.code == code) else {
                return false;
            };
            if response.bodies.iter().any(|b| b.media_type == body.media_type) {
                return false;
            }
            response.bodies.push(body.clone());
        }
        Item::Method(_) => return false,
    }
    true
}

/// Copy the shell's fields into the ones `method` leaves empty. True when anything changed.
fn fill_absent(method: &mut Method, shell: &Method) -> bool {
    let mut filled = false;
    if method.display_name.is_none() && shell.display_name.is_some() {
        method.display_name = shell.display_name.clone();
        filled = true;
    }
    if method.description.is_none() && shell.description.is_some() {
        method.description = shell.description.clone();
        filled = true;
    }
    if method.security.is_none() && shell.security.is_some() {
        method.security = shell.security.clone();
        filled = true;
    }
    if method.protocols.is_empty() && !shell.protocols.is_empty() {
        method.protocols = shell.protocols.clone();
        filled = true;
    }
    for annotation in &shell.annotations {
        if !method.annotations.iter().any(|a| a.name == annotation.name) {
            method.annotations.push(annotation.clone());
            filled = true;
        }
    }
    filled
}
