//! Trait items in the shared parameter and response catalogs
//!
//! OAS has no traits, only global `parameters` and `responses`. When flattening for OAS, a
//! trait-contributed parameter or response that landed unchanged is written once into the
//! catalog under `trait:<trait>:<name>` and referenced from every operation. Importing reads
//! those keys back into traits and trait applications.

use super::collect::{Item, ItemKind, Pending, Source};
use crate::error::{ConvertError, RefKind};
use crate::ir::{Document, Location, Named, Parameter, Shape, TemplateRef, Trait};
use std::collections::HashSet;

const TRAIT_PREFIX: &str = "trait:";

pub fn trait_key(trait_name: &str, item: &str) -> String {
    format!("{TRAIT_PREFIX}{trait_name}:{item}")
}

/// Split `trait:<trait>:<name>` into its parts.
pub fn parse_trait_key(key: &str) -> Option<(&str, &str)> {
    key.strip_prefix(TRAIT_PREFIX)?
        .split_once(':')
        .filter(|(name, item)| !name.is_empty() && !item.is_empty())
}

/// Replace applied, unchanged trait items with catalog references.
pub(super) fn catalog_trait_items(doc: &mut Document, applied: &[Pending]) {
    for contribution in applied {
        let Source::Trait(trait_name) = &contribution.source else {
            continue;
        };
        let Some(verb) = contribution.key.method else {
            continue;
        };
        match (&contribution.item, contribution.key.kind) {
            (Item::Parameter(parameter), ItemKind::QueryParameter | ItemKind::Header) => {
                let key = trait_key(trait_name, &parameter.name);
                if !admit(&mut doc.parameters, &key, parameter) {
                    continue;
                }
                let header = contribution.key.kind == ItemKind::Header;
                let target = doc
                    .find_resource_mut(&contribution.key.path)
                    .and_then(|resource| resource.method_mut(verb))
                    .map(|method| {
                        if header {
                            &mut method.headers
                        } else {
                            &mut method.parameters
                        }
                    });
                if let Some(items) = target {
                    if let Some(item) = items
                        .iter_mut()
                        .find(|p| p.same_name(&parameter.name) && **p == *parameter)
                    {
                        item.shape = Shape::Ref(key);
                    }
                }
            }
            (Item::Response(full), ItemKind::Response) => {
                let key = trait_key(trait_name, &full.code);
                let landed_unchanged = doc
                    .find_resource(&contribution.key.path)
                    .and_then(|resource| resource.method(verb))
                    .and_then(|method| method.response(&full.code))
                    .is_some_and(|response| response == full);
                if !landed_unchanged || !admit(&mut doc.responses, &key, full) {
                    continue;
                }
                if let Some(response) = doc
                    .find_resource_mut(&contribution.key.path)
                    .and_then(|resource| resource.method_mut(verb))
                    .and_then(|method| method.responses.iter_mut().find(|r| r.code == full.code))
                {
                    response.reference = Some(key);
                }
            }
            _ => {}
        }
    }
}

/// Add `item` to the catalog under `key` unless a different item already holds the key.
fn admit<T: Clone + PartialEq>(catalog: &mut Vec<Named<T>>, key: &str, item: &T) -> bool {
    match catalog.iter().find(|entry| entry.name == key) {
        Some(existing) => existing.item == *item,
        None => {
            catalog.push(Named::new(key, item.clone()));
            true
        }
    }
}

/// Rebuild traits from `trait:` catalog entries and from plain query/header catalog entries,
/// then turn references to them into trait applications.
pub(super) fn apply_catalog_references(doc: &mut Document) -> Result<(), ConvertError> {
    let referenced_plain = referenced_plain_keys(doc);

    let mut remaining = Vec::new();
    for entry in std::mem::take(&mut doc.parameters) {
        if let Some((trait_name, _)) = parse_trait_key(&entry.name) {
            add_trait_parameter(doc, trait_name, entry.item);
        } else if referenced_plain.contains(&entry.name) && is_trait_location(&entry.item) {
            let name = entry.name.clone();
            add_trait_parameter(doc, &name, entry.item);
        } else {
            remaining.push(entry);
        }
    }
    doc.parameters = remaining;

    let mut remaining = Vec::new();
    for entry in std::mem::take(&mut doc.responses) {
        match parse_trait_key(&entry.name) {
            Some((trait_name, code)) => {
                let mut response = entry.item;
                response.code = code.to_string();
                response.reference = None;
                let target = ensure_trait(doc, trait_name);
                if target.responses.iter().all(|r| r.code != response.code) {
                    target.responses.push(response);
                }
            }
            None => remaining.push(entry),
        }
    }
    doc.responses = remaining;

    let traits: HashSet<String> = doc.traits.iter().map(|t| t.name.clone()).collect();
    let catalog = doc.parameters.clone();
    let mut failure = None;
    doc.walk_resources_mut(&mut |resource| {
        for parameter in &mut resource.parameters {
            let Some(key) = parameter.shape.catalog_key().map(str::to_string) else {
                continue;
            };
            match catalog.iter().find(|entry| entry.name == key) {
                Some(entry) => *parameter = entry.item.clone(),
                None => {
                    failure.get_or_insert_with(|| {
                        ConvertError::reference(RefKind::Parameter, &key, &resource.path)
                    });
                }
            }
        }
        for method in &mut resource.methods {
            let mut applied: Vec<String> = Vec::new();
            for list in [&mut method.parameters, &mut method.headers] {
                let mut kept = Vec::with_capacity(list.len());
                for parameter in list.drain(..) {
                    let key = match &parameter.shape {
                        Shape::Ref(key) => Some(key.clone()),
                        Shape::Inline(_) => None,
                    };
                    let Some(key) = key else {
                        kept.push(parameter);
                        continue;
                    };
                    let trait_name = parse_trait_key(&key)
                        .map(|(name, _)| name.to_string())
                        .unwrap_or_else(|| key.clone());
                    if traits.contains(&trait_name) {
                        if !applied.contains(&trait_name) {
                            applied.push(trait_name);
                        }
                    } else if let Some(entry) = catalog.iter().find(|entry| entry.name == key) {
                        kept.push(entry.item.clone());
                    } else {
                        failure.get_or_insert_with(|| {
                            ConvertError::reference(RefKind::Parameter, &key, &resource.path)
                        });
                    }
                }
                *list = kept;
            }
            method.responses.retain(|response| {
                let from_trait = response
                    .reference
                    .as_deref()
                    .and_then(parse_trait_key)
                    .map(|(name, _)| name.to_string())
                    .filter(|name| traits.contains(name));
                match from_trait {
                    Some(name) => {
                        if !applied.contains(&name) {
                            applied.push(name);
                        }
                        false
                    }
                    None => true,
                }
            });
            for name in applied {
                if method.traits.iter().all(|t| t.name != name) {
                    method.traits.push(TemplateRef::new(name));
                }
            }
        }
    });
    failure.map_or(Ok(()), Err)
}

fn is_trait_location(parameter: &Parameter) -> bool {
    matches!(parameter.location, Location::Query | Location::Header)
}

fn referenced_plain_keys(doc: &Document) -> HashSet<String> {
    let mut keys = HashSet::new();
    doc.walk_resources(&mut |resource| {
        for method in &resource.methods {
            for parameter in method.parameters.iter().chain(&method.headers) {
                if let Shape::Ref(key) = &parameter.shape {
                    if parse_trait_key(key).is_none() {
                        keys.insert(key.clone());
                    }
                }
            }
        }
    });
    keys
}

fn ensure_trait<'a>(doc: &'a mut Document, name: &str) -> &'a mut Trait {
    let index = match doc.traits.iter().position(|t| t.name == name) {
        Some(index) => index,
        None => {
            doc.traits.push(Trait::new(name));
            doc.traits.len() - 1
        }
    };
    &mut doc.traits[index]
}

fn add_trait_parameter(doc: &mut Document, trait_name: &str, parameter: Parameter) {
    let target = ensure_trait(doc, trait_name);
    let list = match parameter.location {
        Location::Header => &mut target.headers,
        _ => &mut target.parameters,
    };
    if list.iter().all(|p| !p.same_name(&parameter.name)) {
        list.push(parameter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_keys() {
        assert_eq!(trait_key("paged", "page"), "trait:paged:page");
        assert_eq!(parse_trait_key("trait:paged:page"), Some(("paged", "page")));
        assert_eq!(parse_trait_key("trait:paged"), None);
        assert_eq!(parse_trait_key("pageParam"), None);
    }
}
