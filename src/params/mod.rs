//! Path-Parameter Propagator
//!
//!     Templates declare uri parameters where they are applied, which is not always the
//!     resource whose segment mentions them: a template on `/a/{id}/b` may declare `id`. RAML
//!     declares uri parameters per segment, so each one is moved to the deepest resource on
//!     its chain whose own relative path mentions `{name}`.
//!
//!     A parameter no segment on its own chain mentions is kept at the root
//!     (`base_uri_parameters`), even when a descendant happens to mention the name.
//!     Parameters are visited in tree pre-order and a target keeps the first parameter of a
//!     given name, so running the pass twice gives the same result.

use crate::ir::{Document, Location, Parameter, Resource};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").unwrap());

/// Names of the `{placeholders}` in a path template, in order of appearance.
pub fn path_parameter_names(path: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(path)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn mentions(segment: &str, name: &str) -> bool {
    PLACEHOLDER
        .captures_iter(segment)
        .any(|caps| &caps[1] == name)
}

struct Detached {
    /// Absolute paths from the top-level resource down to the declaring one.
    chain: Vec<String>,
    parameter: Parameter,
}

/// Attach every path parameter to the resource whose segment mentions it.
pub fn propagate(mut doc: Document) -> Document {
    let mut detached = Vec::new();
    detach(&mut doc.resources, &mut Vec::new(), &mut detached);

    for Detached { chain, parameter } in detached {
        match deepest_mentioning(&doc, &chain, &parameter.name) {
            Some(path) => {
                if chain.last() != Some(&path) {
                    debug!(name = %parameter.name, to = %path, "path parameter moved");
                }
                if let Some(resource) = doc.find_resource_mut(&path) {
                    attach(&mut resource.parameters, parameter, &path);
                }
            }
            None => {
                debug!(
                    name = %parameter.name,
                    from = chain.last().map(String::as_str).unwrap_or(""),
                    "path parameter mentioned nowhere on its path, kept at the root"
                );
                attach(&mut doc.base_uri_parameters, parameter, "/");
            }
        }
    }
    doc
}

fn detach(resources: &mut [Resource], chain: &mut Vec<String>, out: &mut Vec<Detached>) {
    for resource in resources {
        chain.push(resource.path.clone());
        let (path, other): (Vec<_>, Vec<_>) = std::mem::take(&mut resource.parameters)
            .into_iter()
            .partition(|p| p.location == Location::Path);
        resource.parameters = other;
        out.extend(path.into_iter().map(|parameter| Detached {
            chain: chain.clone(),
            parameter,
        }));
        detach(&mut resource.resources, chain, out);
        chain.pop();
    }
}

fn deepest_mentioning(doc: &Document, chain: &[String], name: &str) -> Option<String> {
    chain
        .iter()
        .rev()
        .find(|path| {
            doc.find_resource(path)
                .is_some_and(|resource| mentions(&resource.relative_path, name))
        })
        .cloned()
}

fn attach(parameters: &mut Vec<Parameter>, parameter: Parameter, at: &str) {
    if parameters.iter().any(|p| p.name == parameter.name) {
        debug!(name = %parameter.name, at, "duplicate path parameter dropped");
        return;
    }
    parameters.push(parameter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InternalType, Type};
    use proptest::prelude::*;

    fn path_param(name: &str) -> Parameter {
        Parameter::new(name, Location::Path, Type::scalar(InternalType::String))
    }

    fn names(resource: &Resource) -> Vec<&str> {
        resource.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// `/a/{id}` with child `/b` and grandchild `/{x}`, plus a sibling `/c`.
    fn tree() -> Document {
        let mut doc = Document::new("Tree");
        let mut a = Resource::new("", "/a/{id}");
        let mut b = Resource::new("/a/{id}", "/b");
        b.resources.push(Resource::new("/a/{id}/b", "/{x}"));
        a.resources.push(b);
        doc.resources.push(a);
        doc.resources.push(Resource::new("", "/c"));
        doc
    }

    #[test]
    fn names_in_order() {
        assert_eq!(path_parameter_names("/a/{id}/b/{x}"), vec!["id", "x"]);
        assert!(path_parameter_names("/plain").is_empty());
    }

    #[test]
    fn parameter_moves_up_to_the_mentioning_segment() {
        let mut doc = tree();
        doc.find_resource_mut("/a/{id}/b")
            .unwrap()
            .parameters
            .push(path_param("id"));

        let doc = propagate(doc);
        assert_eq!(names(doc.find_resource("/a/{id}").unwrap()), vec!["id"]);
        assert!(names(doc.find_resource("/a/{id}/b").unwrap()).is_empty());
    }

    #[test]
    fn duplicate_on_descendant_is_dropped() {
        let mut doc = tree();
        doc.find_resource_mut("/a/{id}")
            .unwrap()
            .parameters
            .push(path_param("id").required(true));
        let mut copy = path_param("id");
        copy.description = Some("from the template".into());
        doc.find_resource_mut("/a/{id}/b")
            .unwrap()
            .parameters
            .push(copy);

        let doc = propagate(doc);
        let a = doc.find_resource("/a/{id}").unwrap();
        assert_eq!(a.parameters.len(), 1);
        assert_eq!(a.parameters[0].description, None);
    }

    #[test]
    fn descendant_mention_does_not_pull_a_parameter_down() {
        let mut doc = tree();
        doc.find_resource_mut("/a/{id}")
            .unwrap()
            .parameters
            .push(path_param("x"));

        let doc = propagate(doc);
        assert!(names(doc.find_resource("/a/{id}").unwrap()).is_empty());
        assert!(names(doc.find_resource("/a/{id}/b/{x}").unwrap()).is_empty());
        assert_eq!(doc.base_uri_parameters, vec![path_param("x")]);
    }

    #[test]
    fn unmentioned_parameter_goes_to_the_root() {
        let mut doc = tree();
        doc.find_resource_mut("/c")
            .unwrap()
            .parameters
            .push(path_param("tenant"));

        let doc = propagate(doc);
        assert!(names(doc.find_resource("/c").unwrap()).is_empty());
        assert_eq!(doc.base_uri_parameters, vec![path_param("tenant")]);
    }

    #[test]
    fn propagation_is_idempotent_on_a_settled_tree() {
        let mut doc = tree();
        doc.find_resource_mut("/a/{id}/b")
            .unwrap()
            .parameters
            .push(path_param("id"));
        let once = propagate(doc);
        assert_eq!(propagate(once.clone()), once);
    }

    const PATHS: [&str; 4] = ["/a/{id}", "/a/{id}/b", "/a/{id}/b/{x}", "/c"];
    const NAMES: [&str; 4] = ["id", "x", "tenant", "id"];

    proptest! {
        #[test]
        fn propagation_is_deterministic(
            placements in proptest::collection::vec((0..PATHS.len(), 0..NAMES.len()), 0..8)
        ) {
            let mut doc = tree();
            for (path, name) in placements {
                doc.find_resource_mut(PATHS[path])
                    .unwrap()
                    .parameters
                    .push(path_param(NAMES[name]));
            }
            let first = propagate(doc.clone());
            prop_assert_eq!(&propagate(doc), &first);
            prop_assert_eq!(propagate(first.clone()), first);
        }
    }
}
