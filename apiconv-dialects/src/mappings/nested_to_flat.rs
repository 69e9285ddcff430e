//! Converts the nested resource tree into a flat list of paths.
//!
//! # The High-Level Concept
//!
//! RAML nests resources by path segment, OAS lists every path once under `paths`. Walking
//! the tree in pre-order yields the OAS order, and keeping the chain of ancestors next to each
//! resource lets the exporter recover what the nesting implied: a path's uri parameters are
//! the ones attached anywhere on its chain.
//!
//! # The Algorithm
//!
//! 1. **Initialization:**
//!    - Create an empty output vector and an empty ancestor stack
//!
//! 2. **Visiting a Resource:**
//!    - Emit the resource together with a copy of the ancestor stack
//!    - Push the resource, recurse into its children, pop it again
//!
//! 3. **Completion:**
//!    - Return the accumulated list, parents always before their children
//!
//! This mirrors `flat_to_nested`, which rebuilds the tree from absolute paths.

use apiconv::ir::{Parameter, Resource};

/// One resource of the tree with the resources above it, outermost first.
#[derive(Debug, Clone)]
pub struct FlatResource<'a> {
    pub resource: &'a Resource,
    pub ancestors: Vec<&'a Resource>,
}

impl<'a> FlatResource<'a> {
    pub fn path(&self) -> &'a str {
        &self.resource.path
    }

    /// Uri parameters attached on the chain, outermost first. A name declared twice keeps
    /// its innermost declaration.
    pub fn path_parameters(&self) -> Vec<&'a Parameter> {
        let mut out: Vec<&'a Parameter> = Vec::new();
        let chain = self.ancestors.iter().copied().chain(std::iter::once(self.resource));
        for resource in chain {
            for parameter in &resource.parameters {
                match out.iter_mut().find(|p| p.name == parameter.name) {
                    Some(slot) => *slot = parameter,
                    None => out.push(parameter),
                }
            }
        }
        out
    }
}

/// Lists every resource in pre-order.
pub fn resources_to_paths(resources: &[Resource]) -> Vec<FlatResource<'_>> {
    let mut out = Vec::new();
    let mut ancestors = Vec::new();
    for resource in resources {
        walk(resource, &mut ancestors, &mut out);
    }
    out
}

fn walk<'a>(
    resource: &'a Resource,
    ancestors: &mut Vec<&'a Resource>,
    out: &mut Vec<FlatResource<'a>>,
) {
    out.push(FlatResource {
        resource,
        ancestors: ancestors.clone(),
    });
    ancestors.push(resource);
    for child in &resource.resources {
        walk(child, ancestors, out);
    }
    ancestors.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::ir::{InternalType, Location, Type};

    fn tree() -> Vec<Resource> {
        let mut a = Resource::new("", "/a/{id}");
        a.parameters.push(Parameter::new(
            "id",
            Location::Path,
            Type::scalar(InternalType::Integer),
        ));
        let mut b = Resource::new("/a/{id}", "/b/{x}");
        b.parameters
            .push(Parameter::new("x", Location::Path, Type::scalar(InternalType::String)));
        a.resources.push(b);
        vec![a, Resource::new("", "/c")]
    }

    #[test]
    fn paths_come_out_in_pre_order() {
        let resources = tree();
        let flat = resources_to_paths(&resources);
        let paths: Vec<&str> = flat.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["/a/{id}", "/a/{id}/b/{x}", "/c"]);
        assert_eq!(flat[1].ancestors.len(), 1);
        assert!(flat[2].ancestors.is_empty());
    }

    #[test]
    fn path_parameters_are_the_union_of_the_chain() {
        let resources = tree();
        let flat = resources_to_paths(&resources);
        let names: Vec<&str> = flat[1]
            .path_parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "x"]);
        assert!(flat[2].path_parameters().is_empty());
    }
}
