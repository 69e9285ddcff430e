//! Converts a flat list of absolute paths back into a nested resource tree.
//!
//! # The High-Level Concept
//!
//! OAS paths arrive in any order: `/a/{id}/b` may come before `/a/{id}`, and `/a` may never
//! appear at all. RAML nests a resource under the closest resource whose path is a
//! segment-wise prefix of its own, so the tree is rebuilt by descending from the top-level
//! resources to the deepest existing ancestor of every new path. A path that turns out to
//! be the ancestor of resources inserted earlier adopts them.
//!
//! # The Algorithm
//!
//! 1. **Initialization:**
//!    - Start with an empty list of top-level resources
//!
//! 2. **Inserting a Resource:**
//!    - Among the current siblings, find one whose path is a segment prefix of the new path
//!    - If there is one, descend into its children and repeat
//!    - Otherwise the new resource becomes a sibling at this level
//!
//! 3. **Adoption:**
//!    - Siblings whose path has the new path as a segment prefix move under the new resource
//!    - The new resource takes the position of the first adopted sibling
//!
//! 4. **Relative Paths:**
//!    - Every inserted or adopted resource gets its path relative to its new parent
//!
//! 5. **Completion:**
//!    - The top-level list is the resource tree; absolute paths are unchanged
//!
//! A path that appears twice is merged into the resource already holding it.

use apiconv::ir::Resource;
use tracing::debug;

/// Nest resources given with absolute paths. Children of the inputs are ignored.
pub fn paths_to_resources(flat: Vec<Resource>) -> Vec<Resource> {
    let mut roots = Vec::new();
    for resource in flat {
        insert(&mut roots, "", resource);
    }
    roots
}

/// Whether `descendant` lives below `ancestor` on a segment boundary.
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    let ancestor = ancestor.trim_end_matches('/');
    !ancestor.is_empty()
        && descendant.len() > ancestor.len()
        && descendant.starts_with(ancestor)
        && descendant[ancestor.len()..].starts_with('/')
}

fn relative(parent: &str, path: &str) -> String {
    let parent = parent.trim_end_matches('/');
    path.strip_prefix(parent)
        .filter(|rest| rest.starts_with('/'))
        .unwrap_or(path)
        .to_string()
}

fn insert(siblings: &mut Vec<Resource>, parent_path: &str, mut node: Resource) {
    if let Some(existing) = siblings.iter_mut().find(|s| s.path == node.path) {
        debug!(path = %node.path, "duplicate path merged");
        merge(existing, node);
        return;
    }
    if let Some(parent) = siblings
        .iter_mut()
        .find(|s| is_ancestor(&s.path, &node.path))
    {
        let path = parent.path.clone();
        insert(&mut parent.resources, &path, node);
        return;
    }

    let position = siblings
        .iter()
        .position(|s| is_ancestor(&node.path, &s.path));
    let (adopted, kept): (Vec<_>, Vec<_>) = std::mem::take(siblings)
        .into_iter()
        .partition(|s| is_ancestor(&node.path, &s.path));
    *siblings = kept;

    let path = node.path.clone();
    for mut child in adopted {
        child.relative_path = relative(&path, &child.path);
        insert(&mut node.resources, &path, child);
    }
    node.relative_path = relative(parent_path, &node.path);
    match position {
        Some(index) => siblings.insert(index.min(siblings.len()), node),
        None => siblings.push(node),
    }
}

fn merge(target: &mut Resource, other: Resource) {
    for method in other.methods {
        if target.method(method.verb).is_none() {
            target.methods.push(method);
        }
    }
    for parameter in other.parameters {
        if target.parameters.iter().all(|p| p.name != parameter.name) {
            target.parameters.push(parameter);
        }
    }
    target.display_name = target.display_name.take().or(other.display_name);
    target.description = target.description.take().or(other.description);
    target.annotations.extend(other.annotations);
}
