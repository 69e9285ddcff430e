//! Resources, methods and the reusable fragments applied to them

use super::annotation::Annotation;
use super::parameter::{Body, Header, Parameter, Response};
use super::security::SecurityRequirement;
use crate::tree::scalar_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of HTTP verbs both dialects agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl Verb {
    pub const ALL: [Verb; 7] = [
        Verb::Get,
        Verb::Put,
        Verb::Post,
        Verb::Delete,
        Verb::Options,
        Verb::Head,
        Verb::Patch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Put => "put",
            Verb::Post => "post",
            Verb::Delete => "delete",
            Verb::Options => "options",
            Verb::Head => "head",
            Verb::Patch => "patch",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str() == s)
            .ok_or(())
    }
}

/// An application of a trait or resource template, with its parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl TemplateRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Read the RAML spelling: `name`, or `{ name: { key: value } }`.
    pub fn from_json(value: &Value) -> Option<TemplateRef> {
        match value {
            Value::String(name) => Some(TemplateRef::new(name.clone())),
            Value::Object(map) if map.len() == 1 => {
                let (name, params) = map.iter().next()?;
                let parameters = params
                    .as_object()
                    .map(|params| {
                        params
                            .iter()
                            .filter_map(|(key, value)| {
                                scalar_string(value).map(|value| (key.clone(), value))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(TemplateRef {
                    name: name.clone(),
                    parameters,
                })
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        if self.parameters.is_empty() {
            return Value::String(self.name.clone());
        }
        let params: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        let mut map = Map::new();
        map.insert(self.name.clone(), Value::Object(params));
        Value::Object(map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub verb: Verb,
    /// RAML `displayName`, OAS `operationId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Query parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<Body>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<TemplateRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Method {
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            display_name: None,
            description: None,
            parameters: Vec::new(),
            headers: Vec::new(),
            bodies: Vec::new(),
            responses: Vec::new(),
            security: None,
            traits: Vec::new(),
            protocols: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn response(&self, code: &str) -> Option<&Response> {
        self.responses.iter().find(|response| response.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Absolute path template, e.g. `/a/{id}/b`.
    pub path: String,
    /// The segment group relative to the parent, e.g. `/b`.
    pub relative_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URI parameters held at this level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Method>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<TemplateRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Resource {
    pub fn new(parent_path: &str, relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let path = format!("{}{}", parent_path.trim_end_matches('/'), relative_path);
        Self {
            path,
            relative_path,
            display_name: None,
            description: None,
            parameters: Vec::new(),
            methods: Vec::new(),
            resources: Vec::new(),
            template: None,
            traits: Vec::new(),
            security: None,
            annotations: Vec::new(),
        }
    }

    pub fn method(&self, verb: Verb) -> Option<&Method> {
        self.methods.iter().find(|method| method.verb == verb)
    }

    pub fn method_mut(&mut self, verb: Verb) -> Option<&mut Method> {
        self.methods.iter_mut().find(|method| method.verb == verb)
    }

    /// Depth-first pre-order visit of this resource and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Resource)) {
        visit(self);
        for child in &self.resources {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Resource)) {
        visit(self);
        for child in &mut self.resources {
            child.walk_mut(visit);
        }
    }

    /// The last segment of the path, without braces (RAML `resourcePathName`).
    pub fn path_name(&self) -> String {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
            .unwrap_or("")
            .to_string()
    }
}

/// A named fragment mixed into methods (`is:`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<Body>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Trait {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Trait::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.headers.is_empty()
            && self.bodies.is_empty()
            && self.responses.is_empty()
    }
}

/// A method declared inside a resource template. Optional methods (`get?`) apply only where
/// the resource declares the verb itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMethod {
    pub method: Method,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

/// A named whole-resource fragment (`type:` in RAML).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<TemplateMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<TemplateRef>,
    /// A template may itself instantiate another template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl ResourceTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..ResourceTemplate::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_lowercase_only() {
        assert_eq!("patch".parse::<Verb>(), Ok(Verb::Patch));
        assert!("GET".parse::<Verb>().is_err());
        assert!("trace".parse::<Verb>().is_err());
    }

    #[test]
    fn template_refs_use_raml_spelling() {
        let plain = TemplateRef::from_json(&serde_json::json!("paged")).unwrap();
        assert_eq!(plain, TemplateRef::new("paged"));
        assert_eq!(plain.to_json(), serde_json::json!("paged"));

        let value = serde_json::json!({"collection": {"item": "Pet", "max": 10}});
        let with_params = TemplateRef::from_json(&value).unwrap();
        assert_eq!(with_params.parameters.get("max").map(String::as_str), Some("10"));
        assert_eq!(
            with_params.to_json(),
            serde_json::json!({"collection": {"item": "Pet", "max": "10"}})
        );
        assert!(TemplateRef::from_json(&serde_json::json!([1])).is_none());
    }

    #[test]
    fn child_paths_are_absolute() {
        let parent = Resource::new("", "/a/{id}");
        let child = Resource::new(&parent.path, "/b");
        assert_eq!(child.path, "/a/{id}/b");
        assert_eq!(child.relative_path, "/b");
    }

    #[test]
    fn path_name_skips_parameters() {
        assert_eq!(Resource::new("", "/users/{id}").path_name(), "users");
        assert_eq!(Resource::new("", "/items").path_name(), "items");
        assert_eq!(Resource::new("", "/").path_name(), "");
    }

    #[test]
    fn walk_is_pre_order() {
        let mut root = Resource::new("", "/a");
        let mut b = Resource::new("/a", "/b");
        b.resources.push(Resource::new("/a/b", "/c"));
        root.resources.push(b);
        root.resources.push(Resource::new("/a", "/d"));

        let mut seen = Vec::new();
        root.walk(&mut |resource| seen.push(resource.path.clone()));
        assert_eq!(seen, vec!["/a", "/a/b", "/a/b/c", "/a/d"]);
    }
}
