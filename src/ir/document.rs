//! The document root

use super::annotation::{Annotation, AnnotationType};
use super::parameter::{lookup, Named, Parameter, Response};
use super::resource::{Resource, ResourceTemplate, Trait};
use super::schema::Type;
use super::security::{SecurityRequirement, SecurityScheme};
use serde::{Deserialize, Serialize};

/// Request and response media types declared for the whole document.
///
/// RAML has a single `mediaType` list, OAS 2.0 distinguishes `consumes` from `produces`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaTypeInfo {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
}

impl MediaTypeInfo {
    pub fn both(media_types: Vec<String>) -> Self {
        Self {
            consumes: media_types.clone(),
            produces: media_types,
        }
    }

    /// All media types, consumes first, without duplicates.
    pub fn merged(&self) -> Vec<String> {
        let mut merged = self.consumes.clone();
        for media_type in &self.produces {
            if !merged.contains(media_type) {
                merged.push(media_type.clone());
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.consumes.is_empty() && self.produces.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationItem {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base URI template, e.g. `https://api.example.com/{version}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    /// Parameters of the base URI, plus path parameters no segment mentions.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_uri_parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "MediaTypeInfo::is_empty")]
    pub media_types: MediaTypeInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<DocumentationItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<Named<Type>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<SecurityScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<Trait>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_templates: Vec<ResourceTemplate>,
    /// Shared parameter catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Named<Parameter>>,
    /// Shared response catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Named<Response>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation_types: Vec<AnnotationType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Document::default()
        }
    }

    pub fn find_type(&self, name: &str) -> Option<&Type> {
        lookup(&self.types, name)
    }

    pub fn find_trait(&self, name: &str) -> Option<&Trait> {
        self.traits.iter().find(|t| t.name == name)
    }

    pub fn find_template(&self, name: &str) -> Option<&ResourceTemplate> {
        self.resource_templates.iter().find(|t| t.name == name)
    }

    pub fn find_security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.iter().find(|s| s.name == name)
    }

    pub fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        lookup(&self.parameters, name)
    }

    pub fn find_response(&self, name: &str) -> Option<&Response> {
        lookup(&self.responses, name)
    }

    /// Find a resource anywhere in the tree by absolute path.
    pub fn find_resource(&self, path: &str) -> Option<&Resource> {
        fn search<'a>(resources: &'a [Resource], path: &str) -> Option<&'a Resource> {
            resources.iter().find_map(|resource| {
                if resource.path == path {
                    Some(resource)
                } else {
                    search(&resource.resources, path)
                }
            })
        }
        search(&self.resources, path)
    }

    pub fn find_resource_mut(&mut self, path: &str) -> Option<&mut Resource> {
        fn search<'a>(resources: &'a mut [Resource], path: &str) -> Option<&'a mut Resource> {
            for resource in resources.iter_mut() {
                if resource.path == path {
                    return Some(resource);
                }
                if let Some(found) = search(&mut resource.resources, path) {
                    return Some(found);
                }
            }
            None
        }
        search(&mut self.resources, path)
    }

    /// Pre-order visit of every resource.
    pub fn walk_resources<'a>(&'a self, visit: &mut dyn FnMut(&'a Resource)) {
        for resource in &self.resources {
            resource.walk(visit);
        }
    }

    pub fn walk_resources_mut(&mut self, visit: &mut dyn FnMut(&mut Resource)) {
        for resource in &mut self.resources {
            resource.walk_mut(visit);
        }
    }

    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|entry| entry.name.clone()).collect()
    }
}
