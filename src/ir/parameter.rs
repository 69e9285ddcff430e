//! Parameters, bodies and responses

use super::annotation::Annotation;
use super::schema::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
    Form,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Body => "body",
            Location::Form => "formData",
        }
    }

    /// Parse an OAS `in` value.
    pub fn from_oas(value: &str) -> Option<Location> {
        match value {
            "path" => Some(Location::Path),
            "query" => Some(Location::Query),
            "header" => Some(Location::Header),
            "body" => Some(Location::Body),
            "formData" => Some(Location::Form),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either an inline schema or the key of a shared catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Inline(Type),
    Ref(String),
}

impl Shape {
    pub fn inline(&self) -> Option<&Type> {
        match self {
            Shape::Inline(ty) => Some(ty),
            Shape::Ref(_) => None,
        }
    }

    pub fn catalog_key(&self) -> Option<&str> {
        match self {
            Shape::Inline(_) => None,
            Shape::Ref(key) => Some(key),
        }
    }
}

/// A path, query, header or form parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: Location,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Headers carry the same information as parameters.
pub type Header = Parameter;

impl Parameter {
    pub fn new(name: impl Into<String>, location: Location, schema: Type) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == Location::Path,
            description: None,
            display_name: None,
            shape: Shape::Inline(schema),
            annotations: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Same name, compared the way the location demands (headers are case-insensitive).
    pub fn same_name(&self, other: &str) -> bool {
        match self.location {
            Location::Header => self.name.eq_ignore_ascii_case(other),
            _ => self.name == other,
        }
    }
}

/// A request or response payload for one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub media_type: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Body {
    pub fn new(media_type: impl Into<String>, schema: Type) -> Self {
        Self {
            media_type: media_type.into(),
            required: false,
            description: None,
            shape: Shape::Inline(schema),
            annotations: Vec::new(),
        }
    }

    pub fn is_form(&self) -> bool {
        is_form_media_type(&self.media_type)
    }
}

pub fn is_form_media_type(media_type: &str) -> bool {
    media_type == "application/x-www-form-urlencoded" || media_type == "multipart/form-data"
}

/// A response for one status code (or `default`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bodies: Vec<Body>,
    /// Key of a shared response catalog entry this response stands for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Response {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Response::default()
        }
    }
}

/// A catalog entry: something reusable under a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Named<T> {
    pub name: String,
    pub item: T,
}

impl<T> Named<T> {
    pub fn new(name: impl Into<String>, item: T) -> Self {
        Self {
            name: name.into(),
            item,
        }
    }
}

/// Find a catalog entry by name.
pub fn lookup<'a, T>(catalog: &'a [Named<T>], name: &str) -> Option<&'a T> {
    catalog
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| &entry.item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InternalType;

    #[test]
    fn path_parameters_default_to_required() {
        let id = Parameter::new("id", Location::Path, Type::scalar(InternalType::String));
        let page = Parameter::new("page", Location::Query, Type::scalar(InternalType::Integer));
        assert!(id.required);
        assert!(!page.required);
    }

    #[test]
    fn header_names_compare_case_insensitively() {
        let header = Parameter::new("X-Flag", Location::Header, Type::default());
        let query = Parameter::new("Page", Location::Query, Type::default());
        assert!(header.same_name("x-flag"));
        assert!(!query.same_name("page"));
    }

    #[test]
    fn oas_locations() {
        assert_eq!(Location::from_oas("formData"), Some(Location::Form));
        assert_eq!(Location::from_oas("cookie"), None);
        assert_eq!(Location::Form.as_str(), "formData");
    }
}
