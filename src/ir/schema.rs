//! Schema nodes
//!
//! A [`Type`] is exactly one of scalar, reference, object, array, composition or choice, plus
//! a shared set of facets. Scalars carry a normalized [`InternalType`] tag; the
//! (native type, format) pair of a dialect never appears inside the IR.

use super::annotation::Annotation;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Normalized scalar and structural type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InternalType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "byte")]
    Byte,
    #[serde(rename = "binary")]
    Binary,
    #[serde(rename = "password")]
    Password,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "date-only")]
    DateOnly,
    #[serde(rename = "time-only")]
    TimeOnly,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "datetime-only")]
    DateTimeOnly,
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "null")]
    Null,
    #[serde(rename = "any")]
    Any,
}

impl InternalType {
    pub const ALL: [InternalType; 24] = [
        InternalType::String,
        InternalType::Byte,
        InternalType::Binary,
        InternalType::Password,
        InternalType::Number,
        InternalType::Integer,
        InternalType::Int,
        InternalType::Int8,
        InternalType::Int16,
        InternalType::Int32,
        InternalType::Int64,
        InternalType::Float,
        InternalType::Double,
        InternalType::Boolean,
        InternalType::DateOnly,
        InternalType::TimeOnly,
        InternalType::DateTime,
        InternalType::DateTimeOnly,
        InternalType::Timestamp,
        InternalType::File,
        InternalType::Object,
        InternalType::Array,
        InternalType::Null,
        InternalType::Any,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InternalType::String => "string",
            InternalType::Byte => "byte",
            InternalType::Binary => "binary",
            InternalType::Password => "password",
            InternalType::Number => "number",
            InternalType::Integer => "integer",
            InternalType::Int => "int",
            InternalType::Int8 => "int8",
            InternalType::Int16 => "int16",
            InternalType::Int32 => "int32",
            InternalType::Int64 => "int64",
            InternalType::Float => "float",
            InternalType::Double => "double",
            InternalType::Boolean => "boolean",
            InternalType::DateOnly => "date-only",
            InternalType::TimeOnly => "time-only",
            InternalType::DateTime => "datetime",
            InternalType::DateTimeOnly => "datetime-only",
            InternalType::Timestamp => "timestamp",
            InternalType::File => "file",
            InternalType::Object => "object",
            InternalType::Array => "array",
            InternalType::Null => "null",
            InternalType::Any => "any",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            InternalType::Integer
                | InternalType::Int
                | InternalType::Int8
                | InternalType::Int16
                | InternalType::Int32
                | InternalType::Int64
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                InternalType::Number | InternalType::Float | InternalType::Double
            )
    }
}

impl fmt::Display for InternalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InternalType::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or(())
    }
}

/// A schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Scalar(InternalType),
    Reference(String),
    Object(ObjectType),
    Array(ArrayType),
    /// All of the listed types (inheritance, `allOf`).
    Composition(Vec<Type>),
    /// Exactly one of the listed types (union, `oneOf`).
    Choice(Vec<Type>),
}

impl Default for TypeKind {
    fn default() -> Self {
        TypeKind::Scalar(InternalType::Any)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Type>),
}

/// A named member of an object. `required` belongs to the property, not to the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub required: bool,
    pub schema: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub items: Items,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Items {
    Single(Box<Type>),
    Tuple(Vec<Type>),
}

/// Facets shared by every kind of type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Facets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_minimum: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    /// A format the internal tag set does not cover (`uuid`, `email`), kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    /// Numeric facets still written as a template placeholder (`maximum: <<max>>`), by native
    /// facet name. Substitution moves them into their typed fields.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub templated: BTreeMap<String, String>,
}

/// Numeric facets that may hold a placeholder: native name, then field name.
pub const TEMPLATED_FACETS: &[(&str, &str)] = &[
    ("minLength", "min_length"),
    ("maxLength", "max_length"),
    ("minimum", "minimum"),
    ("maximum", "maximum"),
    ("multipleOf", "multiple_of"),
];

impl Facets {
    pub fn is_empty(&self) -> bool {
        *self == Facets::default()
    }
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            facets: Facets::default(),
            annotations: Vec::new(),
        }
    }

    pub fn scalar(tag: InternalType) -> Self {
        Self::new(TypeKind::Scalar(tag))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Reference(name.into()))
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Self::new(TypeKind::Object(ObjectType {
            properties,
            ..ObjectType::default()
        }))
    }

    pub fn array(items: Type) -> Self {
        Self::new(TypeKind::Array(ArrayType {
            items: Items::Single(Box::new(items)),
            min_items: None,
            max_items: None,
            unique_items: false,
        }))
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }

    /// The scalar tag, when this is a scalar.
    pub fn tag(&self) -> Option<InternalType> {
        match self.kind {
            TypeKind::Scalar(tag) => Some(tag),
            _ => None,
        }
    }

    /// The referenced type name, when this is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Every type name referenced anywhere below this node (not following references).
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_references(self, &mut names);
        names
    }
}

impl Default for Type {
    fn default() -> Self {
        Type::scalar(InternalType::Any)
    }
}

impl Property {
    pub fn new(name: impl Into<String>, required: bool, schema: Type) -> Self {
        Self {
            name: name.into(),
            required,
            schema,
        }
    }
}

fn collect_references(ty: &Type, names: &mut Vec<String>) {
    match &ty.kind {
        TypeKind::Scalar(_) => {}
        TypeKind::Reference(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        TypeKind::Object(object) => {
            for property in &object.properties {
                collect_references(&property.schema, names);
            }
            if let Some(AdditionalProperties::Schema(schema)) = &object.additional_properties {
                collect_references(schema, names);
            }
        }
        TypeKind::Array(array) => match &array.items {
            Items::Single(item) => collect_references(item, names),
            Items::Tuple(items) => items.iter().for_each(|item| collect_references(item, names)),
        },
        TypeKind::Composition(members) | TypeKind::Choice(members) => {
            members.iter().for_each(|member| collect_references(member, names))
        }
    }
}
