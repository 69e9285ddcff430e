//! Intermediate representation
//!
//!     The dialect-neutral tree every conversion passes through. Adapters build it on import
//!     and walk it on export; the normalizer, codec, resolver and propagator work on it in
//!     between.
//!
//!     The document exclusively owns its tree. Catalog entries (named types, traits, resource
//!     templates, shared parameters and responses) are referenced by name from resources and
//!     methods, never shared by pointer.
//!
//!     Every node derives `Serialize`/`Deserialize`, which lets the resolver substitute template
//!     parameters over a generic tree and lets the CLI dump a parsed document.

pub mod annotation;
pub mod document;
pub mod parameter;
pub mod resource;
pub mod schema;
pub mod security;

pub use annotation::{
    find_annotation, set_annotation, take_annotation, Annotation, AnnotationType, AnnotationValue,
};
pub use document::{Document, DocumentationItem, MediaTypeInfo};
pub use parameter::{
    is_form_media_type, lookup, Body, Header, Location, Named, Parameter, Response, Shape,
};
pub use resource::{Method, Resource, ResourceTemplate, TemplateMethod, TemplateRef, Trait, Verb};
pub use schema::{
    AdditionalProperties, ArrayType, Facets, InternalType, Items, ObjectType, Property, Type,
    TypeKind, TEMPLATED_FACETS,
};
pub use security::{
    DescribedBy, OAuthFlow, SchemeKind, SchemeSettings, Scope, SecurityRequirement,
    SecurityScheme,
};
