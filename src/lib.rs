//! Conversion engine between RAML and OpenAPI descriptions
//!
//!     This crate is the dialect-neutral core: the intermediate representation and the passes
//!     that run over it. It never reads or writes text; front ends hand it a generic tree
//!     ([`tree::Tree`]) and renderers take one back. The per-dialect adapters that build and
//!     walk the IR live in `apiconv-dialects`.
//!
//! Architecture
//!
//!     - ir: Document, Resource, Method, Parameter, Body, Response, Type, SecurityScheme,
//!       Trait, ResourceTemplate, Annotation
//!     - types: Type Normalizer, (native type, format) <-> internal tag
//!     - annotations: Annotation Codec and the per-export annotation type registry
//!     - inheritance: trait/template flattening (export) and reconstruction (import)
//!     - params: attaches path parameters to the resource whose segment mentions them
//!     - context: per-conversion import/export state
//!
//!     The file structure :
//!     .
//!     ├── annotations             # codec, registry, OAS-origin constructs, facets
//!     ├── inheritance             # collect, reconcile, template substitution
//!     ├── ir                      # the model
//!     ├── params                  # path-parameter propagation
//!     ├── types                   # normalizer and per-dialect grammars
//!     ├── context.rs
//!     ├── dialect.rs
//!     ├── error.rs
//!     ├── tree.rs
//!     └── lib.rs
//!
//! Ordering
//!
//!     Within one export the resolver collects every contribution before reconciling any of
//!     them, and both finish before path parameters are propagated, since propagation works on
//!     the final parameter sets.
//!
//! Recursion
//!
//!     Walks over named types track a visited set and stop at [`MAX_DEPTH`], so
//!     self-referential schemas convert to references instead of recursing forever.

pub mod annotations;
pub mod context;
pub mod dialect;
pub mod error;
pub mod inheritance;
pub mod ir;
pub mod params;
pub mod tree;
pub mod types;

pub use context::{ExportContext, Exported, ImportContext, Imported};
pub use dialect::{DialectKind, Family};
pub use error::{ConvertError, Diagnostic, RefKind, Severity, TypeError};
pub use inheritance::{flatten, reconstruct, FlattenOptions};
pub use ir::Document;
pub use params::propagate;
pub use tree::{Map, Tree};

/// Nesting bound for recursive walks over types and annotation values.
pub const MAX_DEPTH: usize = 64;
