//! RAML and OpenAPI adapters for the apiconv engine
//!
//!     This crate connects the dialect-neutral core to concrete API description languages.
//!     Each dialect turns its native tree into the IR and back; the registry finds dialects
//!     by name and the conversion pipeline chains an import, an export and, on request, a
//!     self-validation of the output.
//!
//!     This is a pure lib: it powers apiconv-cli but never reads files, prints or looks at the
//!     environment. Trees come in and go out as `serde_json::Value`.
//!
//! Architecture
//!
//!     - Dialect trait: import and/or export capability per language version
//!     - DialectRegistry: discovery and selection by name or alias
//!     - mappings: nested resource tree <-> flat path map, shared by the OAS adapter
//!     - validate: structural checks on exported trees
//!     - convert: the pipeline
//!
//!     The file structure :
//!     .
//!     ├── convert.rs              # import -> export -> self-validation
//!     ├── dialect.rs              # Dialect, Importer and Exporter traits
//!     ├── registry.rs             # DialectRegistry
//!     ├── validate.rs             # structural self-validation
//!     ├── dialects
//!     │   ├── oas                 # OAS 2.0 (both ways), 3.0 (export)
//!     │   └── raml                # RAML 0.8 (import), 1.0 (both ways)
//!     ├── mappings
//!     │   ├── flat_to_nested.rs
//!     │   └── nested_to_flat.rs
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     ├── <topic>.rs
//!     └── fixtures
//!         └── <docname>.<dialect>.yaml
//!
//! Lossiness
//!
//!     RAML is the more expressive side. Constructs OAS cannot hold travel as `x-raml-`
//!     extensions and OAS-only constructs travel as `(oas-...)` annotations, so A -> B -> A
//!     comes back to the same IR. OAS 3.0 is written only, and exports to it are lossy where
//!     3.0 has no spelling (files, multiple body schemas per media type).

pub mod convert;
pub mod dialect;
pub mod dialects;
pub mod mappings;
pub mod registry;
pub mod validate;

pub use convert::{convert, convert_with, parse, Conversion, ConvertOptions};
pub use dialect::{Dialect, ExportOptions, Exporter, Importer};
pub use registry::DialectRegistry;
