//! OAS 2.0 and 3.0
//!
//!     OAS lists every path once under `paths`, describes each body with one schema plus a list
//!     of media types and reuses shape through global `parameters` and `responses` catalogs.
//!     2.0 imports and exports; 3.0 is written only.
//!
//!     RAML constructs with no OAS home travel under `x-raml-` keys: resource types, traits,
//!     unsupported security schemes, documentation and annotation types are written as RAML
//!     fragments and read back with the RAML adapter.
//!
//! The file structure :
//!     .
//!     ├── export.rs              # document and path map writer, 2.0 and 3.0
//!     ├── import.rs              # document and path map reader, 2.0
//!     ├── operations.rs          # operations, parameters, bodies, responses
//!     ├── schema.rs              # schema objects
//!     └── security.rs            # security definitions

mod export;
mod import;
pub mod operations;
pub mod schema;
pub mod security;

use crate::dialect::{Dialect, ExportOptions, Exporter, Importer};
use apiconv::ir::{Document, MediaTypeInfo, Named, Response, Type};
use apiconv::tree::Map;
use apiconv::{ConvertError, DialectKind, ExportContext, Exported, ImportContext, Imported, Tree};
use schema::SchemaWriter;
use std::collections::{HashMap, HashSet};

pub use export::export_document;
pub use import::import_document;

/// IR names of the RAML fragments carried at the document root, written as `x-raml-<name>`.
pub mod carried {
    pub const RESOURCE_TYPES: &str = "resource-types";
    pub const TRAITS: &str = "traits";
    pub const SECURITY_SCHEMES: &str = "security-schemes";
    pub const ANNOTATION_TYPES: &str = "annotation-types";
    pub const DOCUMENTATION: &str = "documentation";
    pub const BASE_URI: &str = "baseUri";
    pub const BASE_URI_PARAMETERS: &str = "baseUriParameters";
    /// Path item description, which OAS 2.0 lacks.
    pub const DESCRIPTION: &str = "description";
    pub const PROTOCOLS: &str = "protocols";
}

const FALLBACK_MEDIA_TYPE: &str = "application/json";

/// Import state for one OAS 2.0 document.
#[derive(Debug)]
pub struct Reader {
    pub ctx: ImportContext,
    /// The raw `parameters` catalog; `$ref`s to path, body and form entries are inlined.
    parameters: Map,
    /// The imported `responses` catalog.
    responses: Vec<Named<Response>>,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl Reader {
    pub fn new(ctx: ImportContext) -> Self {
        Self {
            ctx,
            parameters: Map::new(),
            responses: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    fn media_types(declared: &[String]) -> Vec<String> {
        if declared.is_empty() {
            vec![FALLBACK_MEDIA_TYPE.to_string()]
        } else {
            declared.to_vec()
        }
    }
}

/// Export state for one OAS document.
#[derive(Debug)]
pub struct Writer {
    pub ctx: ExportContext,
    schemas: SchemaWriter,
    /// Named types, to inline references where OAS 2.0 wants a plain scalar.
    types: HashMap<String, Type>,
    media_types: MediaTypeInfo,
    default_media_type: String,
    /// Keys of the response catalog, for `$ref`s.
    responses: HashSet<String>,
    /// Schemes with no native spelling; requirements naming them are dropped.
    dropped_schemes: HashSet<String>,
}

impl Writer {
    pub fn new(dialect: DialectKind, doc: &Document, options: &ExportOptions) -> Self {
        let names = doc
            .types
            .iter()
            .filter_map(|entry| {
                let original = apiconv::ir::find_annotation(
                    &entry.item.annotations,
                    apiconv::annotations::oas::DEFINITION_NAME,
                )?;
                Some((entry.name.clone(), original.as_str()?.to_string()))
            })
            .collect();
        Self {
            ctx: ExportContext::new(dialect, &[]),
            schemas: SchemaWriter::new(dialect, names),
            types: doc
                .types
                .iter()
                .map(|entry| (entry.name.clone(), entry.item.clone()))
                .collect(),
            media_types: doc.media_types.clone(),
            default_media_type: options.default_media_type.clone(),
            responses: doc.responses.iter().map(|entry| entry.name.clone()).collect(),
            dropped_schemes: HashSet::new(),
        }
    }

    fn v3(&self) -> bool {
        self.ctx.dialect == DialectKind::Oas30
    }
}

pub struct Oas20;

impl Dialect for Oas20 {
    fn kind(&self) -> DialectKind {
        DialectKind::Oas20
    }

    fn description(&self) -> &str {
        "OpenAPI 2.0 (Swagger)"
    }

    fn importer(&self) -> Option<&dyn Importer> {
        Some(self)
    }

    fn exporter(&self) -> Option<&dyn Exporter> {
        Some(self)
    }
}

impl Importer for Oas20 {
    fn import(&self, tree: &Tree) -> Result<Imported, ConvertError> {
        import_document(tree)
    }
}

impl Exporter for Oas20 {
    fn export(&self, doc: &Document, options: &ExportOptions) -> Result<Exported, ConvertError> {
        export_document(doc, DialectKind::Oas20, options)
    }
}

pub struct Oas30;

impl Dialect for Oas30 {
    fn kind(&self) -> DialectKind {
        DialectKind::Oas30
    }

    fn description(&self) -> &str {
        "OpenAPI 3.0 (export only)"
    }

    fn exporter(&self) -> Option<&dyn Exporter> {
        Some(self)
    }
}

impl Exporter for Oas30 {
    fn export(&self, doc: &Document, options: &ExportOptions) -> Result<Exported, ConvertError> {
        export_document(doc, DialectKind::Oas30, options)
    }
}
