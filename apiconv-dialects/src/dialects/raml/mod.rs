//! RAML 0.8 and 1.0
//!
//!     RAML nests resources by path segment, keys bodies by media type and reuses shape through
//!     traits and resource types. Both versions import; only 1.0 is written.
//!
//!     The reader and writer are also used by the OAS adapter for the RAML fragments it
//!     carries under `x-raml-` keys (resource types, traits, unsupported security schemes).
//!
//! The file structure :
//!     .
//!     ├── export.rs              # document and resource tree writer
//!     ├── fragments.rs           # traits and resource types, both directions
//!     ├── import.rs              # document and resource tree reader
//!     ├── methods.rs             # methods, named parameters, bodies, responses
//!     ├── security.rs            # security schemes and `securedBy`
//!     └── types.rs               # type declarations and expressions

mod export;
pub mod fragments;
mod import;
pub mod methods;
pub mod security;
pub mod types;

use crate::dialect::{Dialect, ExportOptions, Exporter, Importer};
use apiconv::ir::{AnnotationType, Document};
use apiconv::{ConvertError, DialectKind, ExportContext, Exported, ImportContext, Imported, Tree};

pub use export::export_document;
pub use import::{import_document, read_documentation};

/// The header line a RAML 1.0 document starts with.
pub const RAML10_HEADER: &str = "#%RAML 1.0";

const FALLBACK_MEDIA_TYPE: &str = "application/json";

/// Import state: the context plus the document's default media types.
#[derive(Debug)]
pub struct Reader {
    pub ctx: ImportContext,
    /// Media types of bodies declared without one (`body: Pet`).
    pub media_types: Vec<String>,
}

impl Reader {
    pub fn new(ctx: ImportContext) -> Self {
        Self {
            ctx,
            media_types: Vec::new(),
        }
    }

    pub fn dialect(&self) -> DialectKind {
        self.ctx.dialect
    }

    fn default_media_types(&self) -> Vec<String> {
        if self.media_types.is_empty() {
            vec![FALLBACK_MEDIA_TYPE.to_string()]
        } else {
            self.media_types.clone()
        }
    }
}

/// Export state: the context that owns the annotation registry.
#[derive(Debug)]
pub struct Writer {
    pub ctx: ExportContext,
}

impl Writer {
    pub fn new(declared: &[AnnotationType]) -> Self {
        Self {
            ctx: ExportContext::new(DialectKind::Raml10, declared),
        }
    }
}

pub struct Raml08;

impl Dialect for Raml08 {
    fn kind(&self) -> DialectKind {
        DialectKind::Raml08
    }

    fn description(&self) -> &str {
        "RAML 0.8 (import only)"
    }

    fn importer(&self) -> Option<&dyn Importer> {
        Some(self)
    }
}

impl Importer for Raml08 {
    fn import(&self, tree: &Tree) -> Result<Imported, ConvertError> {
        import_document(tree, DialectKind::Raml08)
    }
}

pub struct Raml10;

impl Dialect for Raml10 {
    fn kind(&self) -> DialectKind {
        DialectKind::Raml10
    }

    fn description(&self) -> &str {
        "RAML 1.0"
    }

    fn importer(&self) -> Option<&dyn Importer> {
        Some(self)
    }

    fn exporter(&self) -> Option<&dyn Exporter> {
        Some(self)
    }
}

impl Importer for Raml10 {
    fn import(&self, tree: &Tree) -> Result<Imported, ConvertError> {
        import_document(tree, DialectKind::Raml10)
    }
}

impl Exporter for Raml10 {
    fn export(&self, doc: &Document, _options: &ExportOptions) -> Result<Exported, ConvertError> {
        export_document(doc)
    }
}
