//! Dialect trait definition
//!
//! A dialect adapter owns the structural shape of one API description language and version.
//! Adapters are polymorphic over two capabilities, import and export; the historical versions
//! implement only one of them.

use crate::validate;
use apiconv::ir::Document;
use apiconv::{ConvertError, Diagnostic, DialectKind, Exported, Imported, Tree};
use serde::Deserialize;

/// Builds an IR document from a native tree.
pub trait Importer {
    fn import(&self, tree: &Tree) -> Result<Imported, ConvertError>;
}

/// Writes an IR document as a native tree.
pub trait Exporter {
    fn export(&self, doc: &Document, options: &ExportOptions) -> Result<Exported, ConvertError>;
}

/// Knobs shared by every exporter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Media type for bodies that do not name one.
    pub default_media_type: String,
    /// Move unchanged trait items into the OAS `parameters`/`responses` catalogs.
    pub trait_catalog: bool,
    /// Carry resource types and trait applications through OAS as `x-raml-` keys.
    pub preserve_templates: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            default_media_type: "application/json".to_string(),
            trait_catalog: true,
            preserve_templates: true,
        }
    }
}

/// Trait for API description dialects
///
/// # Examples
///
/// ```ignore
/// struct Raml10;
///
/// impl Dialect for Raml10 {
///     fn kind(&self) -> DialectKind {
///         DialectKind::Raml10
///     }
///
///     fn importer(&self) -> Option<&dyn Importer> {
///         Some(self)
///     }
/// }
/// ```
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    /// The registry name (e.g. "raml10", "oas20")
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Optional description of this dialect
    fn description(&self) -> &str {
        ""
    }

    fn importer(&self) -> Option<&dyn Importer> {
        None
    }

    fn exporter(&self) -> Option<&dyn Exporter> {
        None
    }

    fn supports_import(&self) -> bool {
        self.importer().is_some()
    }

    fn supports_export(&self) -> bool {
        self.exporter().is_some()
    }

    /// Import a native tree
    ///
    /// Fails with `NotSupported` for export-only dialects.
    fn import(&self, tree: &Tree) -> Result<Imported, ConvertError> {
        match self.importer() {
            Some(importer) => importer.import(tree),
            None => Err(ConvertError::NotSupported(format!(
                "Dialect '{}' does not support import",
                self.name()
            ))),
        }
    }

    /// Export a document
    ///
    /// Fails with `NotSupported` for import-only dialects.
    fn export(&self, doc: &Document, options: &ExportOptions) -> Result<Exported, ConvertError> {
        match self.exporter() {
            Some(exporter) => exporter.export(doc, options),
            None => Err(ConvertError::NotSupported(format!(
                "Dialect '{}' does not support export",
                self.name()
            ))),
        }
    }

    /// Structural checks on a tree of this dialect. Never fails; problems come back as
    /// error diagnostics.
    fn validate(&self, tree: &Tree) -> Vec<Diagnostic> {
        validate::structural(self.kind(), tree)
    }
}
