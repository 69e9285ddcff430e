//! The conversion pipeline: import, export and optional self-validation
//!
//!     One call owns its document and export context; nothing is shared between calls, so
//!     independent conversions may run on separate threads.

use crate::dialect::{Dialect, ExportOptions};
use crate::registry::DialectRegistry;
use apiconv::{ConvertError, Diagnostic, DialectKind, Imported, Tree};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub from: DialectKind,
    pub to: DialectKind,
    /// Check the output structurally and re-import it through the destination dialect.
    pub validate: bool,
    pub export: ExportOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            from: DialectKind::Oas20,
            to: DialectKind::Raml10,
            validate: false,
            export: ExportOptions::default(),
        }
    }
}

/// The converted tree and every warning raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub tree: Tree,
    pub warnings: Vec<Diagnostic>,
}

pub fn convert(tree: &Tree, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
    convert_with(&DialectRegistry::with_defaults(), tree, options)
}

pub fn convert_with(
    registry: &DialectRegistry,
    tree: &Tree,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let source = registry.get(options.from.name())?;
    let target = registry.get(options.to.name())?;
    if !target.supports_export() {
        return Err(ConvertError::NotSupported(format!(
            "Dialect '{}' does not support export",
            target.name()
        )));
    }

    let imported = source.import(tree)?;
    debug!(from = source.name(), warnings = imported.warnings.len(), "imported");
    let exported = target.export(&imported.document, &options.export)?;
    let mut warnings = imported.warnings;
    warnings.extend(exported.warnings);

    if options.validate {
        let diagnostics = self_validate(target, &exported.tree);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(ConvertError::Validation {
                diagnostics,
                partial: Box::new(exported.tree),
            });
        }
    }
    info!(
        from = source.name(),
        to = target.name(),
        warnings = warnings.len(),
        "conversion finished"
    );
    Ok(Conversion {
        tree: exported.tree,
        warnings,
    })
}

/// Structural checks, then a re-import when the dialect reads what it writes.
fn self_validate(target: &dyn Dialect, tree: &Tree) -> Vec<Diagnostic> {
    let mut diagnostics = target.validate(tree);
    if diagnostics.is_empty() && target.supports_import() {
        if let Err(err) = target.import(tree) {
            diagnostics.push(Diagnostic::error("", err.to_string()));
        }
    }
    diagnostics
}

/// Import only, for inspecting the IR a document produces.
pub fn parse(tree: &Tree, dialect: DialectKind) -> Result<Imported, ConvertError> {
    DialectRegistry::with_defaults().import(tree, dialect.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(from: DialectKind, to: DialectKind) -> ConvertOptions {
        ConvertOptions {
            from,
            to,
            validate: true,
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn oas_3_cannot_be_a_source() {
        let err = convert(
            &json!({"openapi": "3.0.0"}),
            &options(DialectKind::Oas30, DialectKind::Raml10),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::NotSupported(_)));
    }

    #[test]
    fn raml_08_cannot_be_a_destination() {
        let err = convert(
            &json!({"title": "A"}),
            &options(DialectKind::Raml10, DialectKind::Raml08),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::NotSupported(_)));
    }

    #[test]
    fn validated_conversion_succeeds() {
        let tree = json!({
            "swagger": "2.0",
            "info": {"title": "Pets", "version": "1"},
            "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
        });
        let conversion = convert(&tree, &options(DialectKind::Oas20, DialectKind::Raml10)).unwrap();
        assert_eq!(conversion.tree["title"], json!("Pets"));
        assert!(conversion.tree.get("/pets").is_some());
    }

    #[test]
    fn parse_returns_the_document() {
        let imported = parse(&json!({"title": "Pets"}), DialectKind::Raml10).unwrap();
        assert_eq!(imported.document.title, "Pets");
    }
}
